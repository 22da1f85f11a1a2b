use anyhow::{bail, Context, Result};
use memmap2::Mmap;
use sha2::{Digest, Sha256};
use std::{fs::File, path::Path};

use crate::index::{IndexedItem, PrefixEntry, SuggestIndex};
use crate::types::BuildVersion;

use super::{read_f64, read_u32, read_var_u32, CHECKSUM_LEN, FORMAT_VERSION, HEADER_LEN, MAGIC};

pub struct ShardReader {
    mmap: Mmap,
    version: BuildVersion,
    max_items_per_prefix: usize,
}

impl ShardReader {
    /// Map the artifact and validate header and checksum. The body is decoded
    /// lazily by [`ShardReader::into_index`].
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file =
            File::open(path).with_context(|| format!("open shard {}", path.display()))?;
        let mmap = unsafe { Mmap::map(&file)? };
        if mmap.len() < HEADER_LEN + CHECKSUM_LEN {
            bail!("file too small ({} bytes)", mmap.len())
        }
        let magic = u32::from_le_bytes(mmap[0..4].try_into().with_context(|| {
            format!(
                "shard truncated or malformed while reading magic (len={})",
                mmap.len()
            )
        })?);
        let ver = u32::from_le_bytes(mmap[4..8].try_into().with_context(|| {
            format!(
                "shard truncated or malformed while reading format version (len={})",
                mmap.len()
            )
        })?);
        if magic != MAGIC {
            bail!("bad header: not a suggest shard")
        }
        if ver != FORMAT_VERSION {
            bail!("unsupported shard format {} (expected {})", ver, FORMAT_VERSION)
        }

        let body_len = mmap.len() - CHECKSUM_LEN;
        let digest = Sha256::digest(&mmap[..body_len]);
        if digest.as_slice() != &mmap[body_len..] {
            bail!("shard checksum mismatch: file is corrupted or truncated")
        }

        let version = u64::from_le_bytes(
            mmap[8..16]
                .try_into()
                .with_context(|| "shard truncated or malformed while reading build version")?,
        );
        let max_items_per_prefix = u32::from_le_bytes(
            mmap[16..20]
                .try_into()
                .with_context(|| "shard truncated or malformed while reading max_items")?,
        ) as usize;

        Ok(Self {
            mmap,
            version,
            max_items_per_prefix,
        })
    }

    pub fn version(&self) -> BuildVersion {
        self.version
    }

    pub fn max_items_per_prefix(&self) -> usize {
        self.max_items_per_prefix
    }

    /// Decode the body into a queryable index.
    pub fn into_index(self) -> Result<SuggestIndex> {
        let body = &self.mmap[..self.mmap.len() - CHECKSUM_LEN];
        let mut off = HEADER_LEN;

        let n_items = read_u32(body, &mut off)? as usize;
        let mut items = Vec::with_capacity(n_items.min(body.len()));
        for i in 0..n_items {
            let text = read_str(body, &mut off)
                .with_context(|| format!("shard corrupted: item {} text", i))?;
            let weight = read_f64(body, &mut off)?;
            items.push(IndexedItem { text, weight });
        }

        let n_entries = read_u32(body, &mut off)? as usize;
        let mut entries = Vec::with_capacity(n_entries.min(body.len()));
        for i in 0..n_entries {
            let key = read_str(body, &mut off)
                .with_context(|| format!("shard corrupted: entry {} key", i))?;
            let item = read_var_u32(body, &mut off)?;
            if item as usize >= items.len() {
                bail!("shard corrupted: entry {} points at missing item {}", i, item)
            }
            let weight = read_f64(body, &mut off)?;
            entries.push(PrefixEntry { key, item, weight });
        }
        if off != body.len() {
            bail!("shard has {} trailing bytes", body.len() - off)
        }

        Ok(SuggestIndex::from_parts(
            self.version,
            self.max_items_per_prefix,
            items,
            entries,
        ))
    }
}

fn read_str(buf: &[u8], off: &mut usize) -> Result<String> {
    let n = read_var_u32(buf, off)? as usize;
    let bytes = buf
        .get(*off..*off + n)
        .with_context(|| format!("truncated string of {} bytes at {}", n, off))?;
    let s = std::str::from_utf8(bytes)
        .with_context(|| format!("string not valid UTF-8 at {}", off))?
        .to_string();
    *off += n;
    Ok(s)
}
