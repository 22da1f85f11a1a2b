use anyhow::{bail, Context, Result};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::index::SuggestIndex;

use super::{write_var_u32, FORMAT_VERSION, MAGIC};

pub struct ShardWriter {
    path: PathBuf,
}

impl ShardWriter {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Encode `idx` into the artifact byte layout (checksum trailer included).
    pub fn encode(idx: &SuggestIndex) -> Result<Vec<u8>> {
        let mut buf: Vec<u8> = Vec::with_capacity(64 + idx.entry_count() * 24);
        buf.extend(&MAGIC.to_le_bytes());
        buf.extend(&FORMAT_VERSION.to_le_bytes());
        buf.extend(&idx.version().to_le_bytes());
        let max_items = u32::try_from(idx.max_items_per_prefix())
            .context("max_items_per_prefix does not fit in u32")?;
        buf.extend(&max_items.to_le_bytes());

        let n_items = u32::try_from(idx.item_count()).context("too many items for one shard")?;
        buf.extend(&n_items.to_le_bytes());
        for it in idx.items() {
            let b = it.text.as_bytes();
            if b.len() > u32::MAX as usize {
                bail!("item text too long")
            }
            write_var_u32(&mut buf, b.len() as u32)?;
            buf.extend(b);
            buf.extend(&it.weight.to_le_bytes());
        }

        let n_entries =
            u32::try_from(idx.entry_count()).context("too many entries for one shard")?;
        buf.extend(&n_entries.to_le_bytes());
        for e in idx.entries() {
            let b = e.key.as_bytes();
            write_var_u32(&mut buf, b.len() as u32)?;
            buf.extend(b);
            write_var_u32(&mut buf, e.item)?;
            buf.extend(&e.weight.to_le_bytes());
        }

        let digest = Sha256::digest(&buf);
        buf.extend(digest.as_slice());
        Ok(buf)
    }

    /// Write the artifact. Bytes go to a sibling temp file first and are
    /// renamed into place so readers never observe a half-written shard.
    pub fn write(&self, idx: &SuggestIndex) -> Result<u64> {
        self.stage(idx)?.commit()
    }

    /// Write the artifact to `<path>.tmp` without publishing it. The temp
    /// file is removed again if the returned handle is dropped uncommitted.
    pub fn stage(&self, idx: &SuggestIndex) -> Result<StagedShard> {
        let start = Instant::now();
        let bytes = Self::encode(idx)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("create output dir {}", parent.display()))?;
            }
        }
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let staged = StagedShard {
            tmp: PathBuf::from(tmp),
            path: self.path.clone(),
            bytes: bytes.len() as u64,
            done: false,
        };
        {
            let mut f = File::create(&staged.tmp)
                .with_context(|| format!("create shard file {}", staged.tmp.display()))?;
            f.write_all(&bytes)?;
            f.sync_all()?;
        }

        tracing::debug!(
            path = %staged.tmp.display(),
            bytes = bytes.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "staged shard artifact"
        );
        Ok(staged)
    }
}

/// A fully written artifact waiting under its temp name.
#[derive(Debug)]
pub struct StagedShard {
    tmp: PathBuf,
    path: PathBuf,
    bytes: u64,
    done: bool,
}

impl StagedShard {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    /// Rename the temp file to its final path; returns the artifact size.
    pub fn commit(mut self) -> Result<u64> {
        fs::rename(&self.tmp, &self.path)
            .with_context(|| format!("move shard into place at {}", self.path.display()))?;
        self.done = true;
        tracing::debug!(path = %self.path.display(), bytes = self.bytes, "wrote shard artifact");
        Ok(self.bytes)
    }
}

impl Drop for StagedShard {
    fn drop(&mut self) {
        if !self.done {
            if let Err(e) = fs::remove_file(&self.tmp) {
                tracing::warn!("failed to remove staged shard {}: {}", self.tmp.display(), e);
            }
        }
    }
}
