//! Shard artifact module: exposes `ShardWriter` and `ShardReader`.
//!
//! Layout (little-endian):
//! header `MAGIC u32 | FORMAT u32 | build_version u64 | max_items u32`,
//! items `n u32 | (len varint, utf8, weight f64)*`,
//! entries `n u32 | (len varint, utf8, item varint, weight f64)*`,
//! trailer `sha256(all preceding bytes)`.

/// Artifact format constants.
pub const MAGIC: u32 = 0x5355_4747; // 'SUGG'
pub const FORMAT_VERSION: u32 = 1;
pub(crate) const HEADER_LEN: usize = 4 + 4 + 8 + 4;
pub(crate) const CHECKSUM_LEN: usize = 32;

mod writer;
pub use writer::{ShardWriter, StagedShard};

mod reader;
pub use reader::ShardReader;

mod utils;
pub(crate) use utils::{read_f64, read_u32, read_var_u32, write_var_u32};
