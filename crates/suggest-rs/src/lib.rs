//! Prefix suggest engine and the sharded build pipeline.
//! Focus: stream a sorted corpus once, split it into balanced shards, and
//! write one versioned artifact per shard that a shard server can load.

pub mod index;
pub mod item;
pub mod shard;
pub mod sharding;
pub mod types;

pub use crate::index::{BuildError, SuggestIndex, SuggestIndexBuilder};
pub use crate::item::Item;
pub use crate::shard::{ShardReader, ShardWriter};
pub use crate::sharding::{
    build_sharded, build_single, extract_items, partition, scan_prefix_stats,
    shard_output_path, BuildOptions, PrefixGroup, PrefixStats, ShardAssignment,
    ShardedBuildReport,
};
pub use crate::types::{BuildVersion, PaginatedSuggestResponse, SuggestAnswerItem};

/// Convenience helper for callers who want to load an artifact and query it directly.
pub fn load_suggest(path: impl AsRef<std::path::Path>) -> anyhow::Result<SuggestIndex> {
    ShardReader::open(path.as_ref())?.into_index()
}
