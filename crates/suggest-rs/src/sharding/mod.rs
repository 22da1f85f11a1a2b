//! Sharded build: prefix statistics scan, balanced partitioning, span
//! extraction and the per-shard build pipeline.

mod extract;
mod partition;
mod pipeline;
mod stats;

pub use extract::extract_items;
pub use partition::{partition, ShardAssignment};
pub use pipeline::{
    build_shards_from_stats, build_sharded, build_single, shard_output_path, BuildOptions,
    ShardReport, ShardedBuildReport,
};
pub use stats::{prefix_key, scan_prefix_stats, PrefixGroup, PrefixStats};

/// Progress is logged once per this many lines.
pub(crate) const PROGRESS_EVERY: u64 = 100_000;
