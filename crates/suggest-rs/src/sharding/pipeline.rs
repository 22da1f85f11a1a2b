// Copyright 2025 HyperZoekt Project
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use rayon::prelude::*;
use serde::Serialize;
use std::ffi::OsString;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::index::{BuildError, SuggestIndex, SuggestIndexBuilder};
use crate::item::Item;
use crate::shard::{ShardWriter, StagedShard};
use crate::types::{current_build_version, BuildVersion};

use super::extract::extract_items;
use super::partition::{partition, ShardAssignment};
use super::stats::{scan_prefix_stats, PrefixGroup, PrefixStats};
use super::PROGRESS_EVERY;

/// Knobs handed to the index builder for every shard of a run.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub max_items_per_prefix: usize,
    pub suffix_factor: f64,
    pub disable_suffixes: bool,
    /// Pin the build version (tests); defaults to the build start time.
    pub version: Option<BuildVersion>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            max_items_per_prefix: 10,
            suffix_factor: 1e-5,
            disable_suffixes: false,
            version: None,
        }
    }
}

impl BuildOptions {
    fn index_builder(&self, items: Vec<Item>, version: BuildVersion) -> SuggestIndexBuilder {
        SuggestIndexBuilder::new(items)
            .max_items_per_prefix(self.max_items_per_prefix)
            .suffix_factor(self.suffix_factor)
            .disable_suffixes(self.disable_suffixes)
            .version(version)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ShardReport {
    pub shard: usize,
    pub path: PathBuf,
    pub prefixes: Vec<String>,
    pub items: usize,
    pub bytes: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShardedBuildReport {
    pub version: BuildVersion,
    pub assignment: ShardAssignment,
    pub shards: Vec<ShardReport>,
    pub elapsed_ms: u64,
}

/// Output path for shard `shard`: `_<shard>` goes right before the file
/// name's extension (`data.bin` -> `data_3.bin`), or at the end when the
/// name has none. Directory components are left untouched.
pub fn shard_output_path(template: impl AsRef<Path>, shard: usize) -> PathBuf {
    let template = template.as_ref();
    let mut name: OsString = template
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_default();
    name.push(format!("_{}", shard));
    if let Some(ext) = template.extension() {
        name.push(".");
        name.push(ext);
    }
    template.with_file_name(name)
}

/// Scan `input`, split it into `shards` balanced shards, and write one
/// artifact per shard next to `template`. All shards share one build version.
pub fn build_sharded(
    input: impl AsRef<Path>,
    template: impl AsRef<Path>,
    shards: usize,
    opts: &BuildOptions,
) -> Result<ShardedBuildReport, BuildError> {
    let input = input.as_ref();
    let stats = scan_prefix_stats(input)?;
    build_shards_from_stats(input, &stats, template, shards, opts)
}

/// Same as [`build_sharded`] with statistics computed by the caller.
pub fn build_shards_from_stats(
    input: impl AsRef<Path>,
    stats: &PrefixStats,
    template: impl AsRef<Path>,
    shards: usize,
    opts: &BuildOptions,
) -> Result<ShardedBuildReport, BuildError> {
    let started = Instant::now();
    let input = input.as_ref();
    let template = template.as_ref();
    let assignment = partition(stats, shards)?;
    let version = opts.version.unwrap_or_else(current_build_version);

    // Shards share nothing but the read-only input, so build them in parallel.
    // Artifacts stay staged until every shard has succeeded; on error the
    // staged files are dropped and nothing of this run is published.
    let staged: Vec<(ShardReport, StagedShard)> = assignment
        .shards
        .par_iter()
        .enumerate()
        .map(|(shard, prefixes)| {
            build_one_shard(input, stats, template, shard, prefixes, version, opts)
        })
        .collect::<Result<Vec<_>, BuildError>>()?;
    let reports = publish(staged)?;

    let elapsed_ms = started.elapsed().as_millis() as u64;
    tracing::info!(
        shards = reports.len(),
        version,
        elapsed_ms,
        "sharded suggest build finished"
    );
    Ok(ShardedBuildReport {
        version,
        assignment,
        shards: reports,
        elapsed_ms,
    })
}

fn build_one_shard(
    input: &Path,
    stats: &PrefixStats,
    template: &Path,
    shard: usize,
    prefixes: &[String],
    version: BuildVersion,
    opts: &BuildOptions,
) -> Result<(ShardReport, StagedShard), BuildError> {
    let groups: Vec<&PrefixGroup> = prefixes
        .iter()
        .map(|k| {
            stats.get(k).ok_or_else(|| {
                BuildError::InvalidArgument(format!("prefix {:?} missing from statistics", k))
            })
        })
        .collect::<Result<_, _>>()?;

    let items = extract_items(input, &groups, Item::parse)?;
    let item_count = items.len();
    let idx = opts.index_builder(items, version).build();

    let path = shard_output_path(template, shard);
    let staged = ShardWriter::new(&path)
        .stage(&idx)
        .map_err(|e| BuildError::Serialization(format!("{:#}", e)))?;

    let report = ShardReport {
        shard,
        path,
        prefixes: prefixes.to_vec(),
        items: item_count,
        bytes: staged.bytes(),
    };
    Ok((report, staged))
}

/// Move every staged shard into place. If a rename fails, shards already
/// published by this call are removed again.
fn publish(staged: Vec<(ShardReport, StagedShard)>) -> Result<Vec<ShardReport>, BuildError> {
    let mut published: Vec<ShardReport> = Vec::with_capacity(staged.len());
    for (report, shard) in staged {
        if let Err(e) = shard.commit() {
            for done in &published {
                if let Err(rm) = std::fs::remove_file(&done.path) {
                    tracing::warn!("failed to remove {}: {}", done.path.display(), rm);
                }
            }
            return Err(BuildError::Serialization(format!("{:#}", e)));
        }
        tracing::info!(
            "writing the resulting suggest data to {} with prefixes {:?}, items count {}",
            report.path.display(),
            report.prefixes,
            report.items
        );
        published.push(report);
    }
    Ok(published)
}

/// Non-sharded build: every line of `input` goes into one artifact at `output`.
pub fn build_single(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    opts: &BuildOptions,
) -> Result<SuggestIndex, BuildError> {
    let input = input.as_ref();
    let output = output.as_ref();
    let reader = BufReader::new(File::open(input)?);

    let mut items: Vec<Item> = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let item = Item::parse(line).map_err(|e| BuildError::Parse {
            line: i as u64 + 1,
            line_in_span: i as u64 + 1,
            key: super::stats::prefix_key(line).unwrap_or_default(),
            reason: e.to_string(),
        })?;
        items.push(item);
        if items.len() as u64 % PROGRESS_EVERY == 0 {
            tracing::info!("read {} lines", items.len());
        }
    }

    let version = opts.version.unwrap_or_else(current_build_version);
    let idx = opts.index_builder(items, version).build();
    ShardWriter::new(output)
        .write(&idx)
        .map_err(|e| BuildError::Serialization(format!("{:#}", e)))?;
    tracing::info!(
        path = %output.display(),
        items = idx.item_count(),
        version,
        "wrote suggest data"
    );
    Ok(idx)
}
