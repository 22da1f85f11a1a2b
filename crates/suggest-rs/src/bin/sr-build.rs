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

use anyhow::{Context, Result};
use clap::Parser;
use suggest_rs::{build_sharded, build_single, BuildOptions};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "sr-build",
    about = "Build suggest data from a sorted corpus, optionally split into N shards"
)]
struct Args {
    /// Input data file path (one item per line, sorted case-insensitively)
    #[arg(long)]
    input: std::path::PathBuf,
    /// Suggest data file path; shards are written as <stem>_<n>.<ext>
    #[arg(long)]
    suggest: std::path::PathBuf,
    /// Number of suggestions to return per prefix
    #[arg(long, default_value_t = 10)]
    count: usize,
    /// A weight multiplier for the suffix suggest
    #[arg(long, default_value_t = 1e-5)]
    suffix_factor: f64,
    /// Build suggest without suffixes
    #[arg(long)]
    build_without_suffixes: bool,
    /// Build suggest to N result files (0 builds a single file)
    #[arg(long, default_value_t = 0)]
    count_output_files: usize,
    /// Print the build report as JSON on stdout
    #[arg(long)]
    report_json: bool,
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();
    let opts = BuildOptions {
        max_items_per_prefix: args.count,
        suffix_factor: args.suffix_factor,
        disable_suffixes: args.build_without_suffixes,
        version: None,
    };

    if args.count_output_files == 0 {
        let idx = build_single(&args.input, &args.suggest, &opts)
            .with_context(|| format!("build suggest from {}", args.input.display()))?;
        println!(
            "wrote suggest data: {} ({} items, version {})",
            args.suggest.display(),
            idx.item_count(),
            idx.version()
        );
        return Ok(());
    }

    let report = build_sharded(&args.input, &args.suggest, args.count_output_files, &opts)
        .with_context(|| format!("build sharded suggest from {}", args.input.display()))?;
    if args.report_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for shard in &report.shards {
            println!(
                "wrote shard {}: {} ({} items, prefixes {:?})",
                shard.shard,
                shard.path.display(),
                shard.items,
                shard.prefixes
            );
        }
        println!("version {}", report.version);
    }
    Ok(())
}
