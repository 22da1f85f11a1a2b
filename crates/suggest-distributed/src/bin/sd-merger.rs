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
use suggest_distributed::web::{bind_addr, shutdown_signal};
use suggest_distributed::{load_merger_config, merger_router, MergeOpts, Merger, MergerConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "sd-merger",
    about = "Fan suggest queries out to shard servers and return the freshest answer"
)]
struct Opts {
    /// TOML file with `suggest_shards_urls`
    #[arg(long)]
    config: Option<std::path::PathBuf>,
    /// Shard suggest URL; repeat for every shard (overrides config and env)
    #[arg(long = "shard-url")]
    shard_urls: Vec<String>,
    /// Per-shard request timeout
    #[arg(long)]
    timeout_seconds: Option<u64>,
    /// Merge whatever shards answered instead of failing the request
    #[arg(long)]
    best_effort: bool,
    /// Address to listen on (env: SUGGEST_MERGER_HOST)
    #[arg(long)]
    host: Option<String>,
    /// Port to listen on (env: SUGGEST_MERGER_PORT)
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("info,hyper_util=warn,hyper=warn,h2=warn,reqwest=warn,tower_http=warn")
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let opts = Opts::parse();

    let cfg = load_merger_config(
        MergerConfig::default(),
        MergeOpts {
            config_path: opts.config,
            cli_shard_urls: opts.shard_urls,
            cli_timeout_seconds: opts.timeout_seconds,
            cli_best_effort: opts.best_effort.then_some(true),
        },
    )?;
    let merger = Merger::new(&cfg)?;
    tracing::info!(
        "merging {} shards ({:?}, timeout {:?}): {:?}",
        merger.shards().len(),
        cfg.fanout_policy,
        cfg.shard_timeout,
        cfg.shard_urls
    );

    let app = merger_router(merger);
    let addr = bind_addr(opts.host, opts.port, "SUGGEST_MERGER");
    tracing::info!("Starting suggest merger on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serve")?;
    Ok(())
}
