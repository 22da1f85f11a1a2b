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
use suggest_distributed::{shard_router, ShardState};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sd-shard", about = "Serve one suggest data file over HTTP")]
struct Opts {
    /// Suggest data file to load
    #[arg(long)]
    suggest: std::path::PathBuf,
    /// Address to listen on (env: SUGGEST_SHARD_HOST)
    #[arg(long)]
    host: Option<String>,
    /// Port to listen on (env: SUGGEST_SHARD_PORT)
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("info,hyper_util=warn,hyper=warn,h2=warn,tower_http=warn")
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let opts = Opts::parse();

    let index = suggest_rs::load_suggest(&opts.suggest)
        .with_context(|| format!("load suggest data {}", opts.suggest.display()))?;
    tracing::info!(
        "loaded {} ({} items, version {})",
        opts.suggest.display(),
        index.item_count(),
        index.version()
    );

    let app = shard_router(ShardState::new(index));
    let addr = bind_addr(opts.host, opts.port, "SUGGEST_SHARD");
    tracing::info!("Starting suggest shard server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serve")?;
    Ok(())
}
