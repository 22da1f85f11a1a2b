use anyhow::{bail, Context, Result};
use std::fs;
use std::time::Duration;

/// How the merger treats a shard call that fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FanoutPolicy {
    /// Any failed shard call empties the whole answer.
    #[default]
    AllOrNothing,
    /// Failed shards are skipped; the rest are still merged.
    BestEffort,
}

impl FanoutPolicy {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "all_or_nothing" | "strict" => Some(FanoutPolicy::AllOrNothing),
            "best_effort" => Some(FanoutPolicy::BestEffort),
            _ => None,
        }
    }
}

/// Merger settings. The shard list is fixed for the lifetime of the process.
#[derive(Clone, Debug)]
pub struct MergerConfig {
    pub shard_urls: Vec<String>,
    pub shard_timeout: Duration,
    pub fanout_policy: FanoutPolicy,
}

impl Default for MergerConfig {
    fn default() -> Self {
        Self {
            shard_urls: Vec::new(),
            shard_timeout: Duration::from_secs(10),
            fanout_policy: FanoutPolicy::AllOrNothing,
        }
    }
}

/// CLI-level options that binaries pass to `load_merger_config`.
#[derive(Clone, Debug, Default)]
pub struct MergeOpts {
    pub config_path: Option<std::path::PathBuf>,
    pub cli_shard_urls: Vec<String>,
    pub cli_timeout_seconds: Option<u64>,
    pub cli_best_effort: Option<bool>,
}

fn split_urls(s: &str) -> Vec<String> {
    s.split(',')
        .map(|u| u.trim())
        .filter(|u| !u.is_empty())
        .map(|u| u.to_string())
        .collect()
}

/// Load and merge MergerConfig from: defaults <- config file <- env vars <- CLI.
/// Fails when no shard URL is configured anywhere.
pub fn load_merger_config(mut base: MergerConfig, opts: MergeOpts) -> Result<MergerConfig> {
    if let Some(path) = opts.config_path.as_ref() {
        if !path.exists() {
            bail!("merger config {} not found", path.display());
        }
        let s = fs::read_to_string(path)
            .with_context(|| format!("read merger config {}", path.display()))?;
        let v: toml::Value =
            toml::from_str(&s).with_context(|| format!("parse merger config {}", path.display()))?;
        if let Some(urls) = v.get("suggest_shards_urls").and_then(|x| x.as_array()) {
            base.shard_urls = urls
                .iter()
                .filter_map(|u| u.as_str())
                .map(|u| u.to_string())
                .collect();
        }
        if let Some(t) = v.get("shard_timeout_seconds").and_then(|x| x.as_integer()) {
            base.shard_timeout = Duration::from_secs(t.max(1) as u64);
        }
        if let Some(p) = v.get("fanout_policy").and_then(|x| x.as_str()) {
            base.fanout_policy = FanoutPolicy::parse(p)
                .with_context(|| format!("unknown fanout_policy {:?}", p))?;
        }
    }

    // env vars override file
    if let Ok(urls) = std::env::var("SUGGEST_SHARDS_URLS") {
        let urls = split_urls(&urls);
        if !urls.is_empty() {
            base.shard_urls = urls;
        }
    }
    if let Ok(t) = std::env::var("SUGGEST_SHARD_TIMEOUT_SECONDS") {
        if let Ok(v) = t.parse::<u64>() {
            base.shard_timeout = Duration::from_secs(v.max(1));
        }
    }
    if let Ok(p) = std::env::var("SUGGEST_FANOUT_POLICY") {
        if let Some(policy) = FanoutPolicy::parse(&p) {
            base.fanout_policy = policy;
        }
    }

    // CLI overrides everything
    if !opts.cli_shard_urls.is_empty() {
        base.shard_urls = opts.cli_shard_urls;
    }
    if let Some(t) = opts.cli_timeout_seconds {
        base.shard_timeout = Duration::from_secs(t.max(1));
    }
    if let Some(best_effort) = opts.cli_best_effort {
        base.fanout_policy = if best_effort {
            FanoutPolicy::BestEffort
        } else {
            FanoutPolicy::AllOrNothing
        };
    }

    if base.shard_urls.is_empty() {
        bail!("suggest_shards_urls not found in merger config");
    }
    Ok(base)
}
