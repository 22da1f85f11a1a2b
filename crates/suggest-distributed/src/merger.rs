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

//! Fan-out merger: forwards a suggest query to every configured shard in
//! parallel and answers with the freshest non-empty shard response.

use anyhow::{Context, Result};
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::routing::get;
use axum::{Json, Router};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use suggest_rs::{PaginatedSuggestResponse, SuggestAnswerItem};
use tokio::task::JoinSet;
use tower_http::trace::TraceLayer;

use crate::config::{FanoutPolicy, MergerConfig};
use crate::web::{forwarded_headers, health_handler, DataEnvelope};

/// Why a single shard call did not produce a usable response.
#[derive(Debug)]
pub enum ShardCallError {
    /// Connect / send / body read failure, including the client timeout.
    Request { url: String, source: reqwest::Error },
    /// The shard answered with a non-2xx status.
    Status { url: String, status: u16 },
    /// The body was not a versioned suggest response.
    Decode {
        url: String,
        source: serde_json::Error,
    },
    /// The task driving the call panicked or was cancelled.
    Join(String),
}

impl fmt::Display for ShardCallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShardCallError::Request { url, source } => {
                write!(f, "request to {} failed: {}", url, source)
            }
            ShardCallError::Status { url, status } => {
                write!(f, "shard {} answered with status {}", url, status)
            }
            ShardCallError::Decode { url, source } => {
                write!(f, "cannot decode response of {}: {}", url, source)
            }
            ShardCallError::Join(e) => write!(f, "shard task failed: {}", e),
        }
    }
}

impl std::error::Error for ShardCallError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ShardCallError::Request { source, .. } => Some(source),
            ShardCallError::Decode { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Process-lifetime counters exposed at `/stats`.
#[derive(Debug, Default)]
pub struct MergerStats {
    requests: AtomicU64,
    failed_requests: AtomicU64,
    shard_failures: AtomicU64,
    empty_answers: AtomicU64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct MergerStatsSnapshot {
    pub requests: u64,
    pub failed_requests: u64,
    pub shard_failures: u64,
    pub empty_answers: u64,
}

impl MergerStats {
    pub fn snapshot(&self) -> MergerStatsSnapshot {
        MergerStatsSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            failed_requests: self.failed_requests.load(Ordering::Relaxed),
            shard_failures: self.shard_failures.load(Ordering::Relaxed),
            empty_answers: self.empty_answers.load(Ordering::Relaxed),
        }
    }
}

/// Shard endpoint as given in config. A bare `http://host:port` or one ending
/// in `/` gets `/suggest` as its path.
pub fn shard_endpoint(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw.trim()).with_context(|| format!("invalid shard url {:?}", raw))?;
    if url.path().is_empty() || url.path() == "/" {
        url.set_path("/suggest");
    }
    Ok(url)
}

/// Query URL for one shard: the endpoint plus `part=<prefix>&with-version=true`.
pub fn shard_query_url(endpoint: &Url, part: &str) -> Url {
    let mut url = endpoint.clone();
    url.query_pairs_mut()
        .append_pair("part", part)
        .append_pair("with-version", "true");
    url
}

/// Among non-empty responses, the one with the highest version wins; ties go
/// to the earliest position. All-empty input yields an empty answer.
pub fn select_freshest(responses: &[PaginatedSuggestResponse]) -> Vec<SuggestAnswerItem> {
    let mut best: Option<&PaginatedSuggestResponse> = None;
    for resp in responses {
        if resp.suggestions.is_empty() {
            continue;
        }
        if best.map_or(true, |b| resp.version > b.version) {
            best = Some(resp);
        }
    }
    best.map(|b| b.suggestions.clone()).unwrap_or_default()
}

async fn query_shard(
    client: Client,
    url: Url,
    headers: HeaderMap,
) -> Result<PaginatedSuggestResponse, ShardCallError> {
    let url_str = url.to_string();
    let response = client
        .get(url)
        .headers(headers)
        .send()
        .await
        .map_err(|source| ShardCallError::Request {
            url: url_str.clone(),
            source,
        })?;

    let status = response.status();
    tracing::debug!("shard {} returned status {}", url_str, status);
    if !status.is_success() {
        return Err(ShardCallError::Status {
            url: url_str,
            status: status.as_u16(),
        });
    }

    let body = response
        .bytes()
        .await
        .map_err(|source| ShardCallError::Request {
            url: url_str.clone(),
            source,
        })?;
    serde_json::from_slice(&body).map_err(|source| ShardCallError::Decode {
        url: url_str,
        source,
    })
}

/// Merger state shared by all request handlers. Cloning is cheap.
#[derive(Clone)]
pub struct Merger {
    shards: Arc<[Url]>,
    client: Client,
    policy: FanoutPolicy,
    stats: Arc<MergerStats>,
}

impl Merger {
    pub fn new(cfg: &MergerConfig) -> Result<Self> {
        let shards = cfg
            .shard_urls
            .iter()
            .map(|u| shard_endpoint(u))
            .collect::<Result<Vec<_>>>()?;
        if shards.is_empty() {
            anyhow::bail!("merger needs at least one shard url");
        }
        let client = Client::builder()
            .timeout(cfg.shard_timeout)
            .build()
            .context("build shard http client")?;
        Ok(Self {
            shards: shards.into(),
            client,
            policy: cfg.fanout_policy,
            stats: Arc::new(MergerStats::default()),
        })
    }

    pub fn shards(&self) -> &[Url] {
        &self.shards
    }

    pub fn policy(&self) -> FanoutPolicy {
        self.policy
    }

    pub fn stats(&self) -> MergerStatsSnapshot {
        self.stats.snapshot()
    }

    /// Answer one prefix query. Failures never surface to the caller: under
    /// the all-or-nothing policy any failed shard call yields an empty answer.
    pub async fn suggest(&self, part: &str, headers: &HeaderMap) -> Vec<SuggestAnswerItem> {
        self.stats.requests.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(part, state = "received", "suggest request");

        let responses = match self.fan_out(part, headers).await {
            Ok(r) => r,
            Err(e) => {
                self.stats.failed_requests.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(part, state = "failed", "suggest fan-out failed: {}", e);
                return Vec::new();
            }
        };

        let answer = select_freshest(&responses);
        if answer.is_empty() {
            self.stats.empty_answers.fetch_add(1, Ordering::Relaxed);
        }
        tracing::debug!(
            part,
            state = "answered",
            shards = responses.len(),
            suggestions = answer.len(),
            "suggest request"
        );
        answer
    }

    /// Query every shard concurrently. Responses come back in configured
    /// shard order regardless of completion order.
    async fn fan_out(
        &self,
        part: &str,
        headers: &HeaderMap,
    ) -> Result<Vec<PaginatedSuggestResponse>, ShardCallError> {
        let forwarded = forwarded_headers(headers);
        let mut tasks = JoinSet::new();
        for (i, endpoint) in self.shards.iter().enumerate() {
            let client = self.client.clone();
            let url = shard_query_url(endpoint, part);
            let headers = forwarded.clone();
            tasks.spawn(async move { (i, query_shard(client, url, headers).await) });
        }
        tracing::debug!(part, state = "dispatched", shards = self.shards.len());

        let mut slots: Vec<Option<PaginatedSuggestResponse>> = vec![None; self.shards.len()];
        while let Some(joined) = tasks.join_next().await {
            let result = match joined {
                Ok((i, Ok(resp))) => {
                    slots[i] = Some(resp);
                    continue;
                }
                Ok((_, Err(e))) => e,
                Err(e) => ShardCallError::Join(e.to_string()),
            };
            self.stats.shard_failures.fetch_add(1, Ordering::Relaxed);
            match self.policy {
                FanoutPolicy::AllOrNothing => {
                    tasks.abort_all();
                    return Err(result);
                }
                FanoutPolicy::BestEffort => {
                    tracing::warn!(part, "skipping failed shard: {}", result);
                }
            }
        }
        Ok(slots.into_iter().flatten().collect())
    }
}

/// First `part` value of a query, empty when absent. Duplicates and unknown
/// keys are ignored so the endpoint always answers with the envelope.
pub fn first_part(pairs: &[(String, String)]) -> &str {
    pairs
        .iter()
        .find(|(k, _)| k == "part")
        .map(|(_, v)| v.as_str())
        .unwrap_or("")
}

async fn suggest_handler(
    State(merger): State<Merger>,
    headers: HeaderMap,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Json<DataEnvelope<Vec<SuggestAnswerItem>>> {
    Json(DataEnvelope::ok(merger.suggest(first_part(&pairs), &headers).await))
}

async fn stats_handler(State(merger): State<Merger>) -> Json<MergerStatsSnapshot> {
    Json(merger.stats())
}

/// Routes: `/suggest`, `/stats`, and the health payload on `/health`, `/`
/// and any unmatched path.
pub fn merger_router(merger: Merger) -> Router {
    Router::new()
        .route("/suggest", get(suggest_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .route("/", get(health_handler))
        .fallback(health_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(merger)
}
