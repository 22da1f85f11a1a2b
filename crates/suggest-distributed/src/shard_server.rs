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

//! HTTP front for one loaded suggest artifact.

use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use std::sync::Arc;
use suggest_rs::{PaginatedSuggestResponse, SuggestIndex};
use tower_http::trace::TraceLayer;

use crate::web::{health_handler, DataEnvelope};

#[derive(Clone)]
pub struct ShardState {
    index: Arc<SuggestIndex>,
}

impl ShardState {
    pub fn new(index: SuggestIndex) -> Self {
        Self {
            index: Arc::new(index),
        }
    }

    pub fn index(&self) -> &SuggestIndex {
        &self.index
    }
}

#[derive(Debug, Deserialize)]
pub struct ShardSuggestParams {
    #[serde(default)]
    pub part: String,
    #[serde(rename = "with-version", default)]
    pub with_version: bool,
    #[serde(default)]
    pub page: usize,
    /// 0 means the index's per-prefix cap.
    #[serde(default)]
    pub count: usize,
}

async fn suggest_handler(
    State(state): State<ShardState>,
    Query(params): Query<ShardSuggestParams>,
) -> Response {
    let suggestions = state
        .index
        .lookup(&params.part, params.page, params.count);
    tracing::debug!(
        part = %params.part,
        page = params.page,
        found = suggestions.len(),
        "shard lookup"
    );
    if params.with_version {
        Json(PaginatedSuggestResponse {
            suggestions,
            version: state.index.version(),
        })
        .into_response()
    } else {
        Json(DataEnvelope::ok(suggestions)).into_response()
    }
}

/// Routes: `/suggest`, and the health payload on `/health`, `/` and any
/// unmatched path.
pub fn shard_router(state: ShardState) -> Router {
    Router::new()
        .route("/suggest", get(suggest_handler))
        .route("/health", get(health_handler))
        .route("/", get(health_handler))
        .fallback(health_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
