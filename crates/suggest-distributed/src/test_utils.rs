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

//! Test utilities shared by unit and integration tests: environment variable
//! management, fake shard servers, and test logging setup.

use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Once;
use suggest_rs::{PaginatedSuggestResponse, SuggestAnswerItem};
use tracing_subscriber::EnvFilter;

/// Test helper to manage environment variables and ensure proper cleanup
pub struct EnvGuard {
    original_values: HashMap<String, Option<String>>,
}

impl EnvGuard {
    pub fn new() -> Self {
        Self {
            original_values: HashMap::new(),
        }
    }

    pub fn save_and_clear(&mut self, vars: &[&str]) {
        for &var in vars {
            let original = std::env::var(var).ok();
            self.original_values.insert(var.to_string(), original);
            std::env::remove_var(var);
        }
    }

    pub fn set(&self, var: &str, value: &str) {
        std::env::set_var(var, value);
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (var, original_value) in &self.original_values {
            match original_value {
                Some(value) => std::env::set_var(var, value),
                None => std::env::remove_var(var),
            }
        }
    }
}

impl Default for EnvGuard {
    fn default() -> Self {
        Self::new()
    }
}

/// Initialize tracing only once for tests so logs are visible when running
/// `cargo test -- --nocapture`. Respects RUST_LOG when set.
pub fn init_test_logging() {
    static TRACING_INIT: Once = Once::new();
    TRACING_INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
    });
}

/// Canned answer for a fake shard.
#[derive(Clone, Debug)]
pub enum FakeShard {
    /// Always answers with these suggestions at this version.
    Answer { version: u64, texts: Vec<String> },
    /// Answers with the given status code and a non-JSON body.
    Status(u16),
    /// Answers 200 with a body that does not decode.
    Garbage,
    /// Sleeps for `delay`, then answers like `Answer`.
    Slow {
        delay: std::time::Duration,
        version: u64,
        texts: Vec<String>,
    },
}

impl FakeShard {
    pub fn answer(version: u64, texts: &[&str]) -> Self {
        FakeShard::Answer {
            version,
            texts: texts.iter().map(|t| t.to_string()).collect(),
        }
    }
}

/// Serve `shard` on an ephemeral local port and return its `/suggest` URL.
pub async fn spawn_fake_shard(shard: FakeShard) -> String {
    let app = Router::new().route(
        "/suggest",
        get(move || {
            let shard = shard.clone();
            async move {
                if let FakeShard::Slow { delay, .. } = &shard {
                    tokio::time::sleep(*delay).await;
                }
                match shard {
                    FakeShard::Answer { version, texts }
                    | FakeShard::Slow { version, texts, .. } => {
                        let suggestions = texts
                            .into_iter()
                            .enumerate()
                            .map(|(i, text)| SuggestAnswerItem {
                                text,
                                weight: 100.0 - i as f64,
                            })
                            .collect();
                        let body = PaginatedSuggestResponse {
                            suggestions,
                            version,
                        };
                        (StatusCode::OK, serde_json::to_string(&body).unwrap_or_default())
                    }
                    FakeShard::Status(code) => (
                        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                        "shard unavailable".to_string(),
                    ),
                    FakeShard::Garbage => (StatusCode::OK, "not json".to_string()),
                }
            }
        }),
    );
    let url = spawn_router(app).await;
    format!("{}/suggest", url)
}

/// Serve any router on an ephemeral local port and return `http://addr`.
pub async fn spawn_router(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{}", addr)
}

/// A URL nothing listens on: bind an ephemeral port, then release it.
pub async fn unreachable_url() -> String {
    let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    format!("http://{}/suggest", addr)
}
