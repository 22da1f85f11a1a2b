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

//! Small HTTP helpers shared by the merger and shard binaries: response
//! envelopes, the health handler, header forwarding and bind/shutdown plumbing.

use axum::http::{header, HeaderMap};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// `{"status":"ok","data":...}` success envelope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DataEnvelope<T> {
    pub status: String,
    pub data: T,
}

impl<T> DataEnvelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            status: "ok".to_string(),
            data,
        }
    }
}

/// `{"status":"ok","message":...}` envelope used by the health endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageEnvelope {
    pub status: String,
    pub message: String,
}

impl MessageEnvelope {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            status: "ok".to_string(),
            message: message.into(),
        }
    }
}

/// Fixed liveness payload; never touches shards or indexes.
pub async fn health_handler() -> Json<MessageEnvelope> {
    Json(MessageEnvelope::ok("OK"))
}

/// Request headers copied onto outbound shard calls, minus the hop-by-hop
/// and framing headers the HTTP client sets itself.
pub fn forwarded_headers(incoming: &HeaderMap) -> HeaderMap {
    let mut out = incoming.clone();
    for name in [
        header::HOST,
        header::CONTENT_LENGTH,
        header::CONNECTION,
        header::TRANSFER_ENCODING,
    ] {
        out.remove(name);
    }
    out
}

/// Resolve the listen address: CLI value, then `<prefix>_HOST`/`<prefix>_PORT`
/// env vars, then 127.0.0.1:8080.
pub fn bind_addr(host: Option<String>, port: Option<u16>, env_prefix: &str) -> SocketAddr {
    let host = host
        .or_else(|| std::env::var(format!("{}_HOST", env_prefix)).ok())
        .unwrap_or_else(|| "127.0.0.1".into());
    let port = port
        .or_else(|| {
            std::env::var(format!("{}_PORT", env_prefix))
                .ok()
                .and_then(|s| s.parse().ok())
        })
        .unwrap_or(8080);
    format!("{}:{}", host, port)
        .parse()
        .unwrap_or_else(|_| SocketAddr::from(([127, 0, 0, 1], port)))
}

/// Resolves on SIGINT or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!("failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
