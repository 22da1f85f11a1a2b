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

//! Serving side of sharded suggest: a per-shard HTTP server and a fan-out
//! merger that returns the freshest non-empty shard answer.

mod config;
pub mod merger;
pub mod shard_server;
pub mod test_utils;
pub mod web;

pub use config::{load_merger_config, FanoutPolicy, MergeOpts, MergerConfig};
pub use merger::{merger_router, Merger, MergerStatsSnapshot, ShardCallError};
pub use shard_server::{shard_router, ShardState};
pub use suggest_rs::{PaginatedSuggestResponse, SuggestAnswerItem};
