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

use serde::{Deserialize, Serialize};

/// Build stamp shared by every shard produced in one build run.
/// Milliseconds since the Unix epoch; larger means fresher.
pub type BuildVersion = u64;

/// Current wall-clock build version.
pub fn current_build_version() -> BuildVersion {
    chrono::Utc::now().timestamp_millis().max(0) as BuildVersion
}

/// One suggestion as returned over HTTP.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SuggestAnswerItem {
    pub text: String,
    pub weight: f64,
}

/// Shard answer when the caller asked for version metadata (`with-version=true`).
/// The merger relies on this shape to pick the freshest non-empty answer.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PaginatedSuggestResponse {
    #[serde(default)]
    pub suggestions: Vec<SuggestAnswerItem>,
    #[serde(default)]
    pub version: BuildVersion,
}
