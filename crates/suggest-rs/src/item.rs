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

//! Item construction: turns one raw corpus line into a sanitized, weighted item.
//!
//! Line format: `<text>` or `<text>\t<weight>`. Markup is stripped from the
//! text, HTML entities are decoded and whitespace is collapsed.

use anyhow::{anyhow, bail, Result};
use once_cell::sync::Lazy;
use regex::Regex;

/// Allows no tags at all; `script`/`style` bodies are dropped with the tag.
static CLEANER: Lazy<ammonia::Builder<'static>> = Lazy::new(|| {
    let mut b = ammonia::Builder::empty();
    b.clean_content_tags(["script", "style"].into_iter().collect());
    b
});
static SPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

const DEFAULT_WEIGHT: f64 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    /// Display text after sanitization.
    pub text: String,
    /// Lower-cased lookup key.
    pub normalized: String,
    pub weight: f64,
}

impl Item {
    pub fn new(text: &str, weight: f64) -> Result<Self> {
        let text = sanitize(text);
        if text.is_empty() {
            bail!("line is empty after sanitization");
        }
        if !weight.is_finite() || weight < 0.0 {
            bail!("weight must be a finite non-negative number, got {}", weight);
        }
        let normalized = normalize(&text);
        Ok(Self {
            text,
            normalized,
            weight,
        })
    }

    /// Parse one raw corpus line.
    pub fn parse(line: &str) -> Result<Self> {
        let line = line.trim();
        match line.rsplit_once('\t') {
            Some((text, weight)) => {
                let weight: f64 = weight
                    .trim()
                    .parse()
                    .map_err(|_| anyhow!("invalid weight field {:?}", weight.trim()))?;
                Item::new(text, weight)
            }
            None => Item::new(line, DEFAULT_WEIGHT),
        }
    }
}

/// Strip all markup, decode entities and collapse whitespace. Entities are
/// decoded once, as an HTML parser would: `&amp;lt;` becomes the text `&lt;`.
pub fn sanitize(raw: &str) -> String {
    let cleaned = CLEANER.clean(raw).to_string();
    // ammonia re-escapes text on output; undo that to get plain text back
    let decoded = htmlescape::decode_html(&cleaned).unwrap_or(cleaned);
    SPACE_RE.replace_all(decoded.trim(), " ").into_owned()
}

/// Lookup normalization shared by index build and query time.
pub fn normalize(text: &str) -> String {
    SPACE_RE
        .replace_all(text.trim(), " ")
        .to_lowercase()
}
