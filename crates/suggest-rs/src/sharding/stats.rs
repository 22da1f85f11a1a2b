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

//! Prefix statistics: one streaming pass over a sorted corpus that records,
//! per lower-cased leading character, how many lines it has and which byte
//! span of the file holds them.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::index::BuildError;

use super::PROGRESS_EVERY;

/// All lines sharing one lower-cased leading character.
/// `start_offset..=end_offset` is the inclusive byte span holding them;
/// `start_line` is the 1-based file line at `start_offset`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixGroup {
    pub key: String,
    pub count: u64,
    pub start_line: u64,
    pub start_offset: u64,
    pub end_offset: u64,
}

/// Prefix groups in file order, with lookup by key.
#[derive(Debug, Clone, Default)]
pub struct PrefixStats {
    groups: Vec<PrefixGroup>,
    by_key: HashMap<String, usize>,
    total_lines: u64,
    total_bytes: u64,
}

impl PrefixStats {
    /// Build stats from groups already in file order. Used by the scanner and
    /// by callers that computed spans elsewhere.
    pub fn from_groups(groups: Vec<PrefixGroup>) -> Self {
        let by_key = groups
            .iter()
            .enumerate()
            .map(|(i, g)| (g.key.clone(), i))
            .collect();
        let total_lines = groups.iter().map(|g| g.count).sum();
        Self {
            groups,
            by_key,
            total_lines,
            total_bytes: 0,
        }
    }

    pub fn groups(&self) -> &[PrefixGroup] {
        &self.groups
    }

    pub fn get(&self, key: &str) -> Option<&PrefixGroup> {
        self.by_key.get(key).map(|&i| &self.groups[i])
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Sum of `count` over all groups (non-blank lines).
    pub fn total_lines(&self) -> u64 {
        self.total_lines
    }

    /// Bytes read by the scan (whole file, blank lines included).
    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }
}

/// Lower-cased first character of an already trimmed line.
pub fn prefix_key(trimmed: &str) -> Option<String> {
    trimmed.chars().next().map(|c| c.to_lowercase().collect())
}

struct OpenGroup {
    key: String,
    count: u64,
    line: u64,
    start: u64,
    end: u64,
}

impl OpenGroup {
    fn close(self) -> PrefixGroup {
        PrefixGroup {
            key: self.key,
            count: self.count,
            start_line: self.line,
            start_offset: self.start,
            end_offset: self.end,
        }
    }
}

/// Scan `path` once and group its non-blank lines by leading character.
///
/// The file must already be sorted case-insensitively: a key that shows up
/// again after its group was closed fails with [`BuildError::SortOrder`].
pub fn scan_prefix_stats(path: impl AsRef<Path>) -> Result<PrefixStats, BuildError> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);

    let mut groups: Vec<PrefixGroup> = Vec::new();
    let mut closed: HashSet<String> = HashSet::new();
    let mut current: Option<OpenGroup> = None;

    let mut buf: Vec<u8> = Vec::with_capacity(256);
    let mut cursor: u64 = 0;
    let mut line_no: u64 = 0;
    let mut non_blank: u64 = 0;

    loop {
        buf.clear();
        let n = reader.read_until(b'\n', &mut buf)?;
        if n == 0 {
            break;
        }
        let line_start = cursor;
        cursor += n as u64;
        line_no += 1;

        let line = std::str::from_utf8(&buf).map_err(|e| {
            BuildError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("line {} is not valid UTF-8: {}", line_no, e),
            ))
        })?;
        let Some(key) = prefix_key(line.trim()) else {
            continue;
        };
        // inclusive end of this line, terminator included
        let line_end = cursor - 1;

        let same_group = current.as_ref().is_some_and(|g| g.key == key);
        if same_group {
            if let Some(g) = current.as_mut() {
                g.count += 1;
                g.end = line_end;
            }
        } else {
            if closed.contains(&key) {
                return Err(BuildError::SortOrder { key, line: line_no });
            }
            if let Some(prev) = current.take() {
                closed.insert(prev.key.clone());
                groups.push(prev.close());
            }
            current = Some(OpenGroup {
                key,
                count: 1,
                line: line_no,
                start: line_start,
                end: line_end,
            });
        }

        non_blank += 1;
        if non_blank % PROGRESS_EVERY == 0 {
            tracing::info!("read {} lines", non_blank);
        }
    }
    if let Some(last) = current.take() {
        groups.push(last.close());
    }

    let mut stats = PrefixStats::from_groups(groups);
    stats.total_bytes = cursor;
    tracing::info!(
        path = %path.display(),
        prefixes = stats.len(),
        lines = stats.total_lines(),
        bytes = cursor,
        "scanned prefix statistics"
    );
    Ok(stats)
}
