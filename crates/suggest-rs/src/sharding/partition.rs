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

//! Balanced assignment of prefix groups to shards.
//!
//! Greedy bin packing with an adaptive capacity: groups are visited heaviest
//! first and dropped into the lightest shard as long as that keeps it under
//! the current capacity. When a group does not fit, the capacity is raised by
//! the unplaced weight spread over all shards (or by all of it once that
//! share drops to one line or less) and the same group is retried. The
//! capacity only ever grows, so shards filled earlier are never revisited.

use serde::Serialize;

use crate::index::BuildError;

use super::stats::PrefixStats;

/// Prefix keys per shard index, `shards.len() == n` (empty shards included).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShardAssignment {
    pub shards: Vec<Vec<String>>,
    /// Total weight (line count) placed into each shard.
    pub weights: Vec<u64>,
    /// Capacity in effect when the last group was placed.
    pub capacity: u64,
    /// Every capacity value the run went through, starting with the initial one.
    pub capacity_trace: Vec<u64>,
}

impl ShardAssignment {
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Shard index holding `key`, if any.
    pub fn shard_of(&self, key: &str) -> Option<usize> {
        self.shards
            .iter()
            .position(|keys| keys.iter().any(|k| k == key))
    }
}

/// Index of the lightest shard; lowest index wins ties.
fn lightest(weights: &[u64]) -> usize {
    let mut min_idx = 0;
    for (i, &w) in weights.iter().enumerate() {
        if w < weights[min_idx] {
            min_idx = i;
        }
    }
    min_idx
}

/// Assign every key of `stats` to one of `n` shards, balancing line counts.
pub fn partition(stats: &PrefixStats, n: usize) -> Result<ShardAssignment, BuildError> {
    if n == 0 {
        return Err(BuildError::InvalidArgument(
            "shard count must be at least 1".to_string(),
        ));
    }
    let parts = n as u64;

    // stable: equal weights keep file order
    let mut order: Vec<(&str, u64)> = stats
        .groups()
        .iter()
        .map(|g| (g.key.as_str(), g.count))
        .collect();
    order.sort_by(|a, b| b.1.cmp(&a.1));

    let total: u64 = order.iter().map(|(_, w)| *w).sum();
    let mut capacity = total / parts;
    let mut capacity_trace = vec![capacity];
    let mut weights = vec![0u64; n];
    let mut shards: Vec<Vec<String>> = vec![Vec::new(); n];
    let mut unplaced = total;

    for (key, weight) in order {
        loop {
            let b = lightest(&weights);
            if weights[b] + weight <= capacity {
                weights[b] += weight;
                shards[b].push(key.to_string());
                unplaced -= weight;
                break;
            }
            let share = unplaced / parts;
            capacity += if share <= 1 { unplaced } else { share };
            capacity_trace.push(capacity);
        }
    }

    tracing::info!(
        shards = n,
        prefixes = stats.len(),
        total_weight = total,
        capacity,
        "partitioned prefixes: weights {:?}",
        weights
    );
    Ok(ShardAssignment {
        shards,
        weights,
        capacity,
        capacity_trace,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sharding::PrefixGroup;

    fn stats_of(counts: &[(&str, u64)]) -> PrefixStats {
        let mut off = 0;
        let groups = counts
            .iter()
            .map(|(k, c)| {
                let g = PrefixGroup {
                    key: k.to_string(),
                    count: *c,
                    start_line: off / 2 + 1,
                    start_offset: off,
                    end_offset: off + c * 2 - 1,
                };
                off += c * 2;
                g
            })
            .collect();
        PrefixStats::from_groups(groups)
    }

    #[test]
    fn lightest_prefers_lowest_index() {
        assert_eq!(lightest(&[3, 1, 1]), 1);
        assert_eq!(lightest(&[0, 0]), 0);
    }

    #[test]
    fn zero_shards_is_rejected() {
        let stats = stats_of(&[("a", 1)]);
        assert!(matches!(
            partition(&stats, 0),
            Err(BuildError::InvalidArgument(_))
        ));
    }

    #[test]
    fn exact_balance_example() {
        let stats = stats_of(&[("a", 2), ("b", 1), ("c", 1)]);
        let a = partition(&stats, 2).unwrap();
        assert_eq!(a.shards, vec![vec!["a".to_string()], vec!["b".into(), "c".into()]]);
        assert_eq!(a.weights, vec![2, 2]);
        assert_eq!(a.capacity, 2);
    }

    #[test]
    fn heavy_prefix_raises_capacity() {
        let stats = stats_of(&[("a", 10), ("b", 1), ("c", 1)]);
        let a = partition(&stats, 3).unwrap();
        assert_eq!(a.shard_of("a"), Some(0));
        assert!(a.capacity >= 10);
        assert!(a.capacity_trace.windows(2).all(|w| w[0] <= w[1]));
        assert!(a.weights.iter().all(|w| *w <= a.capacity));
    }

    #[test]
    fn tiny_total_below_shard_count() {
        let stats = stats_of(&[("x", 1)]);
        let a = partition(&stats, 4).unwrap();
        assert_eq!(a.shards.len(), 4);
        assert_eq!(a.shard_of("x"), Some(0));
        assert!(a.shards[1..].iter().all(|s| s.is_empty()));
    }
}
