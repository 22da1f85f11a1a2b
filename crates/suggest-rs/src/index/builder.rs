use std::collections::HashMap;

use crate::item::Item;
use crate::types::{current_build_version, BuildVersion};

use super::in_memory::{IndexedItem, PrefixEntry, SuggestIndex};

pub struct SuggestIndexBuilder {
    items: Vec<Item>,
    max_items_per_prefix: usize,
    suffix_factor: f64,
    disable_suffixes: bool,
    version: Option<BuildVersion>,
}

impl SuggestIndexBuilder {
    pub fn new(items: Vec<Item>) -> Self {
        Self {
            items,
            max_items_per_prefix: 10,
            suffix_factor: 1e-5,
            disable_suffixes: false,
            version: None,
        }
    }

    pub fn max_items_per_prefix(mut self, n: usize) -> Self {
        self.max_items_per_prefix = n.max(1);
        self
    }

    /// Weight multiplier applied to entries reached through a later word.
    pub fn suffix_factor(mut self, f: f64) -> Self {
        self.suffix_factor = f;
        self
    }

    pub fn disable_suffixes(mut self, disable: bool) -> Self {
        self.disable_suffixes = disable;
        self
    }

    /// Pin the build version; defaults to the current time.
    pub fn version(mut self, v: BuildVersion) -> Self {
        self.version = Some(v);
        self
    }

    pub fn build(self) -> SuggestIndex {
        let version = self.version.unwrap_or_else(current_build_version);

        // Collapse duplicates by normalized text, keeping the heaviest.
        let mut by_key: HashMap<String, u32> = HashMap::new();
        let mut items: Vec<IndexedItem> = Vec::with_capacity(self.items.len());
        let mut keys: Vec<String> = Vec::with_capacity(self.items.len());
        for it in self.items {
            let existing = by_key.get(&it.normalized).copied();
            match existing {
                Some(idx) => {
                    let slot = &mut items[idx as usize];
                    if it.weight > slot.weight {
                        slot.weight = it.weight;
                    }
                }
                None => {
                    by_key.insert(it.normalized.clone(), items.len() as u32);
                    items.push(IndexedItem {
                        text: it.text,
                        weight: it.weight,
                    });
                    keys.push(it.normalized);
                }
            }
        }

        let mut entries: Vec<PrefixEntry> = Vec::with_capacity(items.len());
        for (idx, key) in keys.iter().enumerate() {
            let weight = items[idx].weight;
            entries.push(PrefixEntry {
                key: key.clone(),
                item: idx as u32,
                weight,
            });
            if self.disable_suffixes {
                continue;
            }
            for (pos, _) in key.match_indices(' ') {
                let suffix = &key[pos + 1..];
                if suffix.is_empty() {
                    continue;
                }
                entries.push(PrefixEntry {
                    key: suffix.to_string(),
                    item: idx as u32,
                    weight: weight * self.suffix_factor,
                });
            }
        }
        entries.sort_by(|a, b| a.key.cmp(&b.key).then(a.item.cmp(&b.item)));

        tracing::debug!(
            items = items.len(),
            entries = entries.len(),
            version,
            "built suggest index"
        );
        SuggestIndex::from_parts(version, self.max_items_per_prefix, items, entries)
    }
}
