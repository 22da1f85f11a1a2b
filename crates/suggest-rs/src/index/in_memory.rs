use crate::item::normalize;
use crate::types::{BuildVersion, SuggestAnswerItem};
use std::collections::HashMap;

/// Stored suggestion (display text + base weight).
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedItem {
    pub text: String,
    pub weight: f64,
}

/// Lookup entry: a normalized key pointing at an item with the weight it
/// contributes when matched through this key.
#[derive(Debug, Clone, PartialEq)]
pub struct PrefixEntry {
    pub key: String,
    pub item: u32,
    pub weight: f64,
}

/// Queryable, versioned suggest index. Entries are sorted by key so every
/// prefix maps to one contiguous range.
#[derive(Debug, Clone)]
pub struct SuggestIndex {
    version: BuildVersion,
    max_items_per_prefix: usize,
    items: Vec<IndexedItem>,
    entries: Vec<PrefixEntry>,
}

impl SuggestIndex {
    /// crate-local constructor used by the builder and the shard reader
    pub(crate) fn from_parts(
        version: BuildVersion,
        max_items_per_prefix: usize,
        items: Vec<IndexedItem>,
        entries: Vec<PrefixEntry>,
    ) -> Self {
        Self {
            version,
            max_items_per_prefix,
            items,
            entries,
        }
    }

    pub fn version(&self) -> BuildVersion {
        self.version
    }

    pub fn max_items_per_prefix(&self) -> usize {
        self.max_items_per_prefix
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    pub fn items(&self) -> &[IndexedItem] {
        &self.items
    }

    pub fn entries(&self) -> &[PrefixEntry] {
        &self.entries
    }

    /// Suggestions for `prefix`, best first, capped at `max_items_per_prefix`
    /// and then paginated. `count == 0` means "one full page".
    pub fn lookup(&self, prefix: &str, page: usize, count: usize) -> Vec<SuggestAnswerItem> {
        let needle = normalize(prefix);
        if needle.is_empty() {
            return Vec::new();
        }

        let start = self
            .entries
            .partition_point(|e| e.key.as_str() < needle.as_str());
        let mut best: HashMap<u32, f64> = HashMap::new();
        for e in self.entries[start..]
            .iter()
            .take_while(|e| e.key.starts_with(needle.as_str()))
        {
            let w = best.entry(e.item).or_insert(e.weight);
            if e.weight > *w {
                *w = e.weight;
            }
        }

        let mut hits: Vec<(u32, f64)> = best.into_iter().collect();
        hits.sort_by(|a, b| {
            b.1.total_cmp(&a.1)
                .then_with(|| self.items[a.0 as usize].text.cmp(&self.items[b.0 as usize].text))
        });
        hits.truncate(self.max_items_per_prefix);

        let per_page = if count == 0 {
            self.max_items_per_prefix
        } else {
            count.min(self.max_items_per_prefix)
        };
        hits.into_iter()
            .skip(page.saturating_mul(per_page))
            .take(per_page)
            .map(|(idx, weight)| SuggestAnswerItem {
                text: self.items[idx as usize].text.clone(),
                weight,
            })
            .collect()
    }
}
