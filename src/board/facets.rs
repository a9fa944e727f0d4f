//! Filter facets derived from the board's item set.
//!
//! Counts are maintained incrementally as items are inserted, removed or
//! moved, so facet lists never require a scan of the full collection.

use std::collections::BTreeMap;

use taskboard_common::{Column, WorkItem};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FacetIndex {
    assignees: BTreeMap<i64, usize>,
    owners: BTreeMap<i64, usize>,
    tags: BTreeMap<String, usize>,
    columns: BTreeMap<Column, usize>,
    blocked: usize,
}

fn bump<K: Ord>(map: &mut BTreeMap<K, usize>, key: K) {
    *map.entry(key).or_insert(0) += 1;
}

fn drop_one<K: Ord>(map: &mut BTreeMap<K, usize>, key: &K) {
    if let Some(count) = map.get_mut(key) {
        *count -= 1;
        if *count == 0 {
            map.remove(key);
        }
    }
}

/// Keys come out in order; zero counts were removed by `drop_one`.
fn sorted<K: Ord + Clone>(map: &BTreeMap<K, usize>) -> Vec<(K, usize)> {
    map.iter().map(|(k, v)| (k.clone(), *v)).collect()
}

impl FacetIndex {
    pub fn from_items(items: &[WorkItem]) -> Self {
        let mut index = Self::default();
        for item in items {
            index.insert(item);
        }
        index
    }

    pub fn insert(&mut self, item: &WorkItem) {
        for user in &item.assignees {
            bump(&mut self.assignees, *user);
        }
        if let Some(owner) = item.owner {
            bump(&mut self.owners, owner);
        }
        for tag in &item.tags {
            bump(&mut self.tags, tag.clone());
        }
        bump(&mut self.columns, item.column);
        if item.blocked {
            self.blocked += 1;
        }
    }

    pub fn remove(&mut self, item: &WorkItem) {
        for user in &item.assignees {
            drop_one(&mut self.assignees, user);
        }
        if let Some(owner) = item.owner {
            drop_one(&mut self.owners, &owner);
        }
        for tag in &item.tags {
            drop_one(&mut self.tags, tag);
        }
        drop_one(&mut self.columns, &item.column);
        if item.blocked {
            self.blocked = self.blocked.saturating_sub(1);
        }
    }

    pub fn replace(&mut self, old: &WorkItem, new: &WorkItem) {
        self.remove(old);
        self.insert(new);
    }

    /// Column change only; other facets are untouched by a move.
    pub fn record_move(&mut self, from: Column, to: Column) {
        if from != to {
            drop_one(&mut self.columns, &from);
            bump(&mut self.columns, to);
        }
    }

    pub fn assignees(&self) -> Vec<(i64, usize)> {
        sorted(&self.assignees)
    }

    pub fn owners(&self) -> Vec<(i64, usize)> {
        sorted(&self.owners)
    }

    pub fn tags(&self) -> Vec<(String, usize)> {
        sorted(&self.tags)
    }

    pub fn column_count(&self, column: Column) -> usize {
        self.columns.get(&column).copied().unwrap_or(0)
    }

    pub fn blocked_count(&self) -> usize {
        self.blocked
    }
}
