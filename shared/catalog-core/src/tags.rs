//! Tag statistics over catalog records

use crate::VideoRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A tag and how many times it occurs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCount {
    pub tag: String,
    pub count: u64,
}

/// Count every tag occurrence across `items`.
///
/// A tag listed twice on the same record counts twice.
pub fn count_tags<'a, I>(items: I) -> BTreeMap<String, u64>
where
    I: IntoIterator<Item = &'a VideoRecord>,
{
    let mut counts = BTreeMap::new();
    for tag in items.into_iter().flat_map(|item| item.tags.iter()) {
        *counts.entry(tag.clone()).or_insert(0) += 1;
    }
    counts
}

/// Lexicographically sorted, deduplicated copy of `tags`
pub fn sorted_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut tags: Vec<String> = tags.into_iter().map(Into::into).collect();
    tags.sort();
    tags.dedup();
    tags
}

/// The `limit` most frequent tags, highest count first.
///
/// Ties keep the map's key order, which for a `BTreeMap` is alphabetical.
pub fn top_tags(counts: &BTreeMap<String, u64>, limit: usize) -> Vec<TagCount> {
    let mut ranked: Vec<TagCount> = counts
        .iter()
        .map(|(tag, count)| TagCount {
            tag: tag.clone(),
            count: *count,
        })
        .collect();

    // stable sort keeps the alphabetical order among equal counts
    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    ranked.truncate(limit);
    ranked
}
