//! Read-only index over a finished record set.
//!
//! Precomputes the lower-cased search text of every record and the facet
//! counts that drive the source and category filters.

use crate::record::CatalogEntry;
use crate::record::Record;
use serde::Deserialize;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FacetBucket {
    pub value: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default)]
pub struct RecordIndex {
    records: Vec<Record>,
    haystacks: Vec<String>,
    by_id: HashMap<String, usize>,
    categories: Vec<FacetBucket>,
    sources: Vec<FacetBucket>,
}

impl RecordIndex {
    pub fn new(records: Vec<Record>) -> Self {
        let haystacks = records.iter().map(haystack).collect();
        let mut by_id = HashMap::with_capacity(records.len());
        for (position, record) in records.iter().enumerate() {
            by_id.entry(record.id.clone()).or_insert(position);
        }

        let mut category_counts: HashMap<String, usize> = HashMap::new();
        let mut source_counts: HashMap<String, usize> = HashMap::new();
        for record in &records {
            *category_counts.entry(record.category.clone()).or_default() += 1;
            *source_counts.entry(record.source_name.clone()).or_default() += 1;
        }

        let mut sources: Vec<FacetBucket> = source_counts
            .into_iter()
            .map(|(value, count)| FacetBucket { value, count })
            .collect();
        sources.sort_by(|a, b| alphabetical(&a.value, &b.value));

        Self {
            records,
            haystacks,
            by_id,
            categories: sort_buckets(category_counts),
            sources,
        }
    }

    /// Index the records of a payload collection, skipping parse failures.
    pub fn from_entries(entries: impl IntoIterator<Item = CatalogEntry>) -> Self {
        Self::new(
            entries
                .into_iter()
                .filter_map(CatalogEntry::into_record)
                .collect(),
        )
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Record> {
        self.position(id).and_then(|position| self.records.get(position))
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    /// Lower-cased text searched by queries for the record at `position`.
    pub fn haystack(&self, position: usize) -> &str {
        self.haystacks
            .get(position)
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// Descending count, then ascending name.
    pub fn category_counts(&self) -> &[FacetBucket] {
        &self.categories
    }

    /// Ascending name.
    pub fn source_counts(&self) -> &[FacetBucket] {
        &self.sources
    }
}

fn haystack(record: &Record) -> String {
    let path = record.absolute_path.to_string_lossy();
    [
        record.source_name.as_str(),
        record.category.as_str(),
        record.name.as_str(),
        record.label.as_deref().unwrap_or_default(),
        record.description.as_deref().unwrap_or_default(),
        record.full_text.as_str(),
        path.as_ref(),
        record.raw_markup.as_str(),
    ]
    .join(" ")
    .to_lowercase()
}

/// Alphabetical order ignoring case, code point order between names that
/// differ only in case.
pub(crate) fn alphabetical(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

fn sort_buckets(counts: HashMap<String, usize>) -> Vec<FacetBucket> {
    let mut buckets: Vec<FacetBucket> = counts
        .into_iter()
        .map(|(value, count)| FacetBucket { value, count })
        .collect();
    buckets.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| alphabetical(&a.value, &b.value))
    });
    buckets
}

/// Buckets whose value contains `filter`, ignoring case. An empty filter
/// keeps everything.
pub fn search_facets<'a>(buckets: &'a [FacetBucket], filter: &str) -> Vec<&'a FacetBucket> {
    let needle = filter.trim().to_lowercase();
    buckets
        .iter()
        .filter(|bucket| needle.is_empty() || bucket.value.to_lowercase().contains(&needle))
        .collect()
}
