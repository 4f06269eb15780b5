//! Live filtering, grouping and selection over a [`RecordIndex`].
//!
//! The result view is a pure function of the index and the current
//! [`QueryState`]; every state change just recomputes it.
//!
//! ```text
//! query + enabled sources + enabled categories
//!        │
//!        ▼
//!   match each record ──► group by category ──► sort groups, sort members
//! ```

use crate::highlight::Segment;
use crate::highlight::highlight;
use crate::highlight::tokenize;
use crate::index::FacetBucket;
use crate::index::RecordIndex;
use crate::index::alphabetical;
use crate::index::search_facets;
use crate::markup::MarkedToken;
use crate::markup::highlight_markup;
use crate::markup::tag_names;
use crate::record::Record;
use crate::tag_values::TagOccurrence;
use crate::tag_values::occurrences;
use crate::tag_values::unique_values;
use std::collections::BTreeMap;
use std::collections::BTreeSet;

pub const PATCH_PARENT_PLACEHOLDER: &str = "(n/a for patches)";

/// Filter state driving the result view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryState {
    pub query: String,
    pub enabled_sources: BTreeSet<String>,
    pub enabled_categories: BTreeSet<String>,
    /// Categories absent from the map are open
    pub group_open: BTreeMap<String, bool>,
    pub source_search: String,
    pub category_search: String,
    pub selected: Option<String>,
}

/// One category partition of the result view.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultGroup<'a> {
    pub category: &'a str,
    pub records: Vec<&'a Record>,
    pub open: bool,
}

impl ResultGroup<'_> {
    pub fn count(&self) -> usize {
        self.records.len()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultView<'a> {
    pub groups: Vec<ResultGroup<'a>>,
    pub total: usize,
}

impl ResultView<'_> {
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn header(&self) -> String {
        format!(
            "Results: {} record(s) • {} type group(s)",
            self.total,
            self.group_count()
        )
    }

    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.groups.iter().flat_map(|group| group.records.iter().copied())
    }
}

/// A facet value with its toggle state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacetView<'a> {
    pub bucket: &'a FacetBucket,
    pub enabled: bool,
}

/// One step of a resolved parent chain. `id` is set when the step points at
/// a record that can be selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AncestorLink {
    pub label: String,
    pub id: Option<String>,
}

/// Display fields of the selected record with query terms marked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightedRecord {
    pub name: Vec<Segment>,
    pub label: Vec<Segment>,
    pub description: Vec<Segment>,
    pub parent: Vec<Segment>,
    pub path: Vec<Segment>,
    pub fields: Vec<(Vec<Segment>, Vec<Segment>)>,
    pub markup: Vec<MarkedToken>,
}

/// Everything shown for one selected record.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection<'a> {
    pub record: &'a Record,
    pub parent_display: String,
    pub ancestors: Vec<AncestorLink>,
    pub tag_names: Vec<String>,
    pub highlighted: HighlightedRecord,
}

pub struct QueryEngine {
    index: RecordIndex,
    state: QueryState,
}

impl QueryEngine {
    /// Start with every source and category enabled.
    pub fn new(index: RecordIndex) -> Self {
        let state = QueryState {
            enabled_sources: bucket_values(index.source_counts()),
            enabled_categories: bucket_values(index.category_counts()),
            ..QueryState::default()
        };
        Self { index, state }
    }

    pub fn index(&self) -> &RecordIndex {
        &self.index
    }

    pub fn state(&self) -> &QueryState {
        &self.state
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.state.query = query.into();
    }

    pub fn clear_query(&mut self) {
        self.state.query.clear();
    }

    pub fn terms(&self) -> Vec<String> {
        tokenize(&self.state.query)
    }

    pub fn set_source_enabled(&mut self, source: &str, enabled: bool) {
        set_member(&mut self.state.enabled_sources, source, enabled);
    }

    /// Flip one source filter; returns the new state.
    pub fn toggle_source(&mut self, source: &str) -> bool {
        let enabled = !self.state.enabled_sources.contains(source);
        self.set_source_enabled(source, enabled);
        enabled
    }

    pub fn enable_all_sources(&mut self) {
        self.state.enabled_sources = bucket_values(self.index.source_counts());
    }

    pub fn disable_all_sources(&mut self) {
        self.state.enabled_sources.clear();
    }

    pub fn set_category_enabled(&mut self, category: &str, enabled: bool) {
        set_member(&mut self.state.enabled_categories, category, enabled);
    }

    /// Flip one category filter; returns the new state.
    pub fn toggle_category(&mut self, category: &str) -> bool {
        let enabled = !self.state.enabled_categories.contains(category);
        self.set_category_enabled(category, enabled);
        enabled
    }

    pub fn enable_all_categories(&mut self) {
        self.state.enabled_categories = bucket_values(self.index.category_counts());
    }

    pub fn disable_all_categories(&mut self) {
        self.state.enabled_categories.clear();
    }

    pub fn is_group_open(&self, category: &str) -> bool {
        self.state.group_open.get(category).copied().unwrap_or(true)
    }

    /// Flip one group; returns whether it is now open.
    pub fn toggle_group(&mut self, category: &str) -> bool {
        let open = !self.is_group_open(category);
        self.state.group_open.insert(category.to_string(), open);
        open
    }

    pub fn expand_all(&mut self) {
        self.set_all_groups(true);
    }

    pub fn collapse_all(&mut self) {
        self.set_all_groups(false);
    }

    fn set_all_groups(&mut self, open: bool) {
        for bucket in self.index.category_counts() {
            self.state.group_open.insert(bucket.value.clone(), open);
        }
    }

    pub fn set_source_search(&mut self, filter: impl Into<String>) {
        self.state.source_search = filter.into();
    }

    pub fn set_category_search(&mut self, filter: impl Into<String>) {
        self.state.category_search = filter.into();
    }

    /// Source facets passing the source search, ascending by name.
    pub fn source_facets(&self) -> Vec<FacetView<'_>> {
        search_facets(self.index.source_counts(), &self.state.source_search)
            .into_iter()
            .map(|bucket| FacetView {
                enabled: self.state.enabled_sources.contains(&bucket.value),
                bucket,
            })
            .collect()
    }

    /// Category facets passing the category search, most common first.
    pub fn category_facets(&self) -> Vec<FacetView<'_>> {
        search_facets(self.index.category_counts(), &self.state.category_search)
            .into_iter()
            .map(|bucket| FacetView {
                enabled: self.state.enabled_categories.contains(&bucket.value),
                bucket,
            })
            .collect()
    }

    fn matches(&self, position: usize, record: &Record, terms: &[String]) -> bool {
        if !self.state.enabled_sources.contains(&record.source_name)
            || !self.state.enabled_categories.contains(&record.category)
        {
            return false;
        }
        let haystack = self.index.haystack(position);
        terms.iter().all(|term| haystack.contains(term.as_str()))
    }

    /// Matching records grouped by category.
    pub fn view(&self) -> ResultView<'_> {
        let terms = self.terms();
        let mut groups: BTreeMap<&str, Vec<&Record>> = BTreeMap::new();
        let mut total = 0;
        for (position, record) in self.index.records().iter().enumerate() {
            if self.matches(position, record, &terms) {
                groups.entry(record.category.as_str()).or_default().push(record);
                total += 1;
            }
        }

        let mut groups: Vec<ResultGroup<'_>> = groups
            .into_iter()
            .map(|(category, mut records)| {
                records.sort_by(|a, b| {
                    alphabetical(&a.name, &b.name)
                        .then_with(|| alphabetical(&a.source_name, &b.source_name))
                });
                ResultGroup {
                    category,
                    records,
                    open: self.is_group_open(category),
                }
            })
            .collect();
        groups.sort_by(|a, b| alphabetical(a.category, b.category));
        ResultView { groups, total }
    }

    /// Select a record by id, enabling its source and category filters and
    /// opening its group so a direct link is never hidden.
    pub fn select(&mut self, id: &str) -> Option<Selection<'_>> {
        let (source, category) = {
            let record = self.index.get(id)?;
            (record.source_name.clone(), record.category.clone())
        };
        self.set_source_enabled(&source, true);
        self.set_category_enabled(&category, true);
        self.state.group_open.insert(category, true);
        self.state.selected = Some(id.to_string());
        self.selection()
    }

    /// The current selection, rendered against the current query.
    pub fn selection(&self) -> Option<Selection<'_>> {
        let record = self.index.get(self.state.selected.as_deref()?)?;
        let terms = self.terms();

        let parent_display = if record.is_patch() {
            PATCH_PARENT_PLACEHOLDER.to_string()
        } else {
            record.parent_name.clone().unwrap_or_default()
        };
        let ancestors = record
            .ancestor_labels
            .iter()
            .enumerate()
            .map(|(step, label)| AncestorLink {
                label: label.clone(),
                id: record
                    .ancestor_ids
                    .get(step)
                    .filter(|id| self.index.get(id).is_some())
                    .cloned(),
            })
            .collect();

        let path = record.absolute_path.to_string_lossy();
        let highlighted = HighlightedRecord {
            name: highlight(&record.name, &terms),
            label: highlight(record.label.as_deref().unwrap_or_default(), &terms),
            description: highlight(record.description.as_deref().unwrap_or_default(), &terms),
            parent: if record.is_patch() {
                highlight(&parent_display, &[])
            } else {
                highlight(&parent_display, &terms)
            },
            path: highlight(&path, &terms),
            fields: record
                .field_summaries
                .iter()
                .map(|field| (highlight(&field.key, &terms), highlight(&field.value, &terms)))
                .collect(),
            markup: highlight_markup(&record.raw_markup, &terms),
        };

        Some(Selection {
            record,
            parent_display,
            ancestors,
            tag_names: tag_names(&record.raw_markup),
            highlighted,
        })
    }

    /// Distinct values of `tag` across the whole record set, ignoring filters.
    pub fn unique_values(&self, tag: &str) -> Vec<String> {
        unique_values(self.index.records(), tag)
    }

    /// Every occurrence of `tag` across the whole record set.
    pub fn occurrences(&self, tag: &str) -> Vec<TagOccurrence> {
        occurrences(self.index.records(), tag)
    }
}

fn bucket_values(buckets: &[FacetBucket]) -> BTreeSet<String> {
    buckets.iter().map(|bucket| bucket.value.clone()).collect()
}

fn set_member(set: &mut BTreeSet<String>, value: &str, enabled: bool) {
    if enabled {
        set.insert(value.to_string());
    } else {
        set.remove(value);
    }
}
