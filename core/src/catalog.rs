use crate::config::DefscopeConfig;
use crate::extract::DocumentInput;
use crate::extract::DocumentOutcome;
use crate::extract::Extractor;
use crate::record::CatalogEntry;
use crate::record::ParseFailure;
use crate::record::Record;
use crate::resolve::ResolveStats;
use crate::resolve::resolve_ancestry;
use crate::summarize::Summarizer;
use std::collections::BTreeSet;
use std::collections::HashSet;
use tracing::info;
use tracing::warn;

/// Statistics about one batch build
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub documents_scanned: usize,
    pub definition_documents: usize,
    pub patch_documents: usize,
    pub unrecognized_documents: usize,
    pub records: usize,
    pub parse_failures: usize,
    pub duplicate_ids: usize,
    pub resolve: ResolveStats,
}

/// The finished record set of one batch: every record resolved, every
/// unparseable document kept as a failure.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub records: Vec<Record>,
    pub failures: Vec<ParseFailure>,
    pub stats: BatchStats,
}

impl Catalog {
    /// Extract every input in order, make ids unique, then resolve ancestry
    /// once over the complete set.
    pub fn build<I>(inputs: I, config: &DefscopeConfig) -> Self
    where
        I: IntoIterator<Item = DocumentInput>,
    {
        let extractor = Extractor::new(Summarizer::new(config.summary));
        let mut stats = BatchStats::default();
        let mut records = Vec::new();
        let mut failures = Vec::new();
        let mut ids = UniqueIds::default();

        for input in inputs {
            stats.documents_scanned += 1;
            let extracted = match extractor.extract(&input) {
                DocumentOutcome::Definitions(found) => {
                    stats.definition_documents += 1;
                    found
                }
                DocumentOutcome::Patches(found) => {
                    stats.patch_documents += 1;
                    found
                }
                DocumentOutcome::Unrecognized => {
                    stats.unrecognized_documents += 1;
                    continue;
                }
                DocumentOutcome::Failed(failure) => {
                    failures.push(failure);
                    continue;
                }
            };
            for mut record in extracted {
                if let Some(unique) = ids.claim(&record.id) {
                    warn!(
                        "duplicate id {} in {}, stored as {unique}",
                        record.id,
                        record.absolute_path.display()
                    );
                    record.id = unique;
                    stats.duplicate_ids += 1;
                }
                records.push(record);
            }
        }

        stats.resolve = resolve_ancestry(&mut records, &config.core_source, config.max_ancestor_depth);
        stats.records = records.len();
        stats.parse_failures = failures.len();

        info!(
            "catalog built: {} documents, {} records, {} parse issues, {} duplicate ids",
            stats.documents_scanned, stats.records, stats.parse_failures, stats.duplicate_ids
        );

        Self {
            records,
            failures,
            stats,
        }
    }

    /// Add documents that failed before extraction, such as unreadable files.
    pub fn record_failures(&mut self, failures: impl IntoIterator<Item = ParseFailure>) {
        for failure in failures {
            warn!(
                "{} counted as a parse issue: {}",
                failure.absolute_path.display(),
                failure.error
            );
            self.failures.push(failure);
            self.stats.documents_scanned += 1;
        }
        self.stats.parse_failures = self.failures.len();
    }

    /// Distinct source names across records, ascending.
    pub fn sources(&self) -> BTreeSet<&str> {
        self.records
            .iter()
            .map(|record| record.source_name.as_str())
            .collect()
    }

    /// Records followed by parse failures, as stored in a payload.
    pub fn entries(&self) -> Vec<CatalogEntry> {
        self.records
            .iter()
            .cloned()
            .map(CatalogEntry::Record)
            .chain(self.failures.iter().cloned().map(CatalogEntry::ParseFailure))
            .collect()
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}

#[derive(Default)]
struct UniqueIds {
    taken: HashSet<String>,
}

impl UniqueIds {
    /// Reserve `id`. Returns the replacement id when it was already taken.
    fn claim(&mut self, id: &str) -> Option<String> {
        if self.taken.insert(id.to_string()) {
            return None;
        }
        let mut suffix = 2usize;
        loop {
            let candidate = format!("{id}~{suffix}");
            if self.taken.insert(candidate.clone()) {
                return Some(candidate);
            }
            suffix += 1;
        }
    }
}
