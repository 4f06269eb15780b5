//! Parent-chain resolution for def records.
//!
//! A parent reference `(category, parentName)` is looked up in the record's
//! own source first, then in the core source, then in every other source in
//! ascending name order. Patch records never take part.

use crate::record::Record;
use crate::record::RecordKind;
use std::collections::BTreeMap;
use std::collections::HashMap;
use std::collections::HashSet;
use tracing::info;

pub const CYCLE_SENTINEL: &str = "(stopped: cycle)";

pub fn depth_sentinel(max_depth: usize) -> String {
    format!("(stopped: depth>{max_depth})")
}

pub fn missing_label(category: &str, parent_name: &str) -> String {
    format!("{category}:{parent_name} (missing)")
}

pub fn ancestor_label(record: &Record) -> String {
    format!("{}:{} [{}]", record.category, record.name, record.source_name)
}

/// How a chain walk ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChainEnd {
    /// The record has no parent reference (or is a patch)
    #[default]
    NoParent,
    /// Reached a parent without a parent reference
    Root,
    Missing,
    Cycle,
    DepthExceeded,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Ancestry {
    pub ids: Vec<String>,
    pub labels: Vec<String>,
    pub end: ChainEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResolveStats {
    pub with_parent: usize,
    pub complete: usize,
    pub missing: usize,
    pub cycles: usize,
    pub depth_exceeded: usize,
}

type NameIndex<'a> = HashMap<&'a str, HashMap<&'a str, usize>>;

/// Immutable `source -> category -> name -> record` lookup over defs.
pub struct Resolver<'a> {
    records: &'a [Record],
    by_source: BTreeMap<&'a str, NameIndex<'a>>,
    core_source: &'a str,
    max_depth: usize,
}

impl<'a> Resolver<'a> {
    pub fn new(records: &'a [Record], core_source: &'a str, max_depth: usize) -> Self {
        let mut by_source: BTreeMap<&'a str, NameIndex<'a>> = BTreeMap::new();
        for (index, record) in records.iter().enumerate() {
            if record.kind != RecordKind::Def {
                continue;
            }
            by_source
                .entry(record.source_name.as_str())
                .or_default()
                .entry(record.category.as_str())
                .or_default()
                .entry(record.name.as_str())
                .or_insert(index);
        }
        Self {
            records,
            by_source,
            core_source,
            max_depth,
        }
    }

    fn lookup_in(&self, source: &str, category: &str, name: &str) -> Option<&'a Record> {
        let index = *self.by_source.get(source)?.get(category)?.get(name)?;
        self.records.get(index)
    }

    /// Resolve one parent step from the context of `source`.
    pub fn lookup(&self, source: &str, category: &str, name: &str) -> Option<&'a Record> {
        if let Some(found) = self.lookup_in(source, category, name) {
            return Some(found);
        }
        if let Some(found) = self.lookup_in(self.core_source, category, name) {
            return Some(found);
        }
        self.by_source
            .keys()
            .filter(|candidate| **candidate != source && **candidate != self.core_source)
            .find_map(|candidate| self.lookup_in(candidate, category, name))
    }

    /// Walk the parent chain of `record`, nearest ancestor first.
    pub fn ancestry(&self, record: &'a Record) -> Ancestry {
        let mut ancestry = Ancestry::default();
        if record.kind != RecordKind::Def {
            return ancestry;
        }
        let Some(mut parent_name) = record.parent_name.as_deref() else {
            return ancestry;
        };

        let mut source = record.source_name.as_str();
        let mut category = record.category.as_str();
        let mut visited: HashSet<(&str, &str, &str)> = HashSet::new();
        loop {
            if !visited.insert((source, category, parent_name)) {
                ancestry.labels.push(CYCLE_SENTINEL.to_string());
                ancestry.end = ChainEnd::Cycle;
                break;
            }
            let Some(parent) = self.lookup(source, category, parent_name) else {
                ancestry.labels.push(missing_label(category, parent_name));
                ancestry.end = ChainEnd::Missing;
                break;
            };
            if ancestry.ids.len() >= self.max_depth {
                ancestry.labels.push(depth_sentinel(self.max_depth));
                ancestry.end = ChainEnd::DepthExceeded;
                break;
            }

            ancestry.ids.push(parent.id.clone());
            ancestry.labels.push(ancestor_label(parent));
            source = parent.source_name.as_str();
            category = parent.category.as_str();
            match parent.parent_name.as_deref() {
                Some(next) => parent_name = next,
                None => {
                    ancestry.end = ChainEnd::Root;
                    break;
                }
            }
        }
        ancestry
    }
}

/// Fill `ancestor_ids`/`ancestor_labels` of every record in one pass.
/// Chains are computed against the unmodified set before any is written.
pub fn resolve_ancestry(records: &mut [Record], core_source: &str, max_depth: usize) -> ResolveStats {
    let chains: Vec<Ancestry> = {
        let resolver = Resolver::new(records, core_source, max_depth);
        records
            .iter()
            .map(|record| resolver.ancestry(record))
            .collect()
    };

    let mut stats = ResolveStats::default();
    for (record, chain) in records.iter_mut().zip(chains) {
        match chain.end {
            ChainEnd::NoParent => {}
            ChainEnd::Root => stats.complete += 1,
            ChainEnd::Missing => stats.missing += 1,
            ChainEnd::Cycle => stats.cycles += 1,
            ChainEnd::DepthExceeded => stats.depth_exceeded += 1,
        }
        if chain.end != ChainEnd::NoParent {
            stats.with_parent += 1;
        }
        record.ancestor_ids = chain.ids;
        record.ancestor_labels = chain.labels;
    }

    info!(
        "resolved {} parent chains ({} complete, {} missing, {} cycles, {} too deep)",
        stats.with_parent, stats.complete, stats.missing, stats.cycles, stats.depth_exceeded
    );
    stats
}
