use serde::Deserialize;
use serde::Serialize;
use std::path::PathBuf;

/// Whether a record came from a definitions document or a patch document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Def,
    Patch,
}

/// One summarized child element of a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSummary {
    pub key: String,
    pub value: String,
}

/// One normalized top-level element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// `source|category:name`, unique across a catalog
    pub id: String,
    pub kind: RecordKind,
    /// Def tag name or patch operation class
    pub category: String,
    pub name: String,
    pub label: Option<String>,
    pub description: Option<String>,
    pub parent_name: Option<String>,
    pub is_abstract: bool,
    pub source_name: String,
    pub absolute_path: PathBuf,
    pub relative_path: PathBuf,
    pub raw_markup: String,
    pub full_text: String,
    pub field_summaries: Vec<FieldSummary>,
    /// Nearest ancestor first
    #[serde(default)]
    pub ancestor_ids: Vec<String>,
    #[serde(default)]
    pub ancestor_labels: Vec<String>,
}

impl Record {
    pub fn make_id(source: &str, category: &str, name: &str) -> String {
        format!("{source}|{category}:{name}")
    }

    /// `category:name`, the string users paste into other tools.
    pub fn qualified_name(&self) -> String {
        format!("{}:{}", self.category, self.name)
    }

    pub fn is_patch(&self) -> bool {
        self.kind == RecordKind::Patch
    }
}

/// Stand-in for a document that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseFailure {
    pub error: String,
    pub absolute_path: PathBuf,
    pub source_name: String,
}

/// Records and parse failures share one output collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CatalogEntry {
    Record(Record),
    ParseFailure(ParseFailure),
}

impl CatalogEntry {
    pub fn into_record(self) -> Option<Record> {
        match self {
            CatalogEntry::Record(record) => Some(record),
            CatalogEntry::ParseFailure(_) => None,
        }
    }

    pub fn as_failure(&self) -> Option<&ParseFailure> {
        match self {
            CatalogEntry::Record(_) => None,
            CatalogEntry::ParseFailure(failure) => Some(failure),
        }
    }
}
