use crate::catalog::Catalog;
use crate::error::Result;
use crate::record::CatalogEntry;
use chrono::Local;
use serde::Deserialize;
use serde::Serialize;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Metadata written next to the record list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadMeta {
    pub generated_at: String,
    pub data_root: PathBuf,
    /// Def and patch records, parse failures excluded
    pub total: usize,
    /// Distinct source names among records
    pub sources: usize,
    #[serde(default)]
    pub parse_issues: usize,
    #[serde(default)]
    pub documents_scanned: usize,
    #[serde(default)]
    pub duplicate_ids: usize,
}

/// Serialized form of a catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    pub records: Vec<CatalogEntry>,
    pub meta: PayloadMeta,
}

impl Payload {
    pub fn from_catalog(catalog: &Catalog, data_root: &Path) -> Self {
        Self {
            records: catalog.entries(),
            meta: PayloadMeta {
                generated_at: Local::now().format(TIMESTAMP_FORMAT).to_string(),
                data_root: data_root.to_path_buf(),
                total: catalog.records.len(),
                sources: catalog.sources().len(),
                parse_issues: catalog.failures.len(),
                documents_scanned: catalog.stats.documents_scanned,
                duplicate_ids: catalog.stats.duplicate_ids,
            },
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Write the payload to `path`, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Load a payload previously written by [`Payload::save`]
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DefscopeConfig;
    use crate::extract::DocumentInput;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn catalog() -> Catalog {
        let inputs = vec![
            DocumentInput::new(
                PathBuf::from("/data/Core/Things.xml"),
                "Core",
                b"<Defs><ThingDef><defName>Gun</defName><label>gun</label><Mass>2</Mass></ThingDef></Defs>"
                    .to_vec(),
            ),
            DocumentInput::new(PathBuf::from("/data/Mod/Bad.xml"), "Mod", b"<Defs>".to_vec()),
        ];
        Catalog::build(inputs, &DefscopeConfig::default())
    }

    #[test]
    fn meta_counts_records_and_issues() {
        let payload = Payload::from_catalog(&catalog(), Path::new("/data"));
        assert_eq!(payload.meta.total, 1);
        assert_eq!(payload.meta.sources, 1);
        assert_eq!(payload.meta.parse_issues, 1);
        assert_eq!(payload.meta.documents_scanned, 2);
        assert_eq!(payload.meta.generated_at.len(), "2024-01-01 00:00:00".len());
        assert_eq!(payload.records.len(), 2);
    }

    #[test]
    fn json_uses_camel_case_keys() {
        let payload = Payload::from_catalog(&catalog(), Path::new("/data"));
        let value: serde_json::Value =
            serde_json::from_str(&payload.to_json().expect("json")).expect("value");
        let record = &value["records"][0];
        assert_eq!(record["id"], "Core|ThingDef:Gun");
        assert_eq!(record["kind"], "def");
        assert_eq!(record["sourceName"], "Core");
        assert_eq!(record["isAbstract"], false);
        assert_eq!(record["fieldSummaries"][0]["key"], "Mass");
        assert!(value["records"][1]["error"].is_string());
        assert_eq!(value["meta"]["parseIssues"], 1);
    }

    #[test]
    fn save_and_load() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("out").join("defscope.json");
        let payload = Payload::from_catalog(&catalog(), dir.path());
        payload.save(&path).expect("save");

        let loaded = Payload::load(&path).expect("load");
        assert_eq!(loaded, payload);
        assert!(loaded.records[0].clone().into_record().is_some());
        assert!(loaded.records[1].as_failure().is_some());
    }
}
