use crate::record::ParseFailure;
use crate::record::Record;
use crate::record::RecordKind;
use crate::summarize::Summarizer;
use crate::xml::Document;
use crate::xml::Element;
use std::path::Path;
use std::path::PathBuf;
use tracing::debug;
use tracing::warn;

pub const DEFS_ROOT_TAG: &str = "Defs";
pub const OPERATION_TAG: &str = "Operation";
pub const LIST_ITEM_TAG: &str = "li";
pub const CLASS_ATTRIBUTE: &str = "Class";
pub const XPATH_TAG: &str = "xpath";
pub const DEFAULT_OPERATION_CLASS: &str = "PatchOperation";

pub const NAME_FIELD: &str = "defName";
pub const LABEL_FIELD: &str = "label";
pub const DESCRIPTION_FIELD: &str = "description";
pub const PARENT_FIELD: &str = "parentName";
pub const ABSTRACT_FIELD: &str = "abstract";
const ABSTRACT_ATTRIBUTE: &str = "Abstract";

/// Children that carry a def's identity and are never summarized.
pub const IDENTITY_FIELDS: [&str; 5] = [
    NAME_FIELD,
    LABEL_FIELD,
    DESCRIPTION_FIELD,
    PARENT_FIELD,
    ABSTRACT_FIELD,
];

/// One discovered document, handed over by file discovery.
#[derive(Debug, Clone)]
pub struct DocumentInput {
    pub absolute_path: PathBuf,
    /// Path relative to the source directory
    pub relative_path: PathBuf,
    pub source_name: String,
    pub bytes: Vec<u8>,
}

impl DocumentInput {
    /// Build an input whose relative path is everything after the last path
    /// component named like the source.
    pub fn new(absolute_path: PathBuf, source_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let source_name = source_name.into();
        let relative_path = relative_to_source(&absolute_path, &source_name);
        Self {
            absolute_path,
            relative_path,
            source_name,
            bytes,
        }
    }

    pub fn with_relative_path(mut self, relative_path: PathBuf) -> Self {
        self.relative_path = relative_path;
        self
    }

    fn file_stem(&self) -> String {
        self.absolute_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

fn relative_to_source(path: &Path, source_name: &str) -> PathBuf {
    let components: Vec<_> = path.components().collect();
    let anchor = components
        .iter()
        .rposition(|component| component.as_os_str() == source_name);
    match anchor {
        Some(index) => components[index + 1..].iter().collect(),
        None => path.file_name().map(PathBuf::from).unwrap_or_default(),
    }
}

/// What one document turned into.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentOutcome {
    Definitions(Vec<Record>),
    Patches(Vec<Record>),
    /// Parsed fine but matched neither strategy
    Unrecognized,
    Failed(ParseFailure),
}

impl DocumentOutcome {
    pub fn into_records(self) -> Vec<Record> {
        match self {
            DocumentOutcome::Definitions(records) | DocumentOutcome::Patches(records) => records,
            DocumentOutcome::Unrecognized | DocumentOutcome::Failed(_) => Vec::new(),
        }
    }
}

/// Turns documents into records.
#[derive(Debug, Clone, Copy, Default)]
pub struct Extractor {
    summarizer: Summarizer,
}

impl Extractor {
    pub fn new(summarizer: Summarizer) -> Self {
        Self { summarizer }
    }

    /// Extract one document. The definitions strategy runs first; the patch
    /// strategy only runs when it produced nothing.
    pub fn extract(&self, input: &DocumentInput) -> DocumentOutcome {
        let doc = match Document::parse_bytes(&input.bytes) {
            Ok(doc) => doc,
            Err(err) => {
                warn!("failed to parse {}: {err}", input.absolute_path.display());
                return DocumentOutcome::Failed(ParseFailure {
                    error: err.to_string(),
                    absolute_path: input.absolute_path.clone(),
                    source_name: input.source_name.clone(),
                });
            }
        };

        let defs = self.extract_definitions(&doc, input);
        if !defs.is_empty() {
            debug!(
                "{} defs from {}",
                defs.len(),
                input.absolute_path.display()
            );
            return DocumentOutcome::Definitions(defs);
        }

        let patches = self.extract_patches(&doc, input);
        if !patches.is_empty() {
            debug!(
                "{} patch operations from {}",
                patches.len(),
                input.absolute_path.display()
            );
            return DocumentOutcome::Patches(patches);
        }

        debug!("no records in {}", input.absolute_path.display());
        DocumentOutcome::Unrecognized
    }

    fn extract_definitions(&self, doc: &Document, input: &DocumentInput) -> Vec<Record> {
        let root = doc.root();
        if root.tag() != DEFS_ROOT_TAG {
            return Vec::new();
        }

        root.children()
            .filter_map(|def| {
                // A def without a name has no addressable identity.
                let name = identity_text(def, NAME_FIELD)?;
                let category = def.tag().to_string();
                Some(Record {
                    id: Record::make_id(&input.source_name, &category, &name),
                    kind: RecordKind::Def,
                    category,
                    name,
                    label: identity_text(def, LABEL_FIELD),
                    description: identity_text(def, DESCRIPTION_FIELD),
                    parent_name: identity_text(def, PARENT_FIELD),
                    is_abstract: abstract_flag(def),
                    source_name: input.source_name.clone(),
                    absolute_path: input.absolute_path.clone(),
                    relative_path: input.relative_path.clone(),
                    raw_markup: def.to_pretty_string(),
                    full_text: def.text_content().trim().to_string(),
                    field_summaries: self.summarizer.summarize_fields(&def, &IDENTITY_FIELDS),
                    ancestor_ids: Vec::new(),
                    ancestor_labels: Vec::new(),
                })
            })
            .collect()
    }

    fn extract_patches(&self, doc: &Document, input: &DocumentInput) -> Vec<Record> {
        // A <Patch> root without candidate operations yields nothing, so the
        // root tag needs no check of its own.
        let operations: Vec<Element<'_>> = doc
            .root()
            .descendants()
            .into_iter()
            .filter(|element| is_operation(*element))
            .collect();
        if operations.is_empty() {
            return Vec::new();
        }

        let stem = input.file_stem();
        operations
            .into_iter()
            .enumerate()
            .map(|(index, operation)| {
                let category = operation
                    .attribute(CLASS_ATTRIBUTE)
                    .map(str::trim)
                    .filter(|class| !class.is_empty())
                    .unwrap_or(DEFAULT_OPERATION_CLASS)
                    .to_string();
                let name = format!("{stem}#{:04}", index + 1);
                let label = first_xpath(operation).unwrap_or_else(|| category.clone());
                Record {
                    id: Record::make_id(&input.source_name, &category, &name),
                    kind: RecordKind::Patch,
                    category,
                    name,
                    label: Some(label),
                    description: None,
                    parent_name: None,
                    is_abstract: false,
                    source_name: input.source_name.clone(),
                    absolute_path: input.absolute_path.clone(),
                    relative_path: input.relative_path.clone(),
                    raw_markup: operation.to_pretty_string(),
                    full_text: operation.text_content().trim().to_string(),
                    field_summaries: self.summarizer.summarize_fields(&operation, &[]),
                    ancestor_ids: Vec::new(),
                    ancestor_labels: Vec::new(),
                }
            })
            .collect()
    }
}

/// Explicit operation elements and class-bearing list items. Each element
/// is visited once, so the union needs no further de-duplication.
fn is_operation(element: Element<'_>) -> bool {
    match element.tag() {
        OPERATION_TAG => true,
        LIST_ITEM_TAG => element.attribute(CLASS_ATTRIBUTE).is_some(),
        _ => false,
    }
}

fn identity_text(def: Element<'_>, field: &str) -> Option<String> {
    let text = def.child(field)?.leading_text()?;
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn abstract_flag(def: Element<'_>) -> bool {
    if let Some(text) = def.child(ABSTRACT_FIELD).and_then(|child| child.leading_text()) {
        return is_truthy(&text);
    }
    def.attribute(ABSTRACT_ATTRIBUTE).is_some_and(is_truthy)
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes"
    )
}

fn first_xpath(operation: Element<'_>) -> Option<String> {
    operation
        .descendants()
        .into_iter()
        .filter(|element| element.tag() == XPATH_TAG)
        .filter_map(|element| element.leading_text())
        .map(|text| text.trim().to_string())
        .find(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn input(source: &str, file: &str, markup: &str) -> DocumentInput {
        DocumentInput::new(
            PathBuf::from(format!("/data/{source}/Defs/{file}")),
            source,
            markup.as_bytes().to_vec(),
        )
    }

    fn records(outcome: DocumentOutcome) -> Vec<Record> {
        outcome.into_records()
    }

    #[test]
    fn definitions_become_def_records() {
        let doc = input(
            "Core",
            "Weapons.xml",
            r#"<Defs>
  <ThingDef Abstract="True">
    <defName>Gun_Pistol</defName>
    <label>pistol</label>
    <description> A small gun. </description>
    <parentName>BaseGun</parentName>
    <statBases><Mass>1.2</Mass></statBases>
  </ThingDef>
  <ThingDef><label>nameless</label></ThingDef>
  <ThingDef><defName>Gun_Rifle</defName><abstract>no</abstract></ThingDef>
</Defs>"#,
        );

        let records = records(Extractor::default().extract(&doc));
        assert_eq!(records.len(), 2);

        let pistol = &records[0];
        assert_eq!(pistol.id, "Core|ThingDef:Gun_Pistol");
        assert_eq!(pistol.kind, RecordKind::Def);
        assert_eq!(pistol.label.as_deref(), Some("pistol"));
        assert_eq!(pistol.description.as_deref(), Some("A small gun."));
        assert_eq!(pistol.parent_name.as_deref(), Some("BaseGun"));
        assert!(pistol.is_abstract);
        assert_eq!(pistol.relative_path, PathBuf::from("Defs/Weapons.xml"));
        assert_eq!(pistol.field_summaries.len(), 1);
        assert_eq!(pistol.field_summaries[0].key, "statBases");
        assert_eq!(pistol.field_summaries[0].value, "[Mass: 1.2]");
        assert!(pistol.raw_markup.starts_with("<ThingDef Abstract=\"True\">"));

        let rifle = &records[1];
        assert!(!rifle.is_abstract);
        assert_eq!(rifle.parent_name, None);
        assert!(rifle.field_summaries.is_empty());
    }

    #[test]
    fn abstract_child_takes_precedence_over_attribute() {
        let doc = input(
            "Core",
            "A.xml",
            r#"<Defs><ThingDef Abstract="false"><defName>X</defName><abstract>Yes</abstract></ThingDef></Defs>"#,
        );
        let records = records(Extractor::default().extract(&doc));
        assert!(records[0].is_abstract);
    }

    #[test]
    fn patch_operations_are_numbered_in_document_order() {
        let doc = input(
            "Royalty",
            "Patches_Guns.xml",
            r#"<Patch>
  <Operation Class="PatchOperationSequence">
    <operations>
      <li Class="PatchOperationReplace">
        <xpath>Defs/ThingDef[defName="Gun_Pistol"]/label</xpath>
        <value><label>royal pistol</label></value>
      </li>
      <li Class=" ">
        <value/>
      </li>
    </operations>
  </Operation>
</Patch>"#,
        );

        let outcome = Extractor::default().extract(&doc);
        assert!(matches!(outcome, DocumentOutcome::Patches(_)));
        let records = records(outcome);
        let names: Vec<(&str, &str)> = records
            .iter()
            .map(|r| (r.category.as_str(), r.name.as_str()))
            .collect();
        assert_eq!(
            names,
            vec![
                ("PatchOperationSequence", "Patches_Guns#0001"),
                ("PatchOperationReplace", "Patches_Guns#0002"),
                ("PatchOperation", "Patches_Guns#0003"),
            ]
        );
        assert_eq!(
            records[0].label.as_deref(),
            Some("Defs/ThingDef[defName=\"Gun_Pistol\"]/label")
        );
        assert_eq!(records[2].label.as_deref(), Some("PatchOperation"));
        assert!(records.iter().all(|r| r.kind == RecordKind::Patch));
        assert!(records.iter().all(|r| r.parent_name.is_none() && !r.is_abstract));
        assert_eq!(records[1].id, "Royalty|PatchOperationReplace:Patches_Guns#0002");
        let keys: Vec<&str> = records[1]
            .field_summaries
            .iter()
            .map(|f| f.key.as_str())
            .collect();
        assert_eq!(keys, vec!["value", "xpath"]);
    }

    #[test]
    fn identical_operations_stay_distinct() {
        let doc = input(
            "Core",
            "Dup.xml",
            r#"<Patch><Operation Class="A"><xpath>x</xpath></Operation><Operation Class="A"><xpath>x</xpath></Operation></Patch>"#,
        );
        let records = records(Extractor::default().extract(&doc));
        assert_eq!(records.len(), 2);
        assert_ne!(records[0].id, records[1].id);
    }

    #[test]
    fn defs_without_names_fall_through_to_patch_strategy() {
        let doc = input(
            "Core",
            "Bases.xml",
            r#"<Defs><ThingDef Name="BaseGun" Abstract="True"><comps><li Class="CompProperties_Art"/></comps></ThingDef></Defs>"#,
        );
        let outcome = Extractor::default().extract(&doc);
        let records = records(outcome);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].category, "CompProperties_Art");
        assert_eq!(records[0].kind, RecordKind::Patch);
    }

    #[test]
    fn malformed_and_unrelated_documents() {
        let broken = input("Core", "Broken.xml", "<Defs><ThingDef></Defs>");
        match Extractor::default().extract(&broken) {
            DocumentOutcome::Failed(failure) => {
                assert_eq!(failure.source_name, "Core");
                assert_eq!(failure.absolute_path, broken.absolute_path);
                assert!(!failure.error.is_empty());
            }
            other => panic!("expected failure, got {other:?}"),
        }

        let other = input("Core", "Lang.xml", "<LanguageData><key>v</key></LanguageData>");
        assert_eq!(
            Extractor::default().extract(&other),
            DocumentOutcome::Unrecognized
        );

        let empty_patch = input("Core", "Empty.xml", "<Patch/>");
        assert_eq!(
            Extractor::default().extract(&empty_patch),
            DocumentOutcome::Unrecognized
        );
    }

    #[test]
    fn relative_path_falls_back_to_file_name() {
        let input = DocumentInput::new(PathBuf::from("/x/y/File.xml"), "Core", Vec::new());
        assert_eq!(input.relative_path, PathBuf::from("File.xml"));
    }
}
