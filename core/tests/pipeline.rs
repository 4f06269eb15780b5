use defscope_core::summarize::Summarizer;
use defscope_core::xml::Document;
use defscope_core::{
    Catalog, ChainEnd, DefscopeConfig, DocumentInput, Payload, QueryEngine, RecordIndex,
    RecordKind, Resolver,
};
use pretty_assertions::assert_eq;
use std::collections::HashSet;
use std::path::Path;
use std::path::PathBuf;

const CORE_WEAPONS: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<Defs>
  <ThingDef Abstract="True">
    <defName>BaseGun</defName>
    <thingClass>ThingWithComps</thingClass>
    <statBases>
      <Mass>2</Mass>
      <MarketValue>150</MarketValue>
    </statBases>
  </ThingDef>
  <ThingDef>
    <defName>Gun_Pistol</defName>
    <label>pistol</label>
    <description>A simple pistol.
Reliable at short range.</description>
    <parentName>BaseGun</parentName>
    <weaponTags>
      <li>SimpleGun</li>
      <li>Pistol</li>
    </weaponTags>
    <comps>
      <li Class="CompProperties_Forbiddable" />
      <li>
        <compClass>CompQuality</compClass>
      </li>
    </comps>
    <verbs>
      <li>
        <verbClass>Verb_Shoot</verbClass>
        <range>25.9</range>
      </li>
    </verbs>
  </ThingDef>
</Defs>
"#;

const ROYALTY_WEAPONS: &str = r#"<Defs>
  <ThingDef>
    <defName>Gun_Revolver</defName>
    <label>revolver</label>
    <parentName>BaseGun</parentName>
    <statBases><Mass>1.4</Mass></statBases>
  </ThingDef>
  <ThingDef>
    <defName>Gun_Ceremonial</defName>
    <parentName>BaseRoyalGun</parentName>
  </ThingDef>
</Defs>
"#;

const ROYALTY_PATCH: &str = r#"<Patch>
  <Operation Class="PatchOperationAdd">
    <xpath>Defs/ThingDef[defName="Gun_Pistol"]/weaponTags</xpath>
    <value>
      <li>RoyalGun</li>
    </value>
  </Operation>
</Patch>
"#;

fn input(root: &Path, source: &str, file: &str, body: &str) -> DocumentInput {
    DocumentInput::new(
        root.join(source).join("Defs").join(file),
        source,
        body.as_bytes().to_vec(),
    )
}

fn catalog() -> Catalog {
    let root = PathBuf::from("/data");
    Catalog::build(
        vec![
            input(&root, "Core", "Weapons.xml", CORE_WEAPONS),
            input(&root, "Royalty", "Weapons.xml", ROYALTY_WEAPONS),
            input(&root, "Royalty", "Patches.xml", ROYALTY_PATCH),
            input(&root, "Royalty", "Broken.xml", "<Defs><ThingDef></Defs>"),
        ],
        &DefscopeConfig::default(),
    )
}

#[test]
fn ids_are_unique_across_the_catalog() {
    let catalog = catalog();
    let ids: HashSet<&str> = catalog.records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids.len(), catalog.records.len());
    assert_eq!(catalog.records.len(), 5);
    assert_eq!(catalog.failures.len(), 1);
}

#[test]
fn chains_resolve_across_sources() {
    let catalog = catalog();
    let by_id = |id: &str| {
        catalog
            .records
            .iter()
            .find(|r| r.id == id)
            .unwrap_or_else(|| panic!("missing {id}"))
    };

    let revolver = by_id("Royalty|ThingDef:Gun_Revolver");
    assert_eq!(revolver.ancestor_ids, vec!["Core|ThingDef:BaseGun"]);
    assert_eq!(revolver.ancestor_labels, vec!["ThingDef:BaseGun [Core]"]);

    let ceremonial = by_id("Royalty|ThingDef:Gun_Ceremonial");
    assert!(ceremonial.ancestor_ids.is_empty());
    assert_eq!(ceremonial.ancestor_labels, vec!["ThingDef:BaseRoyalGun (missing)"]);

    let patch = catalog
        .records
        .iter()
        .find(|r| r.kind == RecordKind::Patch)
        .expect("patch record");
    assert_eq!(patch.name, "Patches#0001");
    assert!(patch.ancestor_labels.is_empty());
}

#[test]
fn resolver_is_deterministic_over_input_order() {
    let forward = catalog();
    let mut reversed_records = forward.records.clone();
    reversed_records.reverse();
    let resolver = Resolver::new(&reversed_records, "Core", 100);
    for record in &reversed_records {
        let ancestry = resolver.ancestry(record);
        assert_eq!(ancestry.ids, record.ancestor_ids, "{}", record.id);
        assert_eq!(ancestry.labels, record.ancestor_labels, "{}", record.id);
    }
    let pistol = reversed_records
        .iter()
        .find(|r| r.name == "Gun_Pistol")
        .expect("pistol");
    assert_eq!(resolver.ancestry(pistol).end, ChainEnd::Root);
}

#[test]
fn field_summaries_survive_markup_round_trip() {
    let catalog = catalog();
    let summarizer = Summarizer::default();
    for record in &catalog.records {
        let doc = Document::parse(&record.raw_markup).expect("raw markup parses");
        let excluded: &[&str] = if record.kind == RecordKind::Def {
            &defscope_core::extract::IDENTITY_FIELDS
        } else {
            &[]
        };
        let again = summarizer.summarize_fields(&doc.root(), excluded);
        assert_eq!(again, record.field_summaries, "{}", record.id);
    }

    let pistol = catalog
        .records
        .iter()
        .find(|r| r.name == "Gun_Pistol")
        .expect("pistol");
    let fields: Vec<(&str, &str)> = pistol
        .field_summaries
        .iter()
        .map(|f| (f.key.as_str(), f.value.as_str()))
        .collect();
    assert_eq!(
        fields,
        vec![
            ("comps", "[(empty), CompQuality]"),
            ("verbs", "[Verb_Shoot 25.9]"),
            ("weaponTags", "[SimpleGun, Pistol]"),
        ]
    );
    assert_eq!(
        pistol.description.as_deref(),
        Some("A simple pistol.\nReliable at short range.")
    );
}

#[test]
fn search_and_tag_values_over_built_catalog() {
    let mut engine = QueryEngine::new(RecordIndex::new(catalog().into_records()));
    engine.set_query("gun royalty");
    let view = engine.view();
    let names: Vec<&str> = view.records().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Patches#0001", "Gun_Ceremonial", "Gun_Revolver"]);

    assert_eq!(engine.unique_values("Mass"), vec!["1.4", "2"]);
    let owners: Vec<String> = engine
        .occurrences("li")
        .into_iter()
        .map(|o| format!("{}={}", o.name, o.value))
        .collect();
    assert_eq!(
        owners,
        vec![
            "Gun_Pistol=CompQuality",
            "Gun_Pistol=Pistol",
            "Patches#0001=RoyalGun",
            "Gun_Pistol=SimpleGun",
            "Gun_Pistol=Verb_Shoot 25.9",
        ]
    );
}

#[test]
fn payload_round_trips_through_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    let catalog = catalog();
    let payload = Payload::from_catalog(&catalog, Path::new("/data"));
    let path = dir.path().join("defscope.json");
    payload.save(&path).expect("save");

    let loaded = Payload::load(&path).expect("load");
    assert_eq!(loaded.meta.total, 5);
    assert_eq!(loaded.meta.sources, 2);
    assert_eq!(loaded.meta.parse_issues, 1);
    let index = RecordIndex::from_entries(loaded.records);
    assert_eq!(index.len(), 5);
}
