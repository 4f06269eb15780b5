//! Read-only commands over a saved payload.

use crate::render::Palette;
use anyhow::Context;
use anyhow::Result;
use clap::Args;
use clap::Parser;
use defscope_core::CatalogEntry;
use defscope_core::FacetView;
use defscope_core::ParseFailure;
use defscope_core::Payload;
use defscope_core::PayloadMeta;
use defscope_core::QueryEngine;
use defscope_core::Record;
use defscope_core::RecordIndex;
use defscope_core::highlight::highlight;
use std::path::Path;
use std::path::PathBuf;
use tracing::debug;

#[derive(Debug, Args)]
pub struct PayloadArg {
    /// Payload written by `defscope build`
    #[arg(short, long, value_name = "FILE", default_value = "defscope.json")]
    pub payload: PathBuf,
}

#[derive(Debug, Parser)]
pub struct SearchArgs {
    #[command(flatten)]
    pub payload: PayloadArg,

    /// Search words; every word must match
    #[arg(value_name = "QUERY")]
    pub query: Vec<String>,

    /// Only show these sources (repeatable)
    #[arg(long, value_name = "NAME")]
    pub source: Vec<String>,

    /// Hide these sources (repeatable)
    #[arg(long, value_name = "NAME")]
    pub exclude_source: Vec<String>,

    /// Only show these types (repeatable)
    #[arg(long = "type", value_name = "NAME")]
    pub category: Vec<String>,

    /// Hide these types (repeatable)
    #[arg(long = "exclude-type", value_name = "NAME")]
    pub exclude_category: Vec<String>,

    /// Show these type groups collapsed (repeatable)
    #[arg(long, value_name = "NAME")]
    pub collapse: Vec<String>,

    /// Show every type group collapsed
    #[arg(long)]
    pub collapse_all: bool,

    /// Maximum number of records listed
    #[arg(short, long)]
    pub limit: Option<usize>,
}

#[derive(Debug, Parser)]
pub struct ShowArgs {
    #[command(flatten)]
    pub payload: PayloadArg,

    /// Record id, as printed by `defscope search`
    #[arg(value_name = "ID")]
    pub id: String,

    /// Highlight these words
    #[arg(short, long, value_name = "QUERY")]
    pub query: Option<String>,
}

#[derive(Debug, Parser)]
pub struct ValuesArgs {
    #[command(flatten)]
    pub payload: PayloadArg,

    /// Tag name to look up
    #[arg(value_name = "TAG")]
    pub tag: String,

    /// List every occurrence with its record instead of distinct values
    #[arg(short, long)]
    pub all: bool,

    /// Print JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Parser)]
pub struct FacetsArgs {
    #[command(flatten)]
    pub payload: PayloadArg,

    /// Only list facet values containing this text
    #[arg(short, long, value_name = "TEXT")]
    pub filter: Option<String>,

    /// Also list every document that failed to parse
    #[arg(long)]
    pub failures: bool,
}

/// A loaded payload ready for querying.
struct Loaded {
    engine: QueryEngine,
    meta: PayloadMeta,
    failures: Vec<ParseFailure>,
}

fn load(path: &Path) -> Result<Loaded> {
    let payload = Payload::load(path)
        .with_context(|| format!("Failed to load payload {}", path.display()))?;
    let failures = payload
        .records
        .iter()
        .filter_map(CatalogEntry::as_failure)
        .cloned()
        .collect();
    let index = RecordIndex::from_entries(payload.records);
    debug!("loaded {} records from {}", index.len(), path.display());
    Ok(Loaded {
        engine: QueryEngine::new(index),
        meta: payload.meta,
        failures,
    })
}

fn print_row(record: &Record, terms: &[String], palette: Palette) {
    let mut line = format!(
        "  {} {}",
        palette.dim(&format!("[{}]", record.source_name)),
        palette.segments(&highlight(&record.name, terms)),
    );
    if record.is_abstract {
        line.push_str(&format!(" {}", palette.dim("(abstract)")));
    }
    if record.is_patch() {
        line.push_str(&format!(" {}", palette.warn("PATCH")));
    }
    if let Some(label) = record.label.as_deref() {
        line.push_str(&format!(" {}", palette.segments(&highlight(label, terms))));
    }
    println!("{line}");
    println!(
        "      {}  {}",
        palette.dim(&record.id),
        palette.dim(&record.relative_path.to_string_lossy())
    );
}

pub fn run_search(args: SearchArgs, palette: Palette) -> Result<()> {
    let mut engine = load(&args.payload.payload)?.engine;
    engine.set_query(args.query.join(" "));

    if !args.source.is_empty() {
        engine.disable_all_sources();
        for source in &args.source {
            engine.set_source_enabled(source, true);
        }
    }
    for source in &args.exclude_source {
        engine.set_source_enabled(source, false);
    }
    if !args.category.is_empty() {
        engine.disable_all_categories();
        for category in &args.category {
            engine.set_category_enabled(category, true);
        }
    }
    for category in &args.exclude_category {
        engine.set_category_enabled(category, false);
    }
    if args.collapse_all {
        engine.collapse_all();
    }
    for category in &args.collapse {
        if engine.is_group_open(category) {
            engine.toggle_group(category);
        }
    }

    let terms = engine.terms();
    let view = engine.view();
    println!("{}", palette.heading(&view.header()));

    let limit = args.limit.unwrap_or(usize::MAX);
    let mut listed = 0;
    'groups: for group in &view.groups {
        let marker = if group.open { "▼" } else { "▶" };
        println!(
            "{marker} {} {}",
            palette.accent(group.category),
            palette.dim(&format!("({})", group.count()))
        );
        if !group.open {
            continue;
        }
        for record in &group.records {
            if listed == limit {
                break 'groups;
            }
            print_row(record, &terms, palette);
            listed += 1;
        }
    }
    if listed == limit && view.total > limit {
        println!(
            "{}",
            palette.dim(&format!("… {} more not shown", view.total - limit))
        );
    }
    Ok(())
}

pub fn run_show(args: ShowArgs, palette: Palette) -> Result<()> {
    let mut engine = load(&args.payload.payload)?.engine;
    if let Some(query) = &args.query {
        engine.set_query(query.as_str());
    }
    let selection = engine
        .select(&args.id)
        .with_context(|| format!("No record with id {}", args.id))?;
    let record = selection.record;
    let shown = &selection.highlighted;

    println!(
        "{} {}",
        palette.heading(&record.qualified_name()),
        palette.dim(&format!("[{}]", record.source_name))
    );
    println!("Id:          {}", record.id);
    println!("Type:        {}", record.category);
    println!("Name:        {}", palette.segments(&shown.name));
    if record.label.is_some() {
        println!("Label:       {}", palette.segments(&shown.label));
    }
    if record.is_abstract {
        println!("Abstract:    yes");
    }
    println!("Parent:      {}", palette.segments(&shown.parent));
    println!("File:        {}", palette.segments(&shown.path));
    if record.description.is_some() {
        println!("Description: {}", palette.segments(&shown.description));
    }

    println!();
    println!("{}", palette.heading("Fields"));
    if shown.fields.is_empty() {
        println!("  No additional top-level fields.");
    }
    for (key, value) in &shown.fields {
        println!("  {} = {}", palette.accent(&palette.segments(key)), palette.segments(value));
    }

    println!();
    println!("{}", palette.heading("Parent chain"));
    if record.is_patch() {
        println!("  Not applicable for patch operations.");
    } else if selection.ancestors.is_empty() {
        println!("  None");
    }
    for link in &selection.ancestors {
        match &link.id {
            Some(id) => println!("  → {}  {}", link.label, palette.dim(id)),
            None => println!("  → {}", palette.warn(&link.label)),
        }
    }

    println!();
    println!("{}", palette.heading("Tags"));
    println!("  {}", selection.tag_names.join(" "));

    println!();
    println!("{}", palette.heading("Markup"));
    println!("{}", palette.markup(&shown.markup));
    Ok(())
}

pub fn run_values(args: ValuesArgs, palette: Palette) -> Result<()> {
    let engine = load(&args.payload.payload)?.engine;

    if args.all {
        let occurrences = engine.occurrences(&args.tag);
        if args.json {
            println!("{}", serde_json::to_string_pretty(&occurrences)?);
            return Ok(());
        }
        println!(
            "{}",
            palette.heading(&format!("{}: {} occurrence(s)", args.tag, occurrences.len()))
        );
        for occurrence in &occurrences {
            println!(
                "  {}  {} {} {}",
                occurrence.value,
                palette.dim(&format!("[{}]", occurrence.source_name)),
                palette.dim(&occurrence.category),
                palette.accent(&occurrence.name)
            );
        }
        return Ok(());
    }

    let values = engine.unique_values(&args.tag);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&values)?);
        return Ok(());
    }
    println!(
        "{}",
        palette.heading(&format!("{}: {} unique value(s)", args.tag, values.len()))
    );
    if values.is_empty() {
        println!("  (none)");
    }
    for value in &values {
        println!("  {value}");
    }
    Ok(())
}

fn print_facets(title: &str, facets: &[FacetView<'_>], palette: Palette) {
    println!("{}", palette.heading(title));
    if facets.is_empty() {
        println!("  (none)");
    }
    for facet in facets {
        println!(
            "  {} {}",
            facet.bucket.value,
            palette.dim(&format!("({})", facet.bucket.count))
        );
    }
}

pub fn run_facets(args: FacetsArgs, palette: Palette) -> Result<()> {
    let Loaded {
        mut engine,
        meta,
        failures,
    } = load(&args.payload.payload)?;
    if let Some(filter) = &args.filter {
        engine.set_source_search(filter.as_str());
        engine.set_category_search(filter.as_str());
    }

    println!(
        "{} records from {} source(s), generated {}",
        meta.total, meta.sources, meta.generated_at
    );
    if meta.parse_issues > 0 {
        println!("{}", palette.warn(&format!("{} parse issues", meta.parse_issues)));
    }
    println!();
    print_facets("Sources", &engine.source_facets(), palette);
    println!();
    print_facets("Types", &engine.category_facets(), palette);

    if args.failures {
        println!();
        println!("{}", palette.heading("Parse issues"));
        if failures.is_empty() {
            println!("  (none)");
        }
        for failure in &failures {
            println!(
                "  {} {}",
                palette.dim(&format!("[{}]", failure.source_name)),
                failure.absolute_path.display()
            );
            println!("      {}", palette.warn(&failure.error));
        }
    }
    Ok(())
}
