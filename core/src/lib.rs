//! # Defscope Core
//!
//! Extraction, inheritance resolution and search over game definition XML.
//!
//! ## Architecture
//!
//! ```text
//! (path, source, bytes)[]
//!     │
//!     ├──> Extractor (per document)
//!     │    ├─> definitions strategy: one record per named def
//!     │    ├─> patch strategy: one record per operation
//!     │    └─> Summarizer over each record's direct children
//!     │
//!     ├──> Resolver (once, over every record)
//!     │    └─> parent chains: same source, then core, then the rest
//!     │
//!     └──> RecordIndex ──> QueryEngine
//!          ├─> filter, group, highlight
//!          └─> tag-value lookup across all records
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use defscope_core::{Catalog, DefscopeConfig, DocumentInput, QueryEngine, RecordIndex};
//! use std::path::PathBuf;
//!
//! let bytes = std::fs::read("Data/Core/Defs/Weapons.xml")?;
//! let input = DocumentInput::new(PathBuf::from("Data/Core/Defs/Weapons.xml"), "Core", bytes);
//!
//! let catalog = Catalog::build(vec![input], &DefscopeConfig::default());
//! let mut engine = QueryEngine::new(RecordIndex::new(catalog.into_records()));
//! engine.set_query("gun");
//! println!("{}", engine.view().header());
//! # Ok::<(), std::io::Error>(())
//! ```

mod catalog;
mod config;
mod error;
pub mod extract;
pub mod highlight;
mod index;
pub mod markup;
mod payload;
mod query;
mod record;
pub mod resolve;
pub mod summarize;
pub mod tag_values;
pub mod xml;

pub use catalog::{BatchStats, Catalog};
pub use config::{DefscopeConfig, SummaryLimits};
pub use error::{DefscopeError, Result, SummaryError, XmlError};
pub use extract::{DocumentInput, DocumentOutcome, Extractor};
pub use highlight::Segment;
pub use index::{FacetBucket, RecordIndex, search_facets};
pub use markup::{MarkedToken, TokenKind};
pub use payload::{Payload, PayloadMeta};
pub use query::{
    AncestorLink, FacetView, HighlightedRecord, PATCH_PARENT_PLACEHOLDER, QueryEngine, QueryState,
    ResultGroup, ResultView, Selection,
};
pub use record::{CatalogEntry, FieldSummary, ParseFailure, Record, RecordKind};
pub use resolve::{Ancestry, ChainEnd, ResolveStats, Resolver};
pub use summarize::Summarizer;
pub use tag_values::TagOccurrence;
