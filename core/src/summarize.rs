//! Short, human-readable summaries of record fields.
//!
//! A field is one direct child element of a record. Its summary is picked by
//! the first matching shape:
//!
//! ```text
//! no children ──> leaf text (or "(empty)"), truncated
//! all <li>    ──> [item, item, ..., +k more]
//! all leaves  ──> [tag: text, ..., +k more]
//! otherwise   ──> [distinct child tags, ..., +k more]
//! ```

use crate::config::SummaryLimits;
use crate::error::SummaryError;
use crate::record::FieldSummary;
use crate::xml::Element;
use tracing::debug;

pub const EMPTY_PLACEHOLDER: &str = "(empty)";
pub const UNREADABLE_PLACEHOLDER: &str = "(unreadable)";
const LIST_ITEM_TAG: &str = "li";
const ELLIPSIS: char = '…';

/// What the summarizer needs to know about a node.
pub trait FieldNode: Sized {
    fn tag(&self) -> &str;

    /// Direct element children, in document order.
    fn children(&self) -> Result<Vec<Self>, SummaryError>;

    /// Text before the first child element.
    fn text(&self) -> Result<Option<String>, SummaryError>;

    /// Descendant text, each run trimmed, joined by single spaces.
    fn flat_text(&self) -> Result<String, SummaryError>;
}

impl FieldNode for Element<'_> {
    fn tag(&self) -> &str {
        Element::tag(self)
    }

    fn children(&self) -> Result<Vec<Self>, SummaryError> {
        Ok(Element::children(*self).collect())
    }

    fn text(&self) -> Result<Option<String>, SummaryError> {
        Ok(self.leading_text())
    }

    fn flat_text(&self) -> Result<String, SummaryError> {
        Ok(Element::flat_text(self))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Leaf,
    List,
    Map,
    Mixed,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Summarizer {
    limits: SummaryLimits,
}

impl Summarizer {
    pub fn new(limits: SummaryLimits) -> Self {
        Self { limits }
    }

    /// Summarize one field.
    pub fn summarize<N: FieldNode>(&self, node: &N) -> Result<String, SummaryError> {
        let kids = node.children()?;
        match classify(&kids)? {
            Shape::Leaf => self.leaf(node),
            Shape::List => {
                let limit = self.limits.max_list_items;
                let mut items = Vec::with_capacity(limit.min(kids.len()));
                for kid in kids.iter().take(limit) {
                    let text = kid.flat_text()?;
                    items.push(if text.is_empty() {
                        EMPTY_PLACEHOLDER.to_string()
                    } else {
                        text
                    });
                }
                Ok(bracketed(&items, kids.len()))
            }
            Shape::Map => {
                let limit = self.limits.max_list_items;
                let mut items = Vec::with_capacity(limit.min(kids.len()));
                for kid in kids.iter().take(limit) {
                    let text = kid.text()?.unwrap_or_default();
                    items.push(format!("{}: {}", kid.tag(), text.trim()));
                }
                Ok(bracketed(&items, kids.len()))
            }
            Shape::Mixed => {
                let mut names: Vec<String> = Vec::new();
                for kid in &kids {
                    if !names.iter().any(|name| name == kid.tag()) {
                        names.push(kid.tag().to_string());
                    }
                }
                let total = names.len();
                names.truncate(self.limits.max_tag_names);
                Ok(bracketed(&names, total))
            }
        }
    }

    fn leaf<N: FieldNode>(&self, node: &N) -> Result<String, SummaryError> {
        let text = node.text()?.unwrap_or_default();
        let text = text.trim();
        if text.is_empty() {
            return Ok(EMPTY_PLACEHOLDER.to_string());
        }
        let limit = self.limits.max_text_chars;
        if text.chars().count() <= limit {
            return Ok(text.to_string());
        }
        let mut short: String = text.chars().take(limit).collect();
        short.push(ELLIPSIS);
        Ok(short)
    }

    /// Summaries for every direct child of `node` whose tag is not in
    /// `excluded`, ordered by key (case-insensitive) then summary length.
    pub fn summarize_fields<N: FieldNode>(&self, node: &N, excluded: &[&str]) -> Vec<FieldSummary> {
        let children = match node.children() {
            Ok(children) => children,
            Err(err) => {
                debug!("cannot list fields of <{}>: {err}", node.tag());
                return Vec::new();
            }
        };

        let mut fields: Vec<FieldSummary> = children
            .iter()
            .filter(|child| !excluded.contains(&child.tag()))
            .map(|child| {
                let value = self.summarize(child).unwrap_or_else(|err| {
                    debug!("summary of <{}> failed: {err}", child.tag());
                    UNREADABLE_PLACEHOLDER.to_string()
                });
                FieldSummary {
                    key: child.tag().to_string(),
                    value,
                }
            })
            .collect();
        fields.sort_by_cached_key(|field| (field.key.to_lowercase(), field.value.chars().count()));
        fields
    }
}

fn classify<N: FieldNode>(kids: &[N]) -> Result<Shape, SummaryError> {
    if kids.is_empty() {
        return Ok(Shape::Leaf);
    }
    if kids
        .iter()
        .all(|kid| kid.tag().eq_ignore_ascii_case(LIST_ITEM_TAG))
    {
        return Ok(Shape::List);
    }
    for kid in kids {
        if !is_leaf_with_text(kid)? {
            return Ok(Shape::Mixed);
        }
    }
    Ok(Shape::Map)
}

fn is_leaf_with_text<N: FieldNode>(node: &N) -> Result<bool, SummaryError> {
    if !node.children()?.is_empty() {
        return Ok(false);
    }
    Ok(node
        .text()?
        .is_some_and(|text| !text.trim().is_empty()))
}

fn bracketed(items: &[String], total: usize) -> String {
    let shown = items.len();
    let more = if total > shown {
        format!(", +{} more", total - shown)
    } else {
        String::new()
    };
    format!("[{}{more}]", items.join(", "))
}
