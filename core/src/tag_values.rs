//! Values of one tag name across every record's markup.

use crate::index::alphabetical;
use crate::record::Record;
use crate::xml::Document;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashSet;
use tracing::debug;

/// One element of the looked-up tag, with its owning record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagOccurrence {
    pub value: String,
    pub source_name: String,
    pub category: String,
    pub name: String,
    pub record_id: String,
}

/// Non-blank text of every element named `tag` in a record's markup, the
/// root element included.
fn values_in(record: &Record, tag: &str) -> Vec<String> {
    let doc = match Document::parse(&record.raw_markup) {
        Ok(doc) => doc,
        Err(err) => {
            debug!("skipping markup of {}: {err}", record.id);
            return Vec::new();
        }
    };
    let root = doc.root();
    std::iter::once(root)
        .chain(root.descendants())
        .filter(|element| element.tag() == tag)
        .map(|element| element.flat_text())
        .filter(|value| !value.is_empty())
        .collect()
}

fn is_plain_number(value: &str) -> bool {
    let digits = value.strip_prefix(['-', '+']).unwrap_or(value);
    let (whole, fraction) = match digits.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (digits, None),
    };
    let all_digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
    all_digits(whole) && fraction.is_none_or(all_digits)
}

/// Distinct values of `tag` across `records`. Sorted numerically when every
/// value is a plain decimal number, otherwise with [`natural_cmp`].
pub fn unique_values<'a>(records: impl IntoIterator<Item = &'a Record>, tag: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut values: Vec<String> = records
        .into_iter()
        .flat_map(|record| values_in(record, tag))
        .filter(|value| seen.insert(value.clone()))
        .collect();

    if values.iter().all(|value| is_plain_number(value)) {
        values.sort_by(|a, b| {
            let a: f64 = a.parse().unwrap_or_default();
            let b: f64 = b.parse().unwrap_or_default();
            a.total_cmp(&b)
        });
    } else {
        values.sort_by(|a, b| natural_cmp(a, b));
    }
    values
}

/// Every occurrence of `tag` across `records`, ordered by value, then
/// source, category and name.
pub fn occurrences<'a>(records: impl IntoIterator<Item = &'a Record>, tag: &str) -> Vec<TagOccurrence> {
    let mut found: Vec<TagOccurrence> = records
        .into_iter()
        .flat_map(|record| {
            values_in(record, tag)
                .into_iter()
                .map(move |value| TagOccurrence {
                    value,
                    source_name: record.source_name.clone(),
                    category: record.category.clone(),
                    name: record.name.clone(),
                    record_id: record.id.clone(),
                })
        })
        .collect();
    found.sort_by(|a, b| {
        natural_cmp(&a.value, &b.value)
            .then_with(|| alphabetical(&a.source_name, &b.source_name))
            .then_with(|| alphabetical(&a.category, &b.category))
            .then_with(|| alphabetical(&a.name, &b.name))
    });
    found
}

enum Chunk<'a> {
    Digits(&'a str),
    Other(&'a str),
}

fn chunks(text: &str) -> Vec<Chunk<'_>> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut in_digits = None;
    for (index, ch) in text.char_indices() {
        let digit = ch.is_ascii_digit();
        match in_digits {
            Some(previous) if previous != digit => {
                out.push(chunk(&text[start..index], previous));
                start = index;
            }
            _ => {}
        }
        in_digits = Some(digit);
    }
    if let Some(digit) = in_digits {
        out.push(chunk(&text[start..], digit));
    }
    out
}

fn chunk(text: &str, digits: bool) -> Chunk<'_> {
    if digits {
        Chunk::Digits(text)
    } else {
        Chunk::Other(text)
    }
}

fn cmp_digits(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Numeric-aware comparison: digit runs compare by value, other runs
/// case-insensitively, with a plain comparison as the final tie-break.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let left = chunks(a);
    let right = chunks(b);
    for (x, y) in left.iter().zip(right.iter()) {
        let ordering = match (x, y) {
            (Chunk::Digits(x), Chunk::Digits(y)) => cmp_digits(x, y),
            (Chunk::Digits(_), Chunk::Other(_)) => Ordering::Less,
            (Chunk::Other(_), Chunk::Digits(_)) => Ordering::Greater,
            (Chunk::Other(x), Chunk::Other(y)) => x.to_lowercase().cmp(&y.to_lowercase()),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    left.len().cmp(&right.len()).then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordKind;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn record(source: &str, name: &str, markup: &str) -> Record {
        Record {
            id: Record::make_id(source, "ThingDef", name),
            kind: RecordKind::Def,
            category: "ThingDef".to_string(),
            name: name.to_string(),
            label: None,
            description: None,
            parent_name: None,
            is_abstract: false,
            source_name: source.to_string(),
            absolute_path: PathBuf::from("/data/x.xml"),
            relative_path: PathBuf::from("x.xml"),
            raw_markup: markup.to_string(),
            full_text: String::new(),
            field_summaries: Vec::new(),
            ancestor_ids: Vec::new(),
            ancestor_labels: Vec::new(),
        }
    }

    #[test]
    fn numeric_values_sort_by_value() {
        let records = vec![
            record("Core", "A", "<ThingDef><Mass>10</Mass><x><Mass>2.5</Mass></x></ThingDef>"),
            record("Core", "B", "<ThingDef><Mass>-1</Mass><Mass> 10 </Mass><Mass> </Mass></ThingDef>"),
        ];
        assert_eq!(unique_values(&records, "Mass"), vec!["-1", "2.5", "10"]);
    }

    #[test]
    fn mixed_values_sort_naturally() {
        let records = vec![record(
            "Core",
            "A",
            "<ThingDef><tag>item10</tag><tag>item2</tag><tag>Beta</tag><tag>alpha</tag></ThingDef>",
        )];
        assert_eq!(
            unique_values(&records, "tag"),
            vec!["alpha", "Beta", "item2", "item10"]
        );
    }

    #[test]
    fn root_element_counts_and_broken_markup_is_skipped() {
        let records = vec![
            record("Core", "A", "<Mass>3</Mass>"),
            record("Core", "B", "<broken"),
        ];
        assert_eq!(unique_values(&records, "Mass"), vec!["3"]);
        assert!(unique_values(&records, "Nothing").is_empty());
    }

    #[test]
    fn occurrences_sort_by_value_then_owner() {
        let records = vec![
            record("Royalty", "Crown", "<ThingDef><Mass>1</Mass></ThingDef>"),
            record("Core", "Gun", "<ThingDef><Mass>1</Mass><Mass>0.5</Mass></ThingDef>"),
        ];
        let found: Vec<(String, String, String)> = occurrences(&records, "Mass")
            .into_iter()
            .map(|o| (o.value, o.source_name, o.name))
            .collect();
        assert_eq!(
            found,
            vec![
                ("0.5".to_string(), "Core".to_string(), "Gun".to_string()),
                ("1".to_string(), "Core".to_string(), "Gun".to_string()),
                ("1".to_string(), "Royalty".to_string(), "Crown".to_string()),
            ]
        );
    }

    #[test]
    fn occurrence_owners_sort_ignoring_case() {
        let records = vec![
            record("Core", "Banana", "<ThingDef><Mass>1</Mass></ThingDef>"),
            record("Core", "apple", "<ThingDef><Mass>1</Mass></ThingDef>"),
        ];
        let owners: Vec<String> = occurrences(&records, "Mass")
            .into_iter()
            .map(|o| o.name)
            .collect();
        assert_eq!(owners, vec!["apple", "Banana"]);
    }

    #[test]
    fn plain_number_detection() {
        for yes in ["0", "-3", "+4.25", "007"] {
            assert!(is_plain_number(yes), "{yes}");
        }
        for no in ["", "-", "1.", ".5", "1e3", "1,5", "abc"] {
            assert!(!is_plain_number(no), "{no}");
        }
    }

    #[test]
    fn natural_ordering() {
        assert_eq!(natural_cmp("a2", "a10"), Ordering::Less);
        assert_eq!(natural_cmp("a02", "a2"), Ordering::Less);
        assert_eq!(natural_cmp("B", "a"), Ordering::Greater);
        assert_eq!(natural_cmp("x", "x"), Ordering::Equal);
    }
}
