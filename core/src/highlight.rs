//! Case-insensitive term marking.
//!
//! The scan walks the text left to right. At each position the earliest
//! starting term wins, the first in query order when several start together,
//! and the scan resumes after the mark, so marks never overlap.

use serde::Serialize;
use std::ops::Range;

/// A run of text, either marked as a term hit or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    pub text: String,
    pub marked: bool,
}

impl Segment {
    fn plain(text: &str) -> Self {
        Self {
            text: text.to_string(),
            marked: false,
        }
    }
}

/// Lower-case the query and split it on whitespace.
pub fn tokenize(query: &str) -> Vec<String> {
    query
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Lower-cased copy of a text that remembers where each original character
/// landed.
struct Folded {
    text: String,
    /// `(original byte offset, folded byte offset)` per character boundary,
    /// including the end of the text
    boundaries: Vec<(usize, usize)>,
}

impl Folded {
    fn new(original: &str) -> Self {
        let mut text = String::with_capacity(original.len());
        let mut boundaries = Vec::with_capacity(original.len() + 1);
        for (offset, ch) in original.char_indices() {
            boundaries.push((offset, text.len()));
            text.extend(ch.to_lowercase());
        }
        boundaries.push((original.len(), text.len()));
        Self { text, boundaries }
    }

    /// Original byte offset of a folded offset that sits on a character
    /// boundary.
    fn original_offset(&self, folded: usize) -> Option<usize> {
        self.boundaries
            .binary_search_by_key(&folded, |(_, f)| *f)
            .ok()
            .map(|index| self.boundaries[index].0)
    }
}

/// Byte ranges of `text` covered by marks.
pub fn mark_ranges(text: &str, terms: &[String]) -> Vec<Range<usize>> {
    let terms: Vec<&str> = terms
        .iter()
        .map(String::as_str)
        .filter(|term| !term.is_empty())
        .collect();
    if terms.is_empty() || text.is_empty() {
        return Vec::new();
    }

    let folded = Folded::new(text);
    let mut ranges = Vec::new();
    let mut cursor = 0;
    // The final boundary is the end of the text and cannot start a match.
    let last = folded.boundaries.len() - 1;
    while cursor < last {
        let (start, folded_start) = folded.boundaries[cursor];
        let rest = &folded.text[folded_start..];
        let end = terms
            .iter()
            .filter(|term| rest.starts_with(**term))
            .find_map(|term| folded.original_offset(folded_start + term.len()));

        match end {
            Some(end) => {
                ranges.push(start..end);
                cursor = folded
                    .boundaries
                    .binary_search_by_key(&end, |(offset, _)| *offset)
                    .unwrap_or(last);
            }
            None => cursor += 1,
        }
    }
    ranges
}

/// Split `text` into marked and unmarked segments.
pub fn highlight(text: &str, terms: &[String]) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut position = 0;
    for range in mark_ranges(text, terms) {
        if range.start > position {
            segments.push(Segment::plain(&text[position..range.start]));
        }
        segments.push(Segment {
            text: text[range.clone()].to_string(),
            marked: true,
        });
        position = range.end;
    }
    if position < text.len() || segments.is_empty() {
        segments.push(Segment::plain(&text[position..]));
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn terms(query: &str) -> Vec<String> {
        tokenize(query)
    }

    fn marked(text: &str, query: &str) -> Vec<String> {
        highlight(text, &terms(query))
            .into_iter()
            .filter(|segment| segment.marked)
            .map(|segment| segment.text)
            .collect()
    }

    #[test]
    fn tokenize_lowercases_and_splits() {
        assert_eq!(tokenize("  Gun   CORE "), vec!["gun", "core"]);
        assert!(tokenize("   ").is_empty());
    }

    #[test]
    fn marks_term_at_offset() {
        assert_eq!(mark_ranges("Shotgun", &terms("gun")), vec![4..7]);
        assert_eq!(
            highlight("Shotgun", &terms("GUN")),
            vec![
                Segment::plain("Shot"),
                Segment {
                    text: "gun".to_string(),
                    marked: true,
                },
            ]
        );
    }

    #[test]
    fn overlapping_terms_mark_once() {
        let segments = highlight("shotgun", &terms("sho shot"));
        assert_eq!(segments.iter().filter(|s| s.marked).count(), 1);
        assert_eq!(marked("shotgun", "sho shot"), vec!["sho"]);
        assert_eq!(marked("shotgun", "shot sho"), vec!["shot"]);
        let rebuilt: String = segments.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(rebuilt, "shotgun");

        assert_eq!(marked("shotgun", "hot sho"), vec!["sho"]);
    }

    #[test]
    fn repeated_hits_are_all_marked() {
        assert_eq!(marked("Gun gun GUN", "gun"), vec!["Gun", "gun", "GUN"]);
        assert_eq!(mark_ranges("aaaa", &terms("aa")), vec![0..2, 2..4]);
    }

    #[test]
    fn long_text_marks_every_hit() {
        let text = "<li>Gun</li>\n".repeat(2000);
        let ranges = mark_ranges(&text, &terms("gun"));
        assert_eq!(ranges.len(), 2000);
        assert_eq!(ranges[1999].start, 1999 * 13 + 4);
    }

    #[test]
    fn offsets_survive_case_folding() {
        // 'İ' lower-cases to two characters, shifting folded offsets.
        let text = "İron gun";
        assert_eq!(marked(text, "gun"), vec!["gun"]);
        assert_eq!(marked("ÄRMOR", "är"), vec!["ÄR"]);
    }

    #[test]
    fn no_terms_yield_single_plain_segment() {
        assert_eq!(highlight("Pistol", &[]), vec![Segment::plain("Pistol")]);
        assert_eq!(highlight("", &terms("x")), vec![Segment::plain("")]);
    }
}
