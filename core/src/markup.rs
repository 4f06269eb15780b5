//! Lossless lexer for pretty-printed record markup.
//!
//! Splits markup into tag punctuation, tag names, attribute names, attribute
//! values, comments and text, so callers can colour it or search inside it
//! without ever crossing a tag boundary. Concatenating the token texts gives
//! back the input.

use crate::highlight::Segment;
use crate::highlight::highlight;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    /// `<`, `</`, `>`, `/>`, `=` and whitespace inside a tag
    TagPunct,
    TagName,
    AttrName,
    /// Quoted value, quotes included
    AttrValue,
    Comment,
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkupToken<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
}

/// One token split into highlighted segments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarkedToken {
    pub kind: TokenKind,
    pub segments: Vec<Segment>,
}

fn is_name_char(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b':' | b'_' | b'-' | b'.')
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    tokens: Vec<MarkupToken<'a>>,
}

impl<'a> Lexer<'a> {
    fn bytes(&self) -> &'a [u8] {
        self.input.as_bytes()
    }

    fn peek(&self, offset: usize) -> Option<u8> {
        self.bytes().get(self.pos + offset).copied()
    }

    fn emit(&mut self, kind: TokenKind, end: usize) {
        if end > self.pos {
            self.tokens.push(MarkupToken {
                kind,
                text: &self.input[self.pos..end],
            });
            self.pos = end;
        }
    }

    fn scan_while(&self, from: usize, predicate: impl Fn(u8) -> bool) -> usize {
        let bytes = self.bytes();
        let mut end = from;
        while end < bytes.len() && predicate(bytes[end]) {
            end += 1;
        }
        end
    }

    fn run(mut self) -> Vec<MarkupToken<'a>> {
        while self.pos < self.input.len() {
            let rest = &self.input[self.pos..];
            if rest.starts_with("<!--") {
                let end = rest
                    .find("-->")
                    .map_or(self.input.len(), |index| self.pos + index + 3);
                self.emit(TokenKind::Comment, end);
            } else if self.starts_tag() {
                self.tag();
            } else {
                let first = rest.chars().next().map_or(1, char::len_utf8);
                let end = rest[first..]
                    .find('<')
                    .map_or(self.input.len(), |index| self.pos + first + index);
                self.emit(TokenKind::Text, end);
            }
        }
        self.tokens
    }

    fn starts_tag(&self) -> bool {
        if self.peek(0) != Some(b'<') {
            return false;
        }
        match self.peek(1) {
            Some(b'/') => self.peek(2).is_some_and(is_name_char),
            Some(byte) => is_name_char(byte),
            None => false,
        }
    }

    fn tag(&mut self) {
        let open = if self.peek(1) == Some(b'/') { 2 } else { 1 };
        self.emit(TokenKind::TagPunct, self.pos + open);
        let name_end = self.scan_while(self.pos, is_name_char);
        self.emit(TokenKind::TagName, name_end);

        while let Some(byte) = self.peek(0) {
            match byte {
                b'>' => {
                    self.emit(TokenKind::TagPunct, self.pos + 1);
                    return;
                }
                b'/' if self.peek(1) == Some(b'>') => {
                    self.emit(TokenKind::TagPunct, self.pos + 2);
                    return;
                }
                b'"' | b'\'' => {
                    let end = self.bytes()[self.pos + 1..]
                        .iter()
                        .position(|b| *b == byte)
                        .map_or(self.input.len(), |index| self.pos + index + 2);
                    self.emit(TokenKind::AttrValue, end);
                }
                _ if is_name_char(byte) => {
                    let end = self.scan_while(self.pos, is_name_char);
                    self.emit(TokenKind::AttrName, end);
                }
                b'<' => return,
                _ => {
                    let end = self.scan_while(self.pos + 1, |b| {
                        b.is_ascii_whitespace() || b == b'='
                    });
                    let end = self.char_end(end);
                    self.emit(TokenKind::TagPunct, end);
                }
            }
        }
    }

    /// Round `end` up to the next character boundary.
    fn char_end(&self, mut end: usize) -> usize {
        while end < self.input.len() && !self.input.is_char_boundary(end) {
            end += 1;
        }
        end
    }
}

pub fn lex(markup: &str) -> Vec<MarkupToken<'_>> {
    Lexer {
        input: markup,
        pos: 0,
        tokens: Vec::new(),
    }
    .run()
}

/// Distinct tag names in order of first appearance.
pub fn tag_names(markup: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for token in lex(markup) {
        if token.kind == TokenKind::TagName && !names.iter().any(|name| name == token.text) {
            names.push(token.text.to_string());
        }
    }
    names
}

/// Highlight `terms` inside every token separately, so a mark never spans a
/// tag boundary. Punctuation is never marked.
pub fn highlight_markup(markup: &str, terms: &[String]) -> Vec<MarkedToken> {
    lex(markup)
        .into_iter()
        .map(|token| {
            let segments = if token.kind == TokenKind::TagPunct {
                vec![Segment {
                    text: token.text.to_string(),
                    marked: false,
                }]
            } else {
                highlight(token.text, terms)
            };
            MarkedToken {
                kind: token.kind,
                segments,
            }
        })
        .collect()
}
