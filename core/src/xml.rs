//! Minimal read-only XML tree.
//!
//! Documents are parsed with `quick-xml` into an arena of elements. Each
//! element is addressed by a [`NodeId`], so two structurally identical
//! elements remain distinct. Comments, processing instructions and the
//! declaration are dropped; CDATA sections become text.

use crate::error::XmlError;
use quick_xml::Reader;
use quick_xml::events::BytesStart;
use quick_xml::events::Event;

const PRETTY_INDENT: &str = "  ";

/// Identity of one element inside a [`Document`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
enum Child {
    Element(NodeId),
    Text(String),
}

#[derive(Debug, Clone)]
struct ElementData {
    tag: String,
    attributes: Vec<(String, String)>,
    children: Vec<Child>,
}

/// A parsed document with exactly one root element.
#[derive(Debug, Clone)]
pub struct Document {
    elements: Vec<ElementData>,
    root: NodeId,
}

impl Document {
    /// Parse raw document bytes. A UTF-8 byte order mark is skipped.
    pub fn parse_bytes(bytes: &[u8]) -> Result<Self, XmlError> {
        let text = std::str::from_utf8(bytes).map_err(|err| {
            XmlError::new(
                format!("document is not valid UTF-8: {err}"),
                err.valid_up_to() as u64,
            )
        })?;
        Self::parse(text)
    }

    pub fn parse(text: &str) -> Result<Self, XmlError> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut reader = Reader::from_str(text);
        reader.config_mut().trim_text(false);

        let mut elements: Vec<ElementData> = Vec::new();
        let mut stack: Vec<NodeId> = Vec::new();
        let mut root: Option<NodeId> = None;

        loop {
            let event = reader
                .read_event()
                .map_err(|err| XmlError::new(err.to_string(), reader.error_position() as u64))?;
            let position = reader.buffer_position() as u64;
            match event {
                Event::Start(start) => {
                    let id = push_element(&mut elements, &start, position)?;
                    attach(&mut elements, &stack, &mut root, id, position)?;
                    stack.push(id);
                }
                Event::Empty(start) => {
                    let id = push_element(&mut elements, &start, position)?;
                    attach(&mut elements, &stack, &mut root, id, position)?;
                }
                Event::End(_) => {
                    if stack.pop().is_none() {
                        return Err(XmlError::new("unexpected closing tag", position));
                    }
                }
                Event::Text(text) => {
                    let value = text
                        .unescape()
                        .map_err(|err| XmlError::new(err.to_string(), position))?;
                    push_text(&mut elements, &stack, &value, position)?;
                }
                Event::CData(data) => {
                    let raw = data.into_inner();
                    let value = std::str::from_utf8(&raw)
                        .map_err(|err| XmlError::new(err.to_string(), position))?;
                    push_text(&mut elements, &stack, value, position)?;
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(open) = stack.last() {
            let tag = &elements[open.0].tag;
            return Err(XmlError::new(
                format!("unclosed element <{tag}>"),
                reader.buffer_position() as u64,
            ));
        }

        let root = root.ok_or_else(|| XmlError::new("document has no root element", 0))?;
        Ok(Self { elements, root })
    }

    pub fn root(&self) -> Element<'_> {
        Element {
            doc: self,
            id: self.root,
        }
    }
}

fn push_element(
    elements: &mut Vec<ElementData>,
    start: &BytesStart<'_>,
    position: u64,
) -> Result<NodeId, XmlError> {
    let tag = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|err| XmlError::new(err.to_string(), position))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|err| XmlError::new(err.to_string(), position))?
            .into_owned();
        attributes.push((key, value));
    }
    let id = NodeId(elements.len());
    elements.push(ElementData {
        tag,
        attributes,
        children: Vec::new(),
    });
    Ok(id)
}

fn attach(
    elements: &mut [ElementData],
    stack: &[NodeId],
    root: &mut Option<NodeId>,
    id: NodeId,
    position: u64,
) -> Result<(), XmlError> {
    match stack.last() {
        Some(parent) => {
            elements[parent.0].children.push(Child::Element(id));
            Ok(())
        }
        None if root.is_some() => Err(XmlError::new("multiple root elements", position)),
        None => {
            *root = Some(id);
            Ok(())
        }
    }
}

fn push_text(
    elements: &mut [ElementData],
    stack: &[NodeId],
    value: &str,
    position: u64,
) -> Result<(), XmlError> {
    match stack.last() {
        Some(parent) => {
            let children = &mut elements[parent.0].children;
            // Adjacent text and CDATA runs form one text node.
            match children.last_mut() {
                Some(Child::Text(previous)) => previous.push_str(value),
                _ => children.push(Child::Text(value.to_string())),
            }
            Ok(())
        }
        None if value.trim().is_empty() => Ok(()),
        None => Err(XmlError::new("text outside the root element", position)),
    }
}

/// Borrowed view of one element.
#[derive(Clone, Copy, Debug)]
pub struct Element<'a> {
    doc: &'a Document,
    id: NodeId,
}

impl<'a> Element<'a> {
    fn data(&self) -> &'a ElementData {
        &self.doc.elements[self.id.0]
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn tag(&self) -> &'a str {
        &self.data().tag
    }

    pub fn attribute(&self, name: &str) -> Option<&'a str> {
        self.data()
            .attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Direct element children, in document order.
    pub fn children(self) -> impl Iterator<Item = Element<'a>> + 'a {
        let doc = self.doc;
        self.data().children.iter().filter_map(move |child| match child {
            Child::Element(id) => Some(Element { doc, id: *id }),
            Child::Text(_) => None,
        })
    }

    /// First direct child with the given tag.
    pub fn child(&self, tag: &str) -> Option<Element<'a>> {
        self.children().find(|child| child.tag() == tag)
    }

    /// Text that precedes the first child element, or `None` when there is
    /// no such text at all.
    pub fn leading_text(&self) -> Option<String> {
        let mut text: Option<String> = None;
        for child in &self.data().children {
            match child {
                Child::Element(_) => break,
                Child::Text(value) => text.get_or_insert_with(String::new).push_str(value),
            }
        }
        text
    }

    /// Concatenation of every descendant text node, in document order.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.data().children {
            match child {
                Child::Element(id) => Element {
                    doc: self.doc,
                    id: *id,
                }
                .collect_text(out),
                Child::Text(value) => out.push_str(value),
            }
        }
    }

    /// Descendant text nodes, each trimmed, blank ones skipped, joined by
    /// single spaces. Unlike [`Element::text_content`] this does not depend
    /// on how the markup was indented.
    pub fn flat_text(&self) -> String {
        let mut parts = Vec::new();
        self.collect_trimmed(&mut parts);
        parts.join(" ")
    }

    fn collect_trimmed(&self, parts: &mut Vec<&'a str>) {
        for child in &self.data().children {
            match child {
                Child::Element(id) => Element {
                    doc: self.doc,
                    id: *id,
                }
                .collect_trimmed(parts),
                Child::Text(value) => {
                    let value = value.trim();
                    if !value.is_empty() {
                        parts.push(value);
                    }
                }
            }
        }
    }

    /// Every element below this one, in document (pre-)order. The element
    /// itself is not included.
    pub fn descendants(&self) -> Vec<Element<'a>> {
        let mut out = Vec::new();
        let mut pending: Vec<Element<'a>> = self.children().collect();
        pending.reverse();
        while let Some(next) = pending.pop() {
            out.push(next);
            let mut kids: Vec<Element<'a>> = next.children().collect();
            kids.reverse();
            pending.extend(kids);
        }
        out
    }

    /// Indented serialization without an XML declaration. Elements holding
    /// a single text node stay on one line; inside other elements text is
    /// trimmed onto its own line and blank text is dropped.
    pub fn to_pretty_string(&self) -> String {
        let mut out = String::new();
        self.write_pretty(&mut out, 0);
        out.truncate(out.trim_end().len());
        out
    }

    fn write_pretty(&self, out: &mut String, depth: usize) {
        let indent = PRETTY_INDENT.repeat(depth);
        let data = self.data();
        out.push_str(&indent);
        out.push('<');
        out.push_str(&data.tag);
        for (key, value) in &data.attributes {
            out.push(' ');
            out.push_str(key);
            out.push_str("=\"");
            out.push_str(&escape_attribute(value));
            out.push('"');
        }

        match data.children.as_slice() {
            [] => out.push_str("/>\n"),
            [Child::Text(value)] => {
                out.push('>');
                out.push_str(&escape_text(value));
                out.push_str("</");
                out.push_str(&data.tag);
                out.push_str(">\n");
            }
            children => {
                out.push_str(">\n");
                let inner = PRETTY_INDENT.repeat(depth + 1);
                for child in children {
                    match child {
                        Child::Element(id) => Element {
                            doc: self.doc,
                            id: *id,
                        }
                        .write_pretty(out, depth + 1),
                        Child::Text(value) => {
                            let value = value.trim();
                            if !value.is_empty() {
                                out.push_str(&inner);
                                out.push_str(&escape_text(value));
                                out.push('\n');
                            }
                        }
                    }
                }
                out.push_str(&indent);
                out.push_str("</");
                out.push_str(&data.tag);
                out.push_str(">\n");
            }
        }
    }
}

fn escape_text(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attribute(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_nested_elements_and_attributes() {
        let doc = Document::parse(
            r#"<?xml version="1.0" encoding="utf-8"?>
<Defs>
  <!-- comment -->
  <ThingDef Abstract="True" Name="Base">
    <defName>Gun</defName>
    <tags><li>a</li><li>b</li></tags>
  </ThingDef>
</Defs>"#,
        )
        .expect("parse");

        let root = doc.root();
        assert_eq!(root.tag(), "Defs");
        let thing = root.child("ThingDef").expect("thing def");
        assert_eq!(thing.attribute("Abstract"), Some("True"));
        assert_eq!(thing.attribute("Missing"), None);
        assert_eq!(
            thing.child("defName").and_then(|e| e.leading_text()),
            Some("Gun".to_string())
        );
        let tags: Vec<&str> = thing.descendants().iter().map(|e| e.tag()).collect();
        assert_eq!(tags, vec!["defName", "tags", "li", "li"]);
    }

    #[test]
    fn unescapes_entities_and_cdata() {
        let doc = Document::parse("<a>x &amp; y<![CDATA[ <raw> ]]></a>").expect("parse");
        assert_eq!(doc.root().text_content(), "x & y <raw> ");
    }

    #[test]
    fn rejects_malformed_documents() {
        assert!(Document::parse("<a><b></a>").is_err());
        assert!(Document::parse("<a>").is_err());
        assert!(Document::parse("").is_err());
        assert!(Document::parse("<a/><b/>").is_err());
        assert!(Document::parse_bytes(&[0x3c, 0x61, 0xff, 0x3e]).is_err());
    }

    #[test]
    fn leading_text_stops_at_first_child() {
        let doc = Document::parse("<a>head<b>inner</b>tail</a>").expect("parse");
        assert_eq!(doc.root().leading_text(), Some("head".to_string()));
        assert_eq!(doc.root().text_content(), "headinnertail");

        let empty = Document::parse("<a><b/></a>").expect("parse");
        assert_eq!(empty.root().leading_text(), None);
    }

    #[test]
    fn pretty_string_indents_and_drops_blank_lines() {
        let doc = Document::parse(
            "<ThingDef Name=\"A&amp;B\">\n  <defName>Gun</defName>\n  <tags>\n    <li>x &lt; y</li>\n  </tags>\n  <empty/>\n</ThingDef>",
        )
        .expect("parse");
        let expected = [
            "<ThingDef Name=\"A&amp;B\">",
            "  <defName>Gun</defName>",
            "  <tags>",
            "    <li>x &lt; y</li>",
            "  </tags>",
            "  <empty/>",
            "</ThingDef>",
        ]
        .join("\n");
        assert_eq!(doc.root().to_pretty_string(), expected);
    }

    #[test]
    fn mixed_content_text_gets_its_own_line() {
        let doc = Document::parse("<a>\n    head\n    <b>inner</b>tail<c/></a>").expect("parse");
        assert_eq!(
            doc.root().to_pretty_string(),
            "<a>\n  head\n  <b>inner</b>\n  tail\n  <c/>\n</a>"
        );
    }

    #[test]
    fn flat_text_ignores_indentation() {
        let compact = Document::parse("<li><x>Steel</x><y> 10 </y></li>").expect("parse");
        let indented =
            Document::parse("<li>\n    <x>Steel</x>\n    <y>10</y>\n</li>").expect("parse");
        assert_eq!(compact.root().flat_text(), "Steel 10");
        assert_eq!(indented.root().flat_text(), "Steel 10");
    }

    #[test]
    fn identical_elements_keep_distinct_ids() {
        let doc = Document::parse("<r><li>1</li><li>1</li></r>").expect("parse");
        let ids: Vec<NodeId> = doc.root().children().map(|e| e.id()).collect();
        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);
    }
}
