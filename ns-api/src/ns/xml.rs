//! Generic XML tree for NS API responses.
//!
//! Responses are decoded into an ordered key-value [`Node`] tree before
//! being mapped onto records:
//! - an element with only text becomes [`Node::Text`]
//! - an element with children or attributes becomes [`Node::Element`],
//!   with attributes under `@name` keys and its text under `#text`
//! - repeated sibling elements are merged into one [`Node::List`]
//!
//! XML cannot tell "one child" from "a list with one child", so a field
//! that may repeat must always be read through [`normalize_to_sequence`].

use std::borrow::Cow;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

/// Key under which an element's own text is stored when it also has
/// attributes or children.
pub const TEXT_KEY: &str = "#text";

/// Prefix for attribute keys.
pub const ATTRIBUTE_PREFIX: char = '@';

/// Error returned when a response body is not well-formed XML.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed XML at byte {position}: {message}")]
pub struct DecodeError {
    position: u64,
    message: String,
}

impl DecodeError {
    fn new(position: u64, message: impl Into<String>) -> Self {
        Self {
            position,
            message: message.into(),
        }
    }

    /// Byte offset in the input where decoding failed.
    pub fn position(&self) -> u64 {
        self.position
    }
}

/// A node of the decoded tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Text-only (or empty) element.
    Text(String),
    /// Element with attributes and/or child elements, in document order.
    Element(Vec<(String, Node)>),
    /// Repeated sibling elements sharing one name, in document order.
    List(Vec<Node>),
}

impl Node {
    /// Child (or attribute, as `@name`) with the given key.
    pub fn get(&self, key: &str) -> Option<&Node> {
        match self {
            Node::Element(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            Node::Text(_) | Node::List(_) => None,
        }
    }

    /// Follow a sequence of keys from this node.
    pub fn path(&self, keys: &[&str]) -> Option<&Node> {
        keys.iter().try_fold(self, |node, key| node.get(key))
    }

    /// Text content of this node.
    ///
    /// For an element this is its `#text` entry, so an element that has
    /// only attributes has no text.
    pub fn text(&self) -> Option<&str> {
        match self {
            Node::Text(text) => Some(text),
            Node::Element(_) => self.get(TEXT_KEY).and_then(Node::text),
            Node::List(_) => None,
        }
    }

    /// Value of an attribute of this element.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        match self {
            Node::Element(entries) => entries
                .iter()
                .find(|(k, _)| {
                    k.strip_prefix(ATTRIBUTE_PREFIX)
                        .is_some_and(|attr| attr == name)
                })
                .and_then(|(_, v)| v.text()),
            Node::Text(_) | Node::List(_) => None,
        }
    }

    /// Name of the first entry, which for a decoded document is the root
    /// element.
    pub fn root_name(&self) -> Option<&str> {
        match self {
            Node::Element(entries) => entries.first().map(|(k, _)| k.as_str()),
            Node::Text(_) | Node::List(_) => None,
        }
    }
}

/// View a possibly-repeated field as a sequence.
///
/// A single node becomes a one-element sequence, a [`Node::List`] is
/// passed through and an absent node yields an empty sequence.
pub fn normalize_to_sequence(node: Option<&Node>) -> Vec<&Node> {
    match node {
        None => Vec::new(),
        Some(Node::List(items)) => items.iter().collect(),
        Some(single) => vec![single],
    }
}

/// An element being built while its content is read.
struct OpenElement {
    name: String,
    entries: Vec<(String, Node)>,
    text: String,
}

impl OpenElement {
    fn new(start: &BytesStart<'_>, position: u64) -> Result<Self, DecodeError> {
        let mut entries = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| DecodeError::new(position, e.to_string()))?;
            let key = format!(
                "{ATTRIBUTE_PREFIX}{}",
                String::from_utf8_lossy(attr.key.as_ref())
            );
            let value = attr
                .unescape_value()
                .map_err(|e| DecodeError::new(position, e.to_string()))?;
            insert(&mut entries, key, Node::Text(value.into_owned()));
        }

        Ok(Self {
            name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
            entries,
            text: String::new(),
        })
    }

    fn push_text(&mut self, text: &str) {
        self.text.push_str(text);
    }

    fn add_child(&mut self, name: String, node: Node) {
        insert(&mut self.entries, name, node);
    }

    fn finish(mut self) -> (String, Node) {
        let node = if self.entries.is_empty() {
            Node::Text(self.text)
        } else {
            if !self.text.is_empty() {
                self.entries.push((TEXT_KEY.to_string(), Node::Text(self.text)));
            }
            Node::Element(self.entries)
        };
        (self.name, node)
    }
}

/// Add an entry, merging with an existing entry of the same name.
fn insert(entries: &mut Vec<(String, Node)>, name: String, node: Node) {
    let Some(idx) = entries.iter().position(|(k, _)| *k == name) else {
        entries.push((name, node));
        return;
    };
    match &mut entries[idx].1 {
        Node::List(items) => items.push(node),
        existing => {
            let first = std::mem::replace(existing, Node::List(Vec::new()));
            *existing = Node::List(vec![first, node]);
        }
    }
}

/// Decode an XML document into a [`Node`] tree.
///
/// The returned node is an element whose single entry is the document's
/// root element, so `decode(xml)?.get("Stations")` reaches the root of a
/// station list.
///
/// # Examples
///
/// ```
/// use ns_api::ns::{decode, normalize_to_sequence};
///
/// let tree = decode("<Stations><Station><Code>UT</Code></Station></Stations>").unwrap();
/// let stations = normalize_to_sequence(tree.path(&["Stations", "Station"]));
/// assert_eq!(stations.len(), 1);
/// assert_eq!(stations[0].get("Code").and_then(|c| c.text()), Some("UT"));
/// ```
pub fn decode(xml: &str) -> Result<Node, DecodeError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut document: Vec<(String, Node)> = Vec::new();
    let mut open: Vec<OpenElement> = Vec::new();

    loop {
        let position = reader.buffer_position();
        let event = reader
            .read_event()
            .map_err(|e| DecodeError::new(reader.error_position(), e.to_string()))?;

        match event {
            Event::Start(start) => open.push(OpenElement::new(&start, position)?),
            Event::Empty(start) => {
                let (name, node) = OpenElement::new(&start, position)?.finish();
                attach(&mut open, &mut document, name, node, position)?;
            }
            Event::End(_) => {
                let element = open
                    .pop()
                    .ok_or_else(|| DecodeError::new(position, "unexpected closing tag"))?;
                let (name, node) = element.finish();
                attach(&mut open, &mut document, name, node, position)?;
            }
            Event::Text(text) => {
                let text = text
                    .unescape()
                    .map_err(|e| DecodeError::new(position, e.to_string()))?;
                push_text(&mut open, text, position)?;
            }
            Event::CData(data) => {
                push_text(&mut open, String::from_utf8_lossy(&data), position)?;
            }
            Event::Eof => break,
            Event::Decl(_) | Event::PI(_) | Event::Comment(_) | Event::DocType(_) => {}
        }
    }

    if let Some(element) = open.last() {
        return Err(DecodeError::new(
            reader.buffer_position(),
            format!("unclosed element <{}>", element.name),
        ));
    }
    if document.is_empty() {
        return Err(DecodeError::new(0, "no root element"));
    }

    Ok(Node::Element(document))
}

fn attach(
    open: &mut [OpenElement],
    document: &mut Vec<(String, Node)>,
    name: String,
    node: Node,
    position: u64,
) -> Result<(), DecodeError> {
    match open.last_mut() {
        Some(parent) => parent.add_child(name, node),
        None if document.is_empty() => document.push((name, node)),
        None => return Err(DecodeError::new(position, "multiple root elements")),
    }
    Ok(())
}

fn push_text(open: &mut [OpenElement], text: Cow<'_, str>, position: u64) -> Result<(), DecodeError> {
    match open.last_mut() {
        Some(element) => {
            element.push_text(&text);
            Ok(())
        }
        None => Err(DecodeError::new(position, "text outside the root element")),
    }
}
