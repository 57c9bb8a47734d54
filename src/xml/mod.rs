// src/xml/mod.rs
//! QuakeML tree builder.
//!
//! Turns XML text into a `Node` tree using the usual XML-to-dict shape:
//! attributes become `@name` keys, mixed text becomes `#text`, repeated
//! children collapse into a list. Namespaces are rewritten to short prefixes
//! through a namespace map. Leaf text on known paths is coerced to
//! float/int/timestamp while the tree is built.

pub mod node;
pub mod timestamp;

use std::collections::HashMap;

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::NsReader;
use thiserror::Error;

use crate::consts::{
    NS_QUAKEML, NS_QUAKEML_BED, XML_CDATA, XML_TAG_CREATIONINFO, XML_TAG_CREATIONTIME,
    XML_TAG_DEPTH, XML_TAG_EVENT, XML_TAG_EVENTPARAMETERS, XML_TAG_LATITUDE, XML_TAG_LONGITUDE,
    XML_TAG_MAG, XML_TAG_MAGNITUDE, XML_TAG_ORIGIN, XML_TAG_Q_QUAKEML, XML_TAG_STATIONCOUNT,
    XML_TAG_TIME, XML_TAG_VALUE,
};
use crate::model::EventParameters;
pub use node::{Element, Node};
use timestamp::parse_timestamp;

/// URI → prefix. `None` means "no prefix".
pub type NamespaceMap = HashMap<String, Option<String>>;

#[derive(Debug, Error)]
pub enum XmlError {
    #[error("malformed xml: {0}")]
    Malformed(String),
    #[error("document has no root element")]
    NoRoot,
    #[error("content outside the root element")]
    ContentOutsideRoot,
    #[error("unexpected end of document inside <{0}>")]
    UnexpectedEof(String),
    #[error("undeclared namespace prefix `{0}`")]
    UnboundPrefix(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Coercion {
    Float,
    Int,
    Timestamp,
}

const EVENT_PATH: [&str; 3] = [XML_TAG_Q_QUAKEML, XML_TAG_EVENTPARAMETERS, XML_TAG_EVENT];

// Full path (root first) → conversion applied to the leaf text.
static COERCIONS: &[(&[&str], Coercion)] = &[
    (
        &[EVENT_PATH[0], EVENT_PATH[1], EVENT_PATH[2], XML_TAG_ORIGIN, XML_TAG_LATITUDE, XML_TAG_VALUE],
        Coercion::Float,
    ),
    (
        &[EVENT_PATH[0], EVENT_PATH[1], EVENT_PATH[2], XML_TAG_ORIGIN, XML_TAG_LONGITUDE, XML_TAG_VALUE],
        Coercion::Float,
    ),
    (
        &[EVENT_PATH[0], EVENT_PATH[1], EVENT_PATH[2], XML_TAG_ORIGIN, XML_TAG_DEPTH, XML_TAG_VALUE],
        Coercion::Float,
    ),
    (
        &[EVENT_PATH[0], EVENT_PATH[1], EVENT_PATH[2], XML_TAG_MAGNITUDE, XML_TAG_MAG, XML_TAG_VALUE],
        Coercion::Float,
    ),
    (
        &[EVENT_PATH[0], EVENT_PATH[1], EVENT_PATH[2], XML_TAG_MAGNITUDE, XML_TAG_STATIONCOUNT],
        Coercion::Int,
    ),
    (
        &[EVENT_PATH[0], EVENT_PATH[1], EVENT_PATH[2], XML_TAG_ORIGIN, XML_TAG_TIME, XML_TAG_VALUE],
        Coercion::Timestamp,
    ),
    (
        &[EVENT_PATH[0], EVENT_PATH[1], EVENT_PATH[2], XML_TAG_CREATIONINFO, XML_TAG_CREATIONTIME],
        Coercion::Timestamp,
    ),
];

fn coercion_for(path: &[&str]) -> Option<Coercion> {
    COERCIONS
        .iter()
        .find(|(chain, _)| *chain == path)
        .map(|(_, c)| *c)
}

/// Convert leaf text according to its path. Failures keep the raw text.
fn coerce(path: &[&str], text: String) -> Node {
    let Some(kind) = coercion_for(path) else {
        return Node::Text(text);
    };
    let converted = match kind {
        Coercion::Float => text.trim().parse::<f64>().ok().map(Node::Float),
        Coercion::Int => text.trim().parse::<i64>().ok().map(Node::Int),
        Coercion::Timestamp => parse_timestamp(&text).map(Node::Time),
    };
    match converted {
        Some(node) => node,
        None => {
            tracing::warn!(path = %path.join("/"), value = %text, ?kind, "unable to convert value");
            Node::Text(text)
        }
    }
}

pub fn default_namespaces() -> NamespaceMap {
    let mut ns = NamespaceMap::new();
    ns.insert(NS_QUAKEML_BED.to_string(), None);
    ns.insert(NS_QUAKEML.to_string(), Some("q".to_string()));
    ns
}

struct Frame {
    name: String,
    attrs: Vec<(String, Node)>,
    children: Vec<(String, Node)>,
    text: String,
}

impl Frame {
    fn push_child(&mut self, key: String, value: Node) {
        match self.children.iter_mut().find(|(k, _)| *k == key) {
            Some((_, Node::List(items))) => items.push(value),
            Some((_, existing)) => {
                let first = std::mem::replace(existing, Node::Null);
                *existing = Node::List(vec![first, value]);
            }
            None => self.children.push((key, value)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct XmlParser {
    namespaces: NamespaceMap,
}

impl Default for XmlParser {
    fn default() -> Self {
        Self::new(None)
    }
}

impl XmlParser {
    /// Additional declarations are merged over the QuakeML defaults.
    pub fn new(additional_namespaces: Option<&NamespaceMap>) -> Self {
        let mut namespaces = default_namespaces();
        if let Some(extra) = additional_namespaces {
            namespaces.extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        Self { namespaces }
    }

    /// Parse the document and locate `q:quakeml/eventParameters`.
    /// Well-formed documents without that structure yield `Ok(None)`.
    pub fn parse(&self, xml: &str) -> Result<Option<EventParameters>, XmlError> {
        let tree = self.parse_tree(xml)?;
        let Some(quakeml) = tree.get(XML_TAG_Q_QUAKEML) else {
            tracing::warn!("invalid structure: missing top level element {XML_TAG_Q_QUAKEML}");
            return Ok(None);
        };
        match quakeml.get(XML_TAG_EVENTPARAMETERS) {
            Some(params) => Ok(Some(EventParameters::new(params.clone()))),
            None => {
                tracing::warn!("invalid structure: missing element {XML_TAG_EVENTPARAMETERS}");
                Ok(None)
            }
        }
    }

    /// Build the generic tree. The result is a map holding the single root.
    pub fn parse_tree(&self, xml: &str) -> Result<Node, XmlError> {
        let mut reader = NsReader::from_str(xml);
        let mut stack: Vec<Frame> = Vec::new();
        let mut root: Option<(String, Node)> = None;

        loop {
            let event = reader
                .read_event()
                .map_err(|e| XmlError::Malformed(e.to_string()))?;
            match event {
                Event::Start(e) => {
                    if root.is_some() && stack.is_empty() {
                        return Err(XmlError::ContentOutsideRoot);
                    }
                    let frame = self.open(&reader, &e)?;
                    stack.push(frame);
                }
                Event::Empty(e) => {
                    if root.is_some() && stack.is_empty() {
                        return Err(XmlError::ContentOutsideRoot);
                    }
                    let frame = self.open(&reader, &e)?;
                    close(frame, &mut stack, &mut root);
                }
                Event::End(_) => {
                    let frame = stack
                        .pop()
                        .ok_or_else(|| XmlError::Malformed("unbalanced end tag".into()))?;
                    close(frame, &mut stack, &mut root);
                }
                Event::Text(t) => {
                    let text = t
                        .unescape()
                        .map_err(|e| XmlError::Malformed(e.to_string()))?;
                    match stack.last_mut() {
                        Some(frame) => frame.text.push_str(&text),
                        None if text.trim().is_empty() => {}
                        None => return Err(XmlError::ContentOutsideRoot),
                    }
                }
                Event::CData(c) => {
                    let bytes = c.into_inner();
                    match stack.last_mut() {
                        Some(frame) => frame.text.push_str(&String::from_utf8_lossy(&bytes)),
                        None => return Err(XmlError::ContentOutsideRoot),
                    }
                }
                Event::Eof => break,
                // Declarations, comments, processing instructions, doctype.
                _ => {}
            }
        }

        if let Some(open) = stack.last() {
            return Err(XmlError::UnexpectedEof(open.name.clone()));
        }
        let (name, node) = root.ok_or(XmlError::NoRoot)?;
        Ok(Node::Map(vec![(name, node)]))
    }

    fn open<R>(&self, reader: &NsReader<R>, start: &BytesStart<'_>) -> Result<Frame, XmlError> {
        let (ns, local) = reader.resolve_element(start.name());
        let local = String::from_utf8_lossy(local.as_ref()).into_owned();
        let name = self.qualify(ns, local)?;

        let mut attrs = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| XmlError::Malformed(e.to_string()))?;
            if attr.key.as_namespace_binding().is_some() {
                continue;
            }
            let (ns, local) = reader.resolve_attribute(attr.key);
            let local = String::from_utf8_lossy(local.as_ref()).into_owned();
            let key = self.qualify(ns, local)?;
            let value = attr
                .unescape_value()
                .map_err(|e| XmlError::Malformed(e.to_string()))?
                .into_owned();
            attrs.push((format!("@{key}"), Node::Text(value)));
        }

        Ok(Frame {
            name,
            attrs,
            children: Vec::new(),
            text: String::new(),
        })
    }

    fn qualify(&self, ns: ResolveResult<'_>, local: String) -> Result<String, XmlError> {
        match ns {
            ResolveResult::Unbound => Ok(local),
            ResolveResult::Bound(uri) => {
                let uri = String::from_utf8_lossy(uri.as_ref()).into_owned();
                Ok(match self.namespaces.get(&uri) {
                    Some(Some(prefix)) if !prefix.is_empty() => format!("{prefix}:{local}"),
                    Some(_) => local,
                    None => format!("{uri}:{local}"),
                })
            }
            ResolveResult::Unknown(prefix) => Err(XmlError::UnboundPrefix(
                String::from_utf8_lossy(&prefix).into_owned(),
            )),
        }
    }
}

/// Finish `frame` and attach it to its parent (or make it the root).
fn close(frame: Frame, stack: &mut [Frame], root: &mut Option<(String, Node)>) {
    let mut path: Vec<&str> = stack.iter().map(|f| f.name.as_str()).collect();
    path.push(frame.name.as_str());

    let text = frame.text.trim().to_string();
    let node = if frame.attrs.is_empty() && frame.children.is_empty() {
        if text.is_empty() {
            Node::Null
        } else {
            coerce(&path, text)
        }
    } else {
        let mut entries = frame.attrs;
        entries.extend(frame.children);
        if !text.is_empty() {
            entries.push((XML_CDATA.to_string(), coerce(&path, text)));
        }
        Node::Map(entries)
    };
    drop(path);

    match stack.last_mut() {
        Some(parent) => parent.push_child(frame.name, node),
        None => *root = Some((frame.name, node)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<q:quakeml xmlns="http://quakeml.org/xmlns/bed/1.2" xmlns:q="http://quakeml.org/xmlns/quakeml/1.2">
  <eventParameters publicID="smi:test/params">
    <event publicID="smi:test/event/1">
      <type>earthquake</type>
      <origin publicID="smi:test/origin/1">
        <latitude><value>42.5218</value></latitude>
        <longitude><value>13.3833</value></longitude>
        <depth><value>oops</value></depth>
      </origin>
      <magnitude><mag><value>2.6</value></mag><stationCount>72</stationCount></magnitude>
      <!-- comment -->
    </event>
  </eventParameters>
</q:quakeml>"#;

    #[test]
    fn builds_tree_with_prefixes_and_coercions() {
        let tree = XmlParser::default().parse_tree(DOC).unwrap();
        let event = tree
            .get("q:quakeml")
            .and_then(|q| q.get("eventParameters"))
            .and_then(|p| p.get("event"))
            .expect("event");
        assert_eq!(event.get("@publicID").and_then(Node::as_str), Some("smi:test/event/1"));
        let origin = event.get("origin").unwrap();
        let lat = origin.get("latitude").and_then(|l| l.get("value")).unwrap();
        assert_eq!(lat, &Node::Float(42.5218));
        // Conversion failure keeps the raw string.
        let depth = origin.get("depth").and_then(|d| d.get("value")).unwrap();
        assert_eq!(depth, &Node::Text("oops".into()));
        let count = event
            .get("magnitude")
            .and_then(|m| m.get("stationCount"))
            .unwrap();
        assert_eq!(count, &Node::Int(72));
    }

    #[test]
    fn repeated_children_become_list() {
        let tree = XmlParser::default()
            .parse_tree("<root><a>1</a><a>2</a><b/></root>")
            .unwrap();
        let root = tree.get("root").unwrap();
        assert_eq!(root.get("a").unwrap().items().len(), 2);
        assert_eq!(root.get("b"), Some(&Node::Null));
    }

    #[test]
    fn attributes_and_text_share_a_node() {
        let tree = XmlParser::default()
            .parse_tree(r#"<root><t kind="x">hello</t></root>"#)
            .unwrap();
        let t = tree.get("root").and_then(|r| r.get("t")).unwrap();
        assert_eq!(t.get("@kind").and_then(Node::as_str), Some("x"));
        assert_eq!(t.get("#text").and_then(Node::as_str), Some("hello"));
    }

    #[test]
    fn unknown_namespace_keeps_uri() {
        let tree = XmlParser::default()
            .parse_tree(r#"<x:root xmlns:x="urn:other"><x:a>1</x:a></x:root>"#)
            .unwrap();
        assert!(tree.get("urn:other:root").is_some());
    }

    #[test]
    fn additional_namespaces_override_defaults() {
        let mut extra = NamespaceMap::new();
        extra.insert("urn:other".into(), Some("o".into()));
        let tree = XmlParser::new(Some(&extra))
            .parse_tree(r#"<x:root xmlns:x="urn:other"/>"#)
            .unwrap();
        assert!(tree.get("o:root").is_some());
    }

    #[test]
    fn malformed_inputs_are_rejected() {
        let p = XmlParser::default();
        assert!(matches!(p.parse_tree("NOT XML"), Err(XmlError::ContentOutsideRoot)));
        assert!(matches!(p.parse_tree("\u{0}\u{0}\u{0}"), Err(XmlError::ContentOutsideRoot)));
        assert!(matches!(p.parse_tree(""), Err(XmlError::NoRoot)));
        assert!(matches!(p.parse_tree("<a><b></b>"), Err(XmlError::UnexpectedEof(_))));
        assert!(p.parse_tree("<a></b>").is_err());
        assert!(matches!(p.parse_tree("<z:a/>"), Err(XmlError::UnboundPrefix(_))));
        assert!(matches!(p.parse_tree("<a/><b/>"), Err(XmlError::ContentOutsideRoot)));
    }

    #[test]
    fn missing_structure_is_not_an_error() {
        let p = XmlParser::default();
        assert!(p.parse("<rss><channel/></rss>").unwrap().is_none());
        let no_params = r#"<q:quakeml xmlns:q="http://quakeml.org/xmlns/quakeml/1.2"/>"#;
        assert!(p.parse(no_params).unwrap().is_none());
    }
}
