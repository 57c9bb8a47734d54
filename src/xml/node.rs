// src/xml/node.rs
//! Generic ordered-key tree produced by the XML builder, plus the typed
//! `Element` accessor every domain type is built on.

use chrono::{DateTime, Utc};

use crate::consts::{XML_ATTR_PUBLICID, XML_CDATA, XML_TAG_TYPE};

/// One node of the parsed document.
///
/// Leaf text is coerced while the tree is built (see `xml::coercion_for`), so
/// numeric and timestamp fields arrive here already typed.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Null,
    Text(String),
    Float(f64),
    Int(i64),
    Time(DateTime<Utc>),
    Map(Vec<(String, Node)>),
    List(Vec<Node>),
}

impl Node {
    /// Child lookup on a map node; `None` for every other shape.
    pub fn get(&self, key: &str) -> Option<&Node> {
        match self {
            Node::Map(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// `Null` and blank text count as absent.
    pub fn is_empty(&self) -> bool {
        match self {
            Node::Null => true,
            Node::Text(s) => s.is_empty(),
            Node::Map(entries) => entries.is_empty(),
            Node::List(items) => items.is_empty(),
            _ => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Node::Float(v) => Some(*v),
            Node::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Node::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Node::Time(t) => Some(*t),
            _ => None,
        }
    }

    /// A single child and a repeated child look different in the tree;
    /// this flattens both into a slice-like list.
    pub fn items(&self) -> Vec<&Node> {
        match self {
            Node::List(items) => items.iter().collect(),
            Node::Null => Vec::new(),
            other => vec![other],
        }
    }
}

/// Read-only accessor over a map node.
#[derive(Debug, Clone, Copy)]
pub struct Element<'a> {
    node: &'a Node,
}

impl<'a> Element<'a> {
    pub fn new(node: &'a Node) -> Self {
        Self { node }
    }

    pub fn node(&self) -> &'a Node {
        self.node
    }

    /// First present, non-empty value among the candidate keys.
    pub fn attribute(&self, names: &[&str]) -> Option<&'a Node> {
        names
            .iter()
            .filter_map(|name| self.node.get(name))
            .find(|value| !value.is_empty())
    }

    /// Like `attribute`, but `<tag attr="x">Value</tag>` yields `Value`.
    pub fn attribute_with_text(&self, names: &[&str]) -> Option<&'a Node> {
        let value = self.attribute(names)?;
        Some(value.get(XML_CDATA).unwrap_or(value))
    }

    pub fn text(&self, names: &[&str]) -> Option<&'a str> {
        self.attribute_with_text(names).and_then(Node::as_str)
    }

    /// `<latitude><value>42.5</value></latitude>` style lookups.
    pub fn value_of(&self, name: &str) -> Option<&'a Node> {
        self.attribute(&[name])?
            .get(crate::consts::XML_TAG_VALUE)
            .filter(|v| !v.is_empty())
    }

    pub fn public_id(&self) -> Option<&'a str> {
        self.attribute(&[XML_ATTR_PUBLICID]).and_then(Node::as_str)
    }

    pub fn type_(&self) -> Option<&'a str> {
        self.text(&[XML_TAG_TYPE])
    }
}
