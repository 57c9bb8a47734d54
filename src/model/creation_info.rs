use chrono::{DateTime, Utc};

use crate::consts::{XML_TAG_AGENCYID, XML_TAG_AUTHOR, XML_TAG_CREATIONTIME};
use crate::xml::{Element, Node};

/// Creation metadata of a resource.
#[derive(Debug, Clone, Copy)]
pub struct CreationInfo<'a> {
    element: Element<'a>,
}

impl<'a> CreationInfo<'a> {
    pub fn new(node: &'a Node) -> Self {
        Self {
            element: Element::new(node),
        }
    }

    /// Designation of the agency that published the resource.
    pub fn agency_id(&self) -> Option<&'a str> {
        self.element.text(&[XML_TAG_AGENCYID])
    }

    pub fn author(&self) -> Option<&'a str> {
        self.element.text(&[XML_TAG_AUTHOR])
    }

    /// `None` when missing or when the text could not be read as a timestamp.
    pub fn creation_time(&self) -> Option<DateTime<Utc>> {
        self.element
            .attribute_with_text(&[XML_TAG_CREATIONTIME])
            .and_then(Node::as_datetime)
    }
}
