use crate::consts::{
    XML_TAG_CREATIONINFO, XML_TAG_DESCRIPTION, XML_TAG_MAGNITUDE, XML_TAG_ORIGIN,
};
use crate::xml::{Element, Node};

use super::{CreationInfo, Description, Magnitude, Origin};

/// One seismic event. Owns its subtree; the typed children borrow from it.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    node: Node,
}

impl Event {
    pub fn new(node: Node) -> Self {
        Self { node }
    }

    fn element(&self) -> Element<'_> {
        Element::new(&self.node)
    }

    pub fn public_id(&self) -> Option<&str> {
        self.element().public_id()
    }

    pub fn type_(&self) -> Option<&str> {
        self.element().type_()
    }

    pub fn description(&self) -> Option<Description<'_>> {
        self.element()
            .attribute(&[XML_TAG_DESCRIPTION])
            .map(Description::new)
    }

    /// First defined origin.
    pub fn origin(&self) -> Option<Origin<'_>> {
        self.origins().into_iter().next()
    }

    pub fn origins(&self) -> Vec<Origin<'_>> {
        self.element()
            .attribute(&[XML_TAG_ORIGIN])
            .map(|n| n.items().into_iter().map(Origin::new).collect())
            .unwrap_or_default()
    }

    /// First defined magnitude.
    pub fn magnitude(&self) -> Option<Magnitude<'_>> {
        self.magnitudes().into_iter().next()
    }

    pub fn magnitudes(&self) -> Vec<Magnitude<'_>> {
        self.element()
            .attribute(&[XML_TAG_MAGNITUDE])
            .map(|n| n.items().into_iter().map(Magnitude::new).collect())
            .unwrap_or_default()
    }

    pub fn creation_info(&self) -> Option<CreationInfo<'_>> {
        self.element()
            .attribute(&[XML_TAG_CREATIONINFO])
            .map(CreationInfo::new)
    }
}
