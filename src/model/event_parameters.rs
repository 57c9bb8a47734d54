use crate::consts::XML_TAG_EVENT;
use crate::xml::{Element, Node};

use super::Event;

/// The `eventParameters` container of a QuakeML document.
#[derive(Debug, Clone, PartialEq)]
pub struct EventParameters {
    node: Node,
}

impl EventParameters {
    pub fn new(node: Node) -> Self {
        Self { node }
    }

    pub fn public_id(&self) -> Option<&str> {
        Element::new(&self.node).public_id()
    }

    /// Events in document order. A single `<event>` is not a list in the
    /// tree; both shapes are handled.
    pub fn events(&self) -> Vec<Event> {
        Element::new(&self.node)
            .attribute(&[XML_TAG_EVENT])
            .map(|events| events.items().into_iter().cloned().map(Event::new).collect())
            .unwrap_or_default()
    }
}
