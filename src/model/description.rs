use crate::consts::XML_TAG_TEXT;
use crate::xml::{Element, Node};

/// Event description: an optional category (`type`) and free text.
#[derive(Debug, Clone, Copy)]
pub struct Description<'a> {
    element: Element<'a>,
}

impl<'a> Description<'a> {
    pub fn new(node: &'a Node) -> Self {
        Self {
            element: Element::new(node),
        }
    }

    pub fn text(&self) -> Option<&'a str> {
        self.element.text(&[XML_TAG_TEXT])
    }

    pub fn type_(&self) -> Option<&'a str> {
        self.element.type_()
    }
}
