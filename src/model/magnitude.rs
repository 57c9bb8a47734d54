use crate::consts::{XML_TAG_MAG, XML_TAG_STATIONCOUNT};
use crate::xml::{Element, Node};

#[derive(Debug, Clone, Copy)]
pub struct Magnitude<'a> {
    element: Element<'a>,
}

impl<'a> Magnitude<'a> {
    pub fn new(node: &'a Node) -> Self {
        Self {
            element: Element::new(node),
        }
    }

    pub fn public_id(&self) -> Option<&'a str> {
        self.element.public_id()
    }

    /// Magnitude type, e.g. "ML" or "Mw".
    pub fn type_(&self) -> Option<&'a str> {
        self.element.type_()
    }

    pub fn mag(&self) -> Option<f64> {
        self.element.value_of(XML_TAG_MAG).and_then(Node::as_f64)
    }

    /// Number of stations used for this magnitude computation.
    pub fn station_count(&self) -> Option<i64> {
        self.element
            .attribute_with_text(&[XML_TAG_STATIONCOUNT])
            .and_then(Node::as_i64)
    }
}
