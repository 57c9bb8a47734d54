use chrono::{DateTime, Utc};

use crate::consts::{
    XML_TAG_DEPTH, XML_TAG_DEPTHTYPE, XML_TAG_EVALUATIONMODE, XML_TAG_EVALUATIONSTATUS,
    XML_TAG_LATITUDE, XML_TAG_LONGITUDE, XML_TAG_TIME,
};
use crate::distance::{Geometry, Point};
use crate::xml::{Element, Node};

/// Focal time and geographical location of an earthquake hypocenter.
#[derive(Debug, Clone, Copy)]
pub struct Origin<'a> {
    element: Element<'a>,
}

impl<'a> Origin<'a> {
    pub fn new(node: &'a Node) -> Self {
        Self {
            element: Element::new(node),
        }
    }

    pub fn public_id(&self) -> Option<&'a str> {
        self.element.public_id()
    }

    pub fn type_(&self) -> Option<&'a str> {
        self.element.type_()
    }

    pub fn latitude(&self) -> Option<f64> {
        self.element.value_of(XML_TAG_LATITUDE).and_then(Node::as_f64)
    }

    pub fn longitude(&self) -> Option<f64> {
        self.element.value_of(XML_TAG_LONGITUDE).and_then(Node::as_f64)
    }

    /// Depth with respect to the nominal sea level, as published (meters in
    /// most feeds). Integer and fractional values both come back as `f64`.
    pub fn depth(&self) -> Option<f64> {
        self.element.value_of(XML_TAG_DEPTH).and_then(Node::as_f64)
    }

    pub fn depth_type(&self) -> Option<&'a str> {
        self.element.text(&[XML_TAG_DEPTHTYPE])
    }

    pub fn time(&self) -> Option<DateTime<Utc>> {
        self.element.value_of(XML_TAG_TIME).and_then(Node::as_datetime)
    }

    pub fn evaluation_mode(&self) -> Option<&'a str> {
        self.element.text(&[XML_TAG_EVALUATIONMODE])
    }

    pub fn evaluation_status(&self) -> Option<&'a str> {
        self.element.text(&[XML_TAG_EVALUATIONSTATUS])
    }

    /// Point geometry when both coordinates are present.
    pub fn geometry(&self) -> Option<Geometry> {
        Some(Geometry::Point(Point::new(self.latitude()?, self.longitude()?)))
    }
}
