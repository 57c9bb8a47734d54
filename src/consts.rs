// src/consts.rs
//! Tag names and defaults shared by the parser, the domain model and the feed.

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 300;

pub const XML_ATTR_PUBLICID: &str = "@publicID";
pub const XML_CDATA: &str = "#text";

pub const XML_TAG_Q_QUAKEML: &str = "q:quakeml";
pub const XML_TAG_AGENCYID: &str = "agencyID";
pub const XML_TAG_AUTHOR: &str = "author";
pub const XML_TAG_CREATIONINFO: &str = "creationInfo";
pub const XML_TAG_CREATIONTIME: &str = "creationTime";
pub const XML_TAG_DEPTH: &str = "depth";
pub const XML_TAG_DEPTHTYPE: &str = "depthType";
pub const XML_TAG_DESCRIPTION: &str = "description";
pub const XML_TAG_EVENT: &str = "event";
pub const XML_TAG_EVALUATIONMODE: &str = "evaluationMode";
pub const XML_TAG_EVALUATIONSTATUS: &str = "evaluationStatus";
pub const XML_TAG_EVENTPARAMETERS: &str = "eventParameters";
pub const XML_TAG_LATITUDE: &str = "latitude";
pub const XML_TAG_LONGITUDE: &str = "longitude";
pub const XML_TAG_MAG: &str = "mag";
pub const XML_TAG_MAGNITUDE: &str = "magnitude";
pub const XML_TAG_ORIGIN: &str = "origin";
pub const XML_TAG_STATIONCOUNT: &str = "stationCount";
pub const XML_TAG_TEXT: &str = "text";
pub const XML_TAG_TIME: &str = "time";
pub const XML_TAG_TYPE: &str = "type";
pub const XML_TAG_VALUE: &str = "value";

pub const NS_QUAKEML_BED: &str = "http://quakeml.org/xmlns/bed/1.2";
pub const NS_QUAKEML: &str = "http://quakeml.org/xmlns/quakeml/1.2";
