// src/feed/entry.rs
use std::fmt;

use regex::Regex;
use sha2::{Digest, Sha256};

use crate::distance::{self, Coordinates};
use crate::model::{CreationInfo, Event, Magnitude, Origin};

/// Named group `search_in_external_id` extracts.
pub const CUSTOM_ATTRIBUTE: &str = "custom_attribute";

/// One QuakeML event as seen from the configured home location.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedEntry {
    home: Coordinates,
    event: Event,
    attribution: Option<String>,
}

impl FeedEntry {
    pub fn new(home: Coordinates, event: Event) -> Self {
        Self {
            home,
            event,
            attribution: None,
        }
    }

    pub fn with_attribution(mut self, attribution: impl Into<String>) -> Self {
        self.attribution = Some(attribution.into());
        self
    }

    pub fn event(&self) -> &Event {
        &self.event
    }

    pub fn attribution(&self) -> Option<&str> {
        self.attribution.as_deref()
    }

    /// Coordinates of the canonical origin.
    pub fn coordinates(&self) -> Option<Coordinates> {
        let origin = self.origin()?;
        origin
            .geometry()
            .as_ref()
            .and_then(distance::extract_coordinates)
    }

    /// The event's public id, falling back to a digest of its coordinates.
    ///
    /// The fallback is `geo:` + hex SHA-256 (first 16 bytes) of
    /// `"{lat:.6},{lon:.6}"`. It is stable across builds, but two events at
    /// the same spot collapse into one id.
    pub fn external_id(&self) -> Option<String> {
        if let Some(id) = self.event.public_id() {
            return Some(id.to_string());
        }
        self.coordinates().map(coordinates_id)
    }

    /// Extract the `custom_attribute` group of `pattern` from the external id.
    pub fn search_in_external_id(&self, pattern: &Regex) -> Option<String> {
        let id = self.external_id()?;
        pattern
            .captures(&id)
            .and_then(|c| c.name(CUSTOM_ATTRIBUTE))
            .map(|m| m.as_str().to_string())
    }

    /// Distance in km to home; infinite without coordinates.
    pub fn distance_to_home(&self) -> f64 {
        self.origin()
            .and_then(|o| o.geometry())
            .map(|g| distance::distance_to_geometry(self.home, &g))
            .unwrap_or(f64::INFINITY)
    }

    pub fn type_(&self) -> Option<&str> {
        self.event.type_()
    }

    /// `"<Category>: <text>"`, or just the text when no category is given.
    pub fn description(&self) -> Option<String> {
        let description = self.event.description()?;
        let text = description.text().unwrap_or_default();
        match description.type_() {
            Some(category) => Some(format!("{}: {}", capitalize(category), text)),
            None => description.text().map(str::to_string),
        }
    }

    pub fn origin(&self) -> Option<Origin<'_>> {
        self.event.origin()
    }

    pub fn magnitude(&self) -> Option<Magnitude<'_>> {
        self.event.magnitude()
    }

    pub fn creation_info(&self) -> Option<CreationInfo<'_>> {
        self.event.creation_info()
    }
}

impl AsRef<FeedEntry> for FeedEntry {
    fn as_ref(&self) -> &FeedEntry {
        self
    }
}

impl fmt::Display for FeedEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FeedEntry(id={})",
            self.external_id().as_deref().unwrap_or("-")
        )
    }
}

fn coordinates_id(c: Coordinates) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{:.6},{:.6}", c.latitude, c.longitude).as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(36);
    out.push_str("geo:");
    for b in digest.iter().take(16) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

fn capitalize(s: &str) -> String {
    let lower = s.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
