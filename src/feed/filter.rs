// src/feed/filter.rs
use serde::{Deserialize, Serialize};

use super::entry::FeedEntry;

/// Radius and magnitude thresholds applied after every fetch.
/// Entries without coordinates are always dropped. `Some(0.0)` is an active
/// threshold; only `None` disables a filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EntryFilter {
    /// Kilometers from home.
    pub radius: Option<f64>,
    pub minimum_magnitude: Option<f64>,
}

impl EntryFilter {
    pub fn new(radius: Option<f64>, minimum_magnitude: Option<f64>) -> Self {
        Self {
            radius,
            minimum_magnitude,
        }
    }

    /// Keep entries that pass every active filter, in input order.
    pub fn apply<E: AsRef<FeedEntry>>(&self, entries: Vec<E>) -> Vec<E> {
        let before = entries.len();
        let kept: Vec<E> = entries
            .into_iter()
            .filter(|e| self.accepts(e.as_ref()))
            .collect();
        tracing::debug!(before, after = kept.len(), "entries filtered");
        kept
    }

    pub fn accepts(&self, entry: &FeedEntry) -> bool {
        if entry.coordinates().is_none() {
            return false;
        }
        if let Some(radius) = self.radius {
            if entry.distance_to_home() > radius {
                return false;
            }
        }
        if let Some(minimum) = self.minimum_magnitude {
            match entry.magnitude().and_then(|m| m.mag()) {
                Some(mag) if mag >= minimum => {}
                _ => return false,
            }
        }
        true
    }
}
