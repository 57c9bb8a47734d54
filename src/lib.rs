// src/lib.rs
//! Async QuakeML feed client.
//!
//! Fetches a QuakeML document, parses it into typed events, filters them by
//! distance and magnitude, and reconciles the result against the previous
//! poll so the host sees create/update/remove notifications exactly once per
//! change.

pub mod config;
pub mod consts;
pub mod distance;
pub mod feed;
pub mod manager;
pub mod model;
pub mod scheduler;
pub mod xml;

// ---- Re-exports for stable public API ----
pub use crate::config::FeedConfig;
pub use crate::distance::Coordinates;
pub use crate::feed::entry::FeedEntry;
pub use crate::feed::filter::EntryFilter;
pub use crate::feed::transport::{FeedRequest, RawResponse, ReqwestTransport, Transport};
pub use crate::feed::{EntryFactory, FetchResult, QuakeMlFeed, UpdateStatus};
pub use crate::manager::{ChannelHandler, EntityChange, EntityHandler, FeedManager, StatusUpdate};
