// src/manager.rs
//! # Feed reconciliation
//! Keeps the set of known entries keyed by external id and turns every fetch
//! into create/update/remove notifications.
//!
//! Policy per cycle:
//! - OK with data: created = new − old, updated = new ∩ old (always, no
//!   equality check), removed = old − new.
//! - OK without data (empty body, garbled XML, missing containers): nothing
//!   changes.
//! - ERROR: everything held is removed.

use std::collections::{HashMap, HashSet};
use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::{counter, gauge};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::feed::entry::FeedEntry;
use crate::feed::{ensure_metrics_described, QuakeMlFeed, UpdateStatus};

/// Snapshot of one reconciliation cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub status: UpdateStatus,
    pub last_update: DateTime<Utc>,
    pub last_update_successful: Option<DateTime<Utc>>,
    pub last_timestamp: Option<DateTime<Utc>>,
    pub total: usize,
    pub created: usize,
    pub updated: usize,
    pub removed: usize,
}

impl fmt::Display for StatusUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StatusUpdate({}@{})", self.status, self.last_update)
    }
}

/// Host callbacks. Each one is awaited before the next is issued.
#[async_trait]
pub trait EntityHandler: Send + Sync {
    async fn create(&self, external_id: &str);
    async fn update(&self, external_id: &str);
    async fn remove(&self, external_id: &str);
    /// Called once at the end of every cycle.
    async fn status(&self, _status: &StatusUpdate) {}
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntityChange {
    Created(String),
    Updated(String),
    Removed(String),
    Status(StatusUpdate),
}

/// Forwards every callback into a channel. A closed receiver is ignored.
#[derive(Debug, Clone)]
pub struct ChannelHandler {
    tx: mpsc::UnboundedSender<EntityChange>,
}

impl ChannelHandler {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<EntityChange>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, change: EntityChange) {
        if self.tx.send(change).is_err() {
            tracing::trace!("entity change receiver dropped");
        }
    }
}

#[async_trait]
impl EntityHandler for ChannelHandler {
    async fn create(&self, external_id: &str) {
        self.send(EntityChange::Created(external_id.to_string()));
    }
    async fn update(&self, external_id: &str) {
        self.send(EntityChange::Updated(external_id.to_string()));
    }
    async fn remove(&self, external_id: &str) {
        self.send(EntityChange::Removed(external_id.to_string()));
    }
    async fn status(&self, status: &StatusUpdate) {
        self.send(EntityChange::Status(status.clone()));
    }
}

pub struct FeedManager<E = FeedEntry> {
    feed: QuakeMlFeed<E>,
    handler: Box<dyn EntityHandler>,
    entries: HashMap<String, E>,
    // Filter order of the last successful cycle; drives removal order.
    order: Vec<String>,
    last_update: Option<DateTime<Utc>>,
    last_update_successful: Option<DateTime<Utc>>,
}

impl<E: AsRef<FeedEntry>> FeedManager<E> {
    pub fn new(feed: QuakeMlFeed<E>, handler: Box<dyn EntityHandler>) -> Self {
        Self {
            feed,
            handler,
            entries: HashMap::new(),
            order: Vec::new(),
            last_update: None,
            last_update_successful: None,
        }
    }

    pub fn feed(&self) -> &QuakeMlFeed<E> {
        &self.feed
    }

    pub fn feed_entries(&self) -> &HashMap<String, E> {
        &self.entries
    }

    pub fn feed_entry(&self, external_id: &str) -> Option<&E> {
        self.entries.get(external_id)
    }

    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.last_update
    }

    pub fn last_update_successful(&self) -> Option<DateTime<Utc>> {
        self.last_update_successful
    }

    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.feed.last_timestamp()
    }

    /// Run one reconciliation cycle: fetch, filter, diff, notify.
    pub async fn update(&mut self) -> StatusUpdate {
        ensure_metrics_described();
        let (status, entries) = self.feed.update().await;
        let now = Utc::now();
        self.last_update = Some(now);

        let (mut created, mut updated, mut removed) = (0, 0, 0);
        match (status, entries) {
            (UpdateStatus::Ok, Some(entries)) => {
                (created, updated, removed) = self.reconcile(entries).await;
                self.last_update_successful = Some(now);
            }
            (UpdateStatus::Ok, None) => {
                tracing::warn!(feed = %self.feed, "update successful, but no events extracted");
                self.last_update_successful = Some(now);
            }
            (UpdateStatus::OkNoData, _) => {
                tracing::debug!(feed = %self.feed, "update successful, but no data received");
                self.last_update_successful = Some(now);
            }
            (UpdateStatus::Error, _) => {
                tracing::warn!(feed = %self.feed, "update not successful, removing all entries");
                let gone = std::mem::take(&mut self.order);
                self.entries.clear();
                removed = self.notify_removed(&gone).await;
            }
        }

        gauge!("quakeml_entries_tracked").set(self.entries.len() as f64);
        let update = StatusUpdate {
            status,
            last_update: now,
            last_update_successful: self.last_update_successful,
            last_timestamp: self.feed.last_timestamp(),
            total: self.entries.len(),
            created,
            updated,
            removed,
        };
        tracing::info!(
            status = %update.status,
            total = update.total,
            created,
            updated,
            removed,
            "feed cycle finished"
        );
        self.handler.status(&update).await;
        update
    }

    /// Diff `fresh` against the held entries and fire the callbacks.
    /// Returns (created, updated, removed).
    async fn reconcile(&mut self, fresh: Vec<E>) -> (usize, usize, usize) {
        // Duplicate ids collapse: last snapshot wins, first position kept.
        let mut new_order: Vec<String> = Vec::with_capacity(fresh.len());
        let mut new_entries: HashMap<String, E> = HashMap::with_capacity(fresh.len());
        for entry in fresh {
            let Some(id) = entry.as_ref().external_id() else {
                tracing::warn!("dropping entry without external id");
                continue;
            };
            if new_entries.insert(id.clone(), entry).is_some() {
                tracing::debug!(external_id = %id, "duplicate external id in feed");
            } else {
                new_order.push(id);
            }
        }

        let old_ids: HashSet<&str> = self.order.iter().map(String::as_str).collect();
        let new_ids: HashSet<&str> = new_order.iter().map(String::as_str).collect();
        let to_create: Vec<String> = new_order
            .iter()
            .filter(|id| !old_ids.contains(id.as_str()))
            .cloned()
            .collect();
        let to_update: Vec<String> = new_order
            .iter()
            .filter(|id| old_ids.contains(id.as_str()))
            .cloned()
            .collect();
        let to_remove: Vec<String> = self
            .order
            .iter()
            .filter(|id| !new_ids.contains(id.as_str()))
            .cloned()
            .collect();
        drop(old_ids);
        drop(new_ids);

        // The new snapshot replaces the mapping wholesale: created and
        // updated ids take their fresh values, removed ids drop out.
        self.entries = new_entries;
        self.order = new_order;

        for id in &to_create {
            self.handler.create(id).await;
        }
        counter!("quakeml_entries_created_total").increment(to_create.len() as u64);
        for id in &to_update {
            self.handler.update(id).await;
        }
        counter!("quakeml_entries_updated_total").increment(to_update.len() as u64);
        let removed = self.notify_removed(&to_remove).await;

        (to_create.len(), to_update.len(), removed)
    }

    async fn notify_removed(&self, ids: &[String]) -> usize {
        for id in ids {
            self.handler.remove(id).await;
        }
        counter!("quakeml_entries_removed_total").increment(ids.len() as u64);
        ids.len()
    }
}

impl<E> fmt::Display for FeedManager<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FeedManager(feed={})", self.feed)
    }
}
