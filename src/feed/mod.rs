// src/feed/mod.rs
//! Fetch/parse pipeline: one HTTP request, body decoding, XML parsing, entry
//! construction and filtering.

pub mod entry;
pub mod filter;
pub mod transport;

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, histogram};
use once_cell::sync::OnceCell;
use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::config::FeedConfig;
use crate::consts::DEFAULT_REQUEST_TIMEOUT_SECS;
use crate::distance::Coordinates;
use crate::model::{Event, EventParameters};
use crate::xml::{NamespaceMap, XmlParser};
use entry::FeedEntry;
use filter::EntryFilter;
use transport::{FeedRequest, Transport};

/// Outcome of one cycle as reported to status subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpdateStatus {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "OK_NO_DATA")]
    OkNoData,
    #[serde(rename = "ERROR")]
    Error,
}

impl UpdateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateStatus::Ok => "OK",
            UpdateStatus::OkNoData => "OK_NO_DATA",
            UpdateStatus::Error => "ERROR",
        }
    }
}

impl fmt::Display for UpdateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a single fetch. `Ok(None)` is well-formed XML without the
/// QuakeML containers.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchResult {
    Ok(Option<EventParameters>),
    OkNoData,
    Error,
}

/// Builds the domain entry for each parsed event.
pub type EntryFactory<E> = Arc<dyn Fn(Coordinates, Event) -> E + Send + Sync>;

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("quakeml_fetch_total", "Feed fetches attempted.");
        describe_counter!(
            "quakeml_fetch_errors_total",
            "Fetches that failed at transport or HTTP status level."
        );
        describe_counter!(
            "quakeml_parse_errors_total",
            "Responses whose body was not well-formed XML."
        );
        describe_histogram!("quakeml_parse_ms", "XML parse time in milliseconds.");
        describe_counter!("quakeml_entries_created_total", "Entities created.");
        describe_counter!("quakeml_entries_updated_total", "Entities updated.");
        describe_counter!("quakeml_entries_removed_total", "Entities removed.");
        describe_gauge!("quakeml_entries_tracked", "Entries currently held by the manager.");
        describe_counter!("quakeml_cycles_total", "Scheduled reconciliation cycles run.");
        describe_gauge!("quakeml_last_cycle_ts", "Unix ts of the last scheduled cycle.");
    });
}

pub struct QuakeMlFeed<E = FeedEntry> {
    transport: Arc<dyn Transport>,
    home: Coordinates,
    url: String,
    method: Method,
    headers: Vec<(String, String)>,
    params: Vec<(String, String)>,
    timeout: Duration,
    filter: EntryFilter,
    parser: XmlParser,
    factory: EntryFactory<E>,
    last_timestamp: Option<DateTime<Utc>>,
}

impl QuakeMlFeed<FeedEntry> {
    pub fn new(transport: Arc<dyn Transport>, home: Coordinates, url: impl Into<String>) -> Self {
        Self::with_factory(transport, home, url, Arc::new(FeedEntry::new))
    }

    pub fn from_config(transport: Arc<dyn Transport>, cfg: &FeedConfig) -> Self {
        Self::new(transport, cfg.home, cfg.url.clone())
            .with_timeout(Duration::from_secs(cfg.request_timeout_secs))
            .with_filter(EntryFilter::new(
                cfg.filter_radius,
                cfg.filter_minimum_magnitude,
            ))
            .with_namespaces(&cfg.namespace_map())
    }
}

impl<E: AsRef<FeedEntry>> QuakeMlFeed<E> {
    pub fn with_factory(
        transport: Arc<dyn Transport>,
        home: Coordinates,
        url: impl Into<String>,
        factory: EntryFactory<E>,
    ) -> Self {
        Self {
            transport,
            home,
            url: url.into(),
            method: Method::GET,
            headers: Vec::new(),
            params: Vec::new(),
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            filter: EntryFilter::default(),
            parser: XmlParser::default(),
            factory,
            last_timestamp: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_filter(mut self, filter: EntryFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Extra namespace declarations, merged over the QuakeML defaults.
    pub fn with_namespaces(mut self, namespaces: &NamespaceMap) -> Self {
        self.parser = XmlParser::new(Some(namespaces));
        self
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    pub fn home(&self) -> Coordinates {
        self.home
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn filter(&self) -> &EntryFilter {
        &self.filter
    }

    /// Newest creation time among the entries of the last successful fetch.
    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.last_timestamp
    }

    /// Fetch, build entries, filter.
    pub async fn update(&mut self) -> (UpdateStatus, Option<Vec<E>>) {
        match self.fetch().await {
            FetchResult::Ok(Some(params)) => {
                let entries: Vec<E> = params
                    .events()
                    .into_iter()
                    .map(|event| (self.factory)(self.home, event))
                    .collect();
                let filtered = self.filter.apply(entries);
                self.last_timestamp = extract_last_timestamp(&filtered);
                (UpdateStatus::Ok, Some(filtered))
            }
            FetchResult::Ok(None) => (UpdateStatus::Ok, None),
            FetchResult::OkNoData => (UpdateStatus::OkNoData, None),
            FetchResult::Error => {
                self.last_timestamp = None;
                (UpdateStatus::Error, None)
            }
        }
    }

    /// One request plus decode and parse. Never fails; failures map onto
    /// the three outcomes.
    pub async fn fetch(&self) -> FetchResult {
        ensure_metrics_described();
        counter!("quakeml_fetch_total").increment(1);

        let req = FeedRequest {
            method: self.method.clone(),
            url: self.url.clone(),
            headers: self.headers.clone(),
            params: self.params.clone(),
            timeout: self.timeout,
        };
        let resp = match self.transport.request(&req).await {
            Ok(resp) => resp,
            Err(e) => {
                tracing::warn!(error = ?e, url = %self.url, "requesting feed failed");
                counter!("quakeml_fetch_errors_total").increment(1);
                return FetchResult::Error;
            }
        };
        if !resp.is_success() {
            tracing::warn!(status = resp.status, url = %self.url, "feed returned non-success status");
            counter!("quakeml_fetch_errors_total").increment(1);
            return FetchResult::Error;
        }

        let Some(text) = decode_body(&resp.body) else {
            tracing::debug!(url = %self.url, "empty feed body");
            return FetchResult::OkNoData;
        };

        let t0 = Instant::now();
        let parsed = self.parser.parse(&text);
        histogram!("quakeml_parse_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        match parsed {
            Ok(params) => FetchResult::Ok(params),
            Err(e) => {
                tracing::warn!(error = %e, url = %self.url, "parsing feed failed");
                counter!("quakeml_parse_errors_total").increment(1);
                FetchResult::OkNoData
            }
        }
    }
}

impl<E> fmt::Display for QuakeMlFeed<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "QuakeMlFeed(home=({:?}, {:?}), url={}, radius={:?}, magnitude={:?})",
            self.home.latitude,
            self.home.longitude,
            self.url,
            self.filter.radius,
            self.filter.minimum_magnitude
        )
    }
}

/// Decode a response body, honouring a byte-order mark. `None` when empty.
pub fn decode_body(raw: &[u8]) -> Option<String> {
    if raw.is_empty() {
        return None;
    }
    let text = if let Some(rest) = raw.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        String::from_utf8_lossy(rest).into_owned()
    } else if let Some(rest) = raw.strip_prefix(&[0xFF, 0xFE]) {
        decode_utf16(rest, u16::from_le_bytes)
    } else if let Some(rest) = raw.strip_prefix(&[0xFE, 0xFF]) {
        decode_utf16(rest, u16::from_be_bytes)
    } else {
        match std::str::from_utf8(raw) {
            Ok(s) => s.to_string(),
            Err(e) => {
                tracing::debug!(error = %e, "body is not valid utf-8, decoding lossily");
                String::from_utf8_lossy(raw).into_owned()
            }
        }
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn decode_utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> String {
    let chunks = bytes.chunks_exact(2);
    if !chunks.remainder().is_empty() {
        tracing::debug!(len = bytes.len(), "utf-16 body has odd length, dropping trailing byte");
    }
    let units: Vec<u16> = chunks.map(|pair| unit([pair[0], pair[1]])).collect();
    String::from_utf16_lossy(&units)
}

fn extract_last_timestamp<E: AsRef<FeedEntry>>(entries: &[E]) -> Option<DateTime<Utc>> {
    let last = entries
        .iter()
        .filter_map(|e| e.as_ref().creation_info().and_then(|ci| ci.creation_time()))
        .max();
    if let Some(ts) = last {
        tracing::debug!(%ts, "last timestamp");
    }
    last
}
