// tests/feed_update.rs
mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use chrono::{TimeZone, Utc};
use common::{dead_url, FixtureServer};
use quakeml_feed::{
    Coordinates, EntryFilter, FeedEntry, FetchResult, QuakeMlFeed, ReqwestTransport,
    UpdateStatus,
};

fn feed(url: &str, home: Coordinates) -> QuakeMlFeed {
    QuakeMlFeed::new(Arc::new(ReqwestTransport::new()), home, url)
}

#[tokio::test]
async fn update_ok_exposes_full_event() {
    let server = FixtureServer::start().await;
    server.respond_fixture("generic_feed_1.xml");
    let mut feed = feed(&server.url, Coordinates::new(-31.0, 151.0));
    assert_eq!(
        feed.to_string(),
        format!(
            "QuakeMlFeed(home=(-31.0, 151.0), url={}, radius=None, magnitude=None)",
            server.url
        )
    );

    let (status, entries) = feed.update().await;
    assert_eq!(status, UpdateStatus::Ok);
    let entries = entries.expect("entries");
    assert_eq!(entries.len(), 1);

    let e = &entries[0];
    assert_eq!(
        e.external_id().as_deref(),
        Some("smi:webservices.ingv.it/fdsnws/event/1/query?eventId=30116321")
    );
    assert_eq!(e.description().as_deref(), Some("Region name: 4 km S Campotosto (AQ)"));
    assert_eq!(e.type_(), Some("earthquake"));

    let origin = e.origin().expect("origin");
    assert_eq!(
        origin.public_id(),
        Some("smi:webservices.ingv.it/fdsnws/event/1/query?originId=101595191")
    );
    assert_eq!(e.coordinates(), Some(Coordinates::new(42.5218, 13.3833)));
    assert_eq!(origin.type_(), Some("hypocenter"));
    assert_eq!(origin.depth(), Some(14500.0));
    assert_eq!(origin.depth_type(), Some("from location"));
    assert_eq!(
        origin.time(),
        Some(Utc.with_ymd_and_hms(2022, 3, 1, 22, 53, 55).unwrap() + chrono::Duration::milliseconds(680))
    );
    assert_eq!(origin.evaluation_status(), Some("reviewed"));
    assert_eq!(origin.evaluation_mode(), Some("manual"));
    assert!((e.distance_to_home() - 16074.6).abs() < 0.1);

    let magnitude = e.magnitude().expect("magnitude");
    assert_eq!(
        magnitude.public_id(),
        Some("smi:webservices.ingv.it/fdsnws/event/1/query?magnitudeId=108867501")
    );
    assert_eq!(magnitude.type_(), Some("ML"));
    assert_eq!(magnitude.mag(), Some(2.6));
    assert_eq!(magnitude.station_count(), Some(72));

    let ci = e.creation_info().expect("creation info");
    assert_eq!(ci.agency_id(), Some("INGV"));
    assert_eq!(ci.author(), Some("hew10_mole#MOD_EQASSEMBLE"));
    assert_eq!(
        ci.creation_time(),
        Some(Utc.with_ymd_and_hms(2022, 3, 1, 22, 54, 13).unwrap())
    );
    assert_eq!(feed.last_timestamp(), ci.creation_time());
}

#[tokio::test]
async fn fractional_depth_stays_fractional() {
    let server = FixtureServer::start().await;
    server.respond_fixture("generic_feed_5.xml");
    let mut feed = feed(&server.url, Coordinates::new(-31.0, 151.0));
    let (_, entries) = feed.update().await;
    let entries = entries.unwrap();
    assert_eq!(entries[0].origin().and_then(|o| o.depth()), Some(14500.25));
}

#[tokio::test]
async fn edge_cases_degrade_per_field() {
    let server = FixtureServer::start().await;
    server.respond_fixture("generic_feed_2.xml");
    let mut feed = feed(&server.url, Coordinates::new(-31.0, 151.0));
    let (status, entries) = feed.update().await;
    assert_eq!(status, UpdateStatus::Ok);
    // The fourth event has no origin and is filtered out.
    let entries = entries.unwrap();
    assert_eq!(entries.len(), 3);

    let first = &entries[0];
    let origin = first.origin().unwrap();
    assert_eq!(
        origin.public_id(),
        Some("smi:webservices.ingv.it/fdsnws/event/1/query?originId=101595192")
    );
    assert_eq!(first.coordinates(), Some(Coordinates::new(42.5218, 13.3833)));
    assert!(origin.depth().is_none());
    assert!(origin.depth_type().is_none());
    assert!(origin.time().is_none());
    assert!(first.magnitude().is_none());
    assert!(first.creation_info().is_none());
    assert!(first.description().is_none());

    let second = &entries[1];
    let origin = second.origin().unwrap();
    // Empty value and unparseable time are both absent, not fatal.
    assert!(origin.depth().is_none());
    assert!(origin.time().is_none());
    let magnitude = second.magnitude().unwrap();
    assert_eq!(magnitude.mag(), Some(2.7));
    assert!(magnitude.station_count().is_none());
    assert_eq!(
        second.creation_info().and_then(|c| c.creation_time()),
        Some(Utc.with_ymd_and_hms(2022, 4, 28, 10, 0, 0).unwrap())
    );

    assert_eq!(
        feed.last_timestamp(),
        Some(Utc.with_ymd_and_hms(2022, 4, 28, 11, 0, 0).unwrap())
    );
}

#[tokio::test]
async fn radius_filter() {
    let server = FixtureServer::start().await;
    server.respond_fixture("generic_feed_3.xml");
    let mut feed = feed(&server.url, Coordinates::new(42.0, 13.0))
        .with_filter(EntryFilter::new(Some(250.0), None));
    assert!(feed.to_string().ends_with("radius=Some(250.0), magnitude=None)"));
    let (status, entries) = feed.update().await;
    assert_eq!(status, UpdateStatus::Ok);
    let entries = entries.unwrap();
    assert_eq!(entries.len(), 2);
    assert!((entries[0].distance_to_home() - 66.0).abs() < 0.1);
    assert!((entries[1].distance_to_home() - 227.8).abs() < 0.1);
}

#[tokio::test]
async fn magnitude_filter() {
    let server = FixtureServer::start().await;
    server.respond_fixture("generic_feed_3.xml");
    let mut feed = feed(&server.url, Coordinates::new(42.0, 13.0))
        .with_filter(EntryFilter::new(None, Some(3.0)));
    let (_, entries) = feed.update().await;
    let mags: Vec<f64> = entries
        .unwrap()
        .iter()
        .filter_map(|e| e.magnitude().and_then(|m| m.mag()))
        .collect();
    assert_eq!(mags, vec![3.6, 4.6]);
}

#[tokio::test]
async fn connection_failure_is_error() {
    let url = dead_url().await;
    let mut feed = feed(&url, Coordinates::new(-31.0, 151.0));
    let (status, entries) = feed.update().await;
    assert_eq!(status, UpdateStatus::Error);
    assert!(entries.is_none());
    assert!(feed.last_timestamp().is_none());
}

#[tokio::test]
async fn timeout_is_error() {
    let server = FixtureServer::start().await;
    server.respond_fixture("generic_feed_1.xml");
    server.delay(Duration::from_secs(2));
    let feed = feed(&server.url, Coordinates::new(-31.0, 151.0))
        .with_timeout(Duration::from_millis(200));
    assert_eq!(feed.fetch().await, FetchResult::Error);
}

#[tokio::test]
async fn http_error_status_is_error_and_clears_timestamp() {
    let server = FixtureServer::start().await;
    server.respond_fixture("generic_feed_1.xml");
    let mut feed = feed(&server.url, Coordinates::new(-31.0, 151.0));
    feed.update().await;
    assert!(feed.last_timestamp().is_some());

    server.respond(StatusCode::NOT_FOUND, "");
    let (status, entries) = feed.update().await;
    assert_eq!(status, UpdateStatus::Error);
    assert!(entries.is_none());
    assert!(feed.last_timestamp().is_none());
}

#[tokio::test]
async fn empty_body_is_no_data_and_keeps_timestamp() {
    let server = FixtureServer::start().await;
    server.respond_fixture("generic_feed_1.xml");
    let mut feed = feed(&server.url, Coordinates::new(-31.0, 151.0));
    feed.update().await;
    let ts = feed.last_timestamp();
    assert!(ts.is_some());

    server.respond(StatusCode::OK, "");
    let (status, entries) = feed.update().await;
    assert_eq!(status, UpdateStatus::OkNoData);
    assert!(entries.is_none());
    assert_eq!(feed.last_timestamp(), ts);
}

#[tokio::test]
async fn garbage_bodies_are_no_data() {
    let server = FixtureServer::start().await;
    let mut feed = feed(&server.url, Coordinates::new(-31.0, 151.0));
    for body in ["NOT XML", "\u{0}\u{0}\u{0}", "<q:quakeml xmlns:q=\"x\"><unclosed>"] {
        server.respond(StatusCode::OK, body);
        let (status, entries) = feed.update().await;
        assert_eq!(status, UpdateStatus::OkNoData, "body {body:?}");
        assert!(entries.is_none());
    }
}

#[tokio::test]
async fn well_formed_but_foreign_document_has_no_entries() {
    let server = FixtureServer::start().await;
    server.respond(StatusCode::OK, "<rss><channel/></rss>");
    let feed = feed(&server.url, Coordinates::new(-31.0, 151.0));
    assert_eq!(feed.fetch().await, FetchResult::Ok(None));
}

#[tokio::test]
async fn byte_order_mark_is_stripped() {
    let server = FixtureServer::start().await;
    let mut body = vec![0xEF, 0xBB, 0xBF];
    body.extend_from_slice(
        br#"<?xml version='1.0' encoding='utf-8'?><q:quakeml xmlns:q="http://quakeml.org/xmlns/quakeml/1.2"><eventParameters publicID="smi:webservices.ingv.it/fdsnws/event/1/query"><event><origin publicID="smi:webservices.ingv.it/fdsnws/event/1/query?originId=101595192"><latitude><value>42.5218</value></latitude><longitude><value>42.5218</value></longitude></origin></event></eventParameters></q:quakeml>"#,
    );
    server.respond(StatusCode::OK, body);
    let mut feed = feed(&server.url, Coordinates::new(-31.0, 151.0));
    let (status, entries) = feed.update().await;
    assert_eq!(status, UpdateStatus::Ok);
    let entries = entries.unwrap();
    assert_eq!(entries.len(), 1);
    // No publicID on the event: id falls back to the coordinate digest.
    assert!(entries[0].external_id().unwrap().starts_with("geo:"));
}

/// Host-specific entry type produced through the factory.
struct AttributedEntry {
    inner: FeedEntry,
    source: &'static str,
}

impl AsRef<FeedEntry> for AttributedEntry {
    fn as_ref(&self) -> &FeedEntry {
        &self.inner
    }
}

#[tokio::test]
async fn custom_entry_factory() {
    let server = FixtureServer::start().await;
    server.respond_fixture("generic_feed_3.xml");
    let mut feed = QuakeMlFeed::with_factory(
        Arc::new(ReqwestTransport::new()),
        Coordinates::new(42.0, 13.0),
        server.url.clone(),
        Arc::new(|home, event| AttributedEntry {
            inner: FeedEntry::new(home, event).with_attribution("Test Agency"),
            source: "test",
        }),
    )
    .with_header("Accept", "application/xml")
    .with_param("format", "xml");
    let (status, entries) = feed.update().await;
    assert_eq!(status, UpdateStatus::Ok);
    let entries = entries.unwrap();
    assert_eq!(entries.len(), 3);
    assert!(entries.iter().all(|e| e.source == "test"));
    assert_eq!(entries[0].inner.attribution(), Some("Test Agency"));
}
