// tests/common/mod.rs
//! Shared helpers: an in-process HTTP server serving fixtures, and a
//! recording entity handler.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{extract::State, http::StatusCode, routing::get, Router};
use parking_lot::Mutex;

use quakeml_feed::{EntityHandler, StatusUpdate};

pub fn load_fixture(name: &str) -> Vec<u8> {
    let path = format!("{}/tests/fixtures/{name}", env!("CARGO_MANIFEST_DIR"));
    std::fs::read(&path).unwrap_or_else(|e| panic!("fixture {path}: {e}"))
}

#[derive(Clone)]
struct Reply {
    status: StatusCode,
    body: Vec<u8>,
    delay: Option<Duration>,
}

type Shared = Arc<Mutex<Reply>>;

/// Serves whatever reply was configured last on `GET /feed`.
#[derive(Clone)]
pub struct FixtureServer {
    pub url: String,
    reply: Shared,
}

impl FixtureServer {
    pub async fn start() -> Self {
        let reply: Shared = Arc::new(Mutex::new(Reply {
            status: StatusCode::OK,
            body: Vec::new(),
            delay: None,
        }));
        let app = Router::new()
            .route("/feed", get(serve_reply))
            .with_state(reply.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("test server");
        });
        Self {
            url: format!("http://{addr}/feed"),
            reply,
        }
    }

    pub fn respond(&self, status: StatusCode, body: impl Into<Vec<u8>>) {
        let mut r = self.reply.lock();
        r.status = status;
        r.body = body.into();
    }

    pub fn respond_fixture(&self, name: &str) {
        self.respond(StatusCode::OK, load_fixture(name));
    }

    pub fn delay(&self, delay: Duration) {
        self.reply.lock().delay = Some(delay);
    }
}

async fn serve_reply(State(reply): State<Shared>) -> (StatusCode, Vec<u8>) {
    let r = reply.lock().clone();
    if let Some(d) = r.delay {
        tokio::time::sleep(d).await;
    }
    (r.status, r.body)
}

/// URL on a port nothing listens on.
pub async fn dead_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    format!("http://{addr}/feed")
}

#[derive(Debug, Clone, Default)]
pub struct Calls {
    pub created: Vec<String>,
    pub updated: Vec<String>,
    pub removed: Vec<String>,
    pub statuses: Vec<StatusUpdate>,
}

#[derive(Clone, Default)]
pub struct Recorder {
    inner: Arc<Mutex<Calls>>,
}

impl Recorder {
    /// Return everything recorded so far and start over.
    pub fn take(&self) -> Calls {
        std::mem::take(&mut *self.inner.lock())
    }
}

#[async_trait]
impl EntityHandler for Recorder {
    async fn create(&self, external_id: &str) {
        self.inner.lock().created.push(external_id.to_string());
    }
    async fn update(&self, external_id: &str) {
        self.inner.lock().updated.push(external_id.to_string());
    }
    async fn remove(&self, external_id: &str) {
        self.inner.lock().removed.push(external_id.to_string());
    }
    async fn status(&self, status: &StatusUpdate) {
        self.inner.lock().statuses.push(status.clone());
    }
}
