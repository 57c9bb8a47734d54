// src/feed/transport.rs
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Method};

/// One outgoing feed request.
#[derive(Debug, Clone)]
pub struct FeedRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub params: Vec<(String, String)>,
    pub timeout: Duration,
}

/// Status and raw body. Any status is a response; only connection
/// failures and timeouts are errors.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn request(&self, req: &FeedRequest) -> Result<RawResponse>;
}

#[derive(Clone, Default)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn request(&self, req: &FeedRequest) -> Result<RawResponse> {
        let mut builder = self
            .client
            .request(req.method.clone(), &req.url)
            .timeout(req.timeout);
        for (name, value) in &req.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !req.params.is_empty() {
            builder = builder.query(&req.params);
        }

        let resp = builder
            .send()
            .await
            .with_context(|| format!("quakeml http {} {}", req.method, req.url))?;
        let status = resp.status().as_u16();
        let body = resp.bytes().await.context("quakeml http body")?;
        Ok(RawResponse {
            status,
            body: body.to_vec(),
        })
    }
}
