// src/config.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::consts::{DEFAULT_POLL_INTERVAL_SECS, DEFAULT_REQUEST_TIMEOUT_SECS};
use crate::distance::Coordinates;
use crate::xml::NamespaceMap;

pub const ENV_CONFIG_PATH: &str = "QUAKEML_CONFIG_PATH";
pub const DEFAULT_TOML_PATH: &str = "config/quakeml.toml";
pub const DEFAULT_JSON_PATH: &str = "config/quakeml.json";

fn default_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}
fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedConfig {
    pub home: Coordinates,
    pub url: String,
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub filter_radius: Option<f64>,
    #[serde(default)]
    pub filter_minimum_magnitude: Option<f64>,
    /// Namespace URI → prefix. An empty prefix maps to "no prefix".
    #[serde(default)]
    pub namespaces: HashMap<String, String>,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

impl FeedConfig {
    pub fn new(home: Coordinates, url: impl Into<String>) -> Self {
        Self {
            home,
            url: url.into(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            filter_radius: None,
            filter_minimum_magnitude: None,
            namespaces: HashMap::new(),
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
        }
    }

    pub fn namespace_map(&self) -> NamespaceMap {
        self.namespaces
            .iter()
            .map(|(uri, prefix)| {
                let prefix = prefix.trim();
                let prefix = (!prefix.is_empty()).then(|| prefix.to_string());
                (uri.clone(), prefix)
            })
            .collect()
    }

    fn validate(self) -> Result<Self> {
        if self.url.trim().is_empty() {
            return Err(anyhow!("feed url must not be empty"));
        }
        if !(-90.0..=90.0).contains(&self.home.latitude)
            || !(-180.0..=180.0).contains(&self.home.longitude)
        {
            return Err(anyhow!(
                "home coordinates out of range: ({}, {})",
                self.home.latitude,
                self.home.longitude
            ));
        }
        Ok(self)
    }
}

/// Load config from an explicit path. Supports TOML or JSON formats.
pub fn load_config_from(path: &Path) -> Result<FeedConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading feed config from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_config(&content, ext.as_str())
}

/// Load config using env var + fallbacks:
/// 1) $QUAKEML_CONFIG_PATH
/// 2) config/quakeml.toml
/// 3) config/quakeml.json
pub fn load_config_default() -> Result<FeedConfig> {
    if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_config_from(&pb);
        } else {
            return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
        }
    }
    let toml_p = PathBuf::from(DEFAULT_TOML_PATH);
    if toml_p.exists() {
        return load_config_from(&toml_p);
    }
    let json_p = PathBuf::from(DEFAULT_JSON_PATH);
    if json_p.exists() {
        return load_config_from(&json_p);
    }
    Err(anyhow!(
        "no feed config found (set {ENV_CONFIG_PATH} or create {DEFAULT_TOML_PATH})"
    ))
}

fn parse_config(s: &str, hint_ext: &str) -> Result<FeedConfig> {
    // JSON if hinted or the content starts like an object; TOML otherwise.
    let looks_json = hint_ext == "json" || s.trim_start().starts_with('{');
    let cfg: FeedConfig = if looks_json {
        serde_json::from_str(s).context("parsing feed config json")?
    } else {
        toml::from_str(s).context("parsing feed config toml")?
    };
    cfg.validate()
}
