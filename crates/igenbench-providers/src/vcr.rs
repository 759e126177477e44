//! VCR (Video Cassette Recording) middleware for provider HTTP calls.
//!
//! Used for deterministic testing of generation/judge workloads without network variance.
//!
//! # Environment Variables
//!
//! - `IGENBENCH_VCR_MODE`: `off` (default, live network), `record`, `replay`
//! - `IGENBENCH_VCR_DIR`: Path to cassette directory (default: `tests/fixtures/cassettes`)
//!
//! # Matching
//!
//! Requests are matched by: method + URL + body (canonicalized JSON). Headers
//! (API keys) are excluded from matching so cassettes never contain secrets.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{ProviderError, ProviderResult};
use crate::network::check_outbound;

/// VCR mode: how to handle HTTP requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VcrMode {
    /// Pass through to live network; no recording
    #[default]
    Off,
    /// Record to cassettes; make real requests
    Record,
    /// Replay from cassettes; fail if no match
    Replay,
}

impl VcrMode {
    /// Parse from environment variable `IGENBENCH_VCR_MODE`
    pub fn from_env() -> Self {
        match env::var("IGENBENCH_VCR_MODE")
            .unwrap_or_default()
            .to_lowercase()
            .as_str()
        {
            "record" => VcrMode::Record,
            "replay" => VcrMode::Replay,
            _ => VcrMode::Off,
        }
    }
}

/// A recorded HTTP request/response pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CassetteEntry {
    pub method: String,
    pub url: String,
    /// Request body (JSON, canonicalized for matching)
    pub request_body: Option<serde_json::Value>,
    /// Response status code
    pub status: u16,
    /// Response body
    pub response_body: serde_json::Value,
    /// Fingerprint used for matching (method + url + canonicalized body hash)
    pub fingerprint: String,
    #[serde(default)]
    pub recorded_at: Option<String>,
}

/// VCR client for HTTP request interception
#[derive(Debug)]
pub struct VcrClient {
    mode: VcrMode,
    cassette_dir: PathBuf,
    /// In-memory cassette cache (fingerprint -> entry)
    cache: HashMap<String, CassetteEntry>,
    inner: reqwest::Client,
}

impl VcrClient {
    /// Create a new VCR client with mode and directory from environment
    pub fn from_env() -> Self {
        let mode = VcrMode::from_env();
        let cassette_dir = env::var("IGENBENCH_VCR_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("tests/fixtures/cassettes"));

        Self::new(mode, cassette_dir)
    }

    /// Create a new VCR client with explicit mode and directory
    pub fn new(mode: VcrMode, cassette_dir: PathBuf) -> Self {
        let mut client = Self {
            mode,
            cassette_dir,
            cache: HashMap::new(),
            inner: reqwest::Client::new(),
        };

        if mode == VcrMode::Replay {
            client.load_cassettes();
        }

        client
    }

    /// Use a preconfigured HTTP client (timeouts, user agent) for live requests.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.inner = client;
        self
    }

    /// Compute fingerprint for request matching (headers excluded)
    pub fn fingerprint(method: &str, url: &str, body: Option<&serde_json::Value>) -> String {
        let mut hasher = Sha256::new();
        hasher.update(method.as_bytes());
        hasher.update(b"|");
        hasher.update(url.as_bytes());
        hasher.update(b"|");

        if let Some(b) = body {
            let canonical = serde_jcs::to_string(b).unwrap_or_else(|_| b.to_string());
            hasher.update(canonical.as_bytes());
        }

        hex::encode(hasher.finalize())
    }

    /// Load all cassettes (root dir and one level of provider subdirs) into memory
    fn load_cassettes(&mut self) {
        let cassette_dir = self.cassette_dir.clone();
        if !cassette_dir.exists() {
            return;
        }

        self.load_cassettes_from_dir(&cassette_dir);
        let Ok(entries) = fs::read_dir(&cassette_dir) else {
            return;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                self.load_cassettes_from_dir(&path);
            }
        }
    }

    fn load_cassettes_from_dir(&mut self, dir: &Path) {
        let Ok(entries) = fs::read_dir(dir) else {
            return;
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().map(|e| e == "json").unwrap_or(false) {
                if let Ok(content) = fs::read_to_string(&path) {
                    if let Ok(cassette) = serde_json::from_str::<CassetteEntry>(&content) {
                        self.cache.insert(cassette.fingerprint.clone(), cassette);
                    }
                }
            }
        }
    }

    /// Save a cassette entry to disk under `<dir>/<category>/`
    fn save_cassette(&self, entry: &CassetteEntry, category: &str) -> anyhow::Result<()> {
        let dir = self.cassette_dir.join(category);
        fs::create_dir_all(&dir)?;

        let fp_prefix = &entry.fingerprint[..entry.fingerprint.len().min(16)];
        let path = dir.join(format!("{}.json", fp_prefix));

        let content = serde_json::to_string_pretty(entry)?;
        fs::write(path, content)?;

        Ok(())
    }

    async fn send_live(
        &self,
        url: &str,
        body: &serde_json::Value,
        headers: &[(&str, String)],
    ) -> ProviderResult<VcrResponse> {
        check_outbound(url)?;
        let mut req = self.inner.post(url).json(body);
        for (name, value) in headers {
            req = req.header(*name, value);
        }
        let resp = req.send().await?;

        let status = resp.status().as_u16();
        let text = resp.text().await?;
        let body = serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text));

        Ok(VcrResponse { status, body })
    }

    /// Make a POST request with VCR handling
    pub async fn post_json(
        &mut self,
        category: &str,
        url: &str,
        body: &serde_json::Value,
        headers: &[(&str, String)],
    ) -> ProviderResult<VcrResponse> {
        let fingerprint = Self::fingerprint("POST", url, Some(body));

        match self.mode {
            VcrMode::Replay => match self.cache.get(&fingerprint) {
                Some(entry) => Ok(VcrResponse {
                    status: entry.status,
                    body: entry.response_body.clone(),
                }),
                None => Err(ProviderError::Config {
                    message: format!(
                        "VCR replay: no cassette found for POST {} (fingerprint: {}). \
                         Run with IGENBENCH_VCR_MODE=record to record responses.",
                        url,
                        &fingerprint[..16]
                    ),
                }),
            },
            VcrMode::Record => {
                let resp = self.send_live(url, body, headers).await?;

                let entry = CassetteEntry {
                    method: "POST".to_string(),
                    url: url.to_string(),
                    request_body: Some(body.clone()),
                    status: resp.status,
                    response_body: resp.body.clone(),
                    fingerprint: fingerprint.clone(),
                    recorded_at: Some(chrono::Utc::now().to_rfc3339()),
                };

                if let Err(e) = self.save_cassette(&entry, category) {
                    tracing::warn!("VCR: failed to save cassette: {}", e);
                }
                self.cache.insert(fingerprint, entry);

                Ok(resp)
            }
            VcrMode::Off => self.send_live(url, body, headers).await,
        }
    }

    /// Get the current VCR mode
    pub fn mode(&self) -> VcrMode {
        self.mode
    }

    /// Get cassette count (for diagnostics)
    pub fn cassette_count(&self) -> usize {
        self.cache.len()
    }
}

/// Response from VCR client
#[derive(Debug)]
pub struct VcrResponse {
    pub status: u16,
    pub body: serde_json::Value,
}

impl VcrResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
