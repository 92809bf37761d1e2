//! Upstream media server client.
//!
//! The [`LibrarySource`] trait defines the three reads the pipeline needs:
//! section info, section items and an artwork download. [`PlexClient`] is the
//! production implementation over `reqwest`; tests substitute an in-memory
//! source so the fetch and materialize stages run without a network.
//!
//! ## Wire format
//!
//! ```text
//! GET {server}/library/sections/{id}?X-Plex-Token=…
//!   → {"MediaContainer": {"title1": "Movies", …}}
//! GET {server}/library/sections/{id}/all?X-Plex-Token=…
//!   → {"MediaContainer": {"Metadata": [{"ratingKey": "101", "title": …,
//!                                       "year": 1979, "thumb": "/library/…"}]}}
//! ```
//!
//! `Metadata` is absent for empty sections. `ratingKey` is usually a string
//! but some servers emit a number.

use futures::StreamExt;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncWriteExt;

use crate::config::{ProcessingConfig, UpstreamConfig};

/// Query parameter carrying the shared secret.
pub const TOKEN_PARAM: &str = "X-Plex-Token";

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Upstream returned {status} for {url}")]
    Status { url: String, status: u16 },
    #[error("Malformed response: {0}")]
    Decode(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Section metadata from `/library/sections/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SectionInfo {
    #[serde(rename = "title1", default, deserialize_with = "null_as_empty")]
    pub title: String,
}

/// One record from `/library/sections/{id}/all`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UpstreamItem {
    #[serde(rename = "ratingKey", deserialize_with = "rating_key")]
    pub rating_key: String,
    /// Absent or `null` becomes empty.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default)]
    pub year: Option<u32>,
    /// Artwork path relative to the server root. Empty counts as missing.
    #[serde(default)]
    pub thumb: Option<String>,
}

impl UpstreamItem {
    /// The artwork reference, if the record carries a usable one.
    pub fn artwork(&self) -> Option<&str> {
        self.thumb.as_deref().filter(|t| !t.is_empty())
    }
}

#[derive(Deserialize)]
struct Envelope<T> {
    #[serde(rename = "MediaContainer")]
    media_container: T,
}

#[derive(Deserialize)]
struct ItemsContainer {
    #[serde(rename = "Metadata", default)]
    metadata: Vec<UpstreamItem>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn rating_key<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Key {
        Text(String),
        Number(u64),
    }
    Ok(match Key::deserialize(deserializer)? {
        Key::Text(s) => s,
        Key::Number(n) => n.to_string(),
    })
}

/// Read access to an upstream library.
///
/// Futures are `Send` so the pipeline can run on a spawned task.
pub trait LibrarySource: Sync {
    /// Section title and metadata.
    fn section_info(
        &self,
        section_id: u32,
    ) -> impl Future<Output = Result<SectionInfo, FetchError>> + Send;

    /// All records in a section, in upstream order.
    fn section_items(
        &self,
        section_id: u32,
    ) -> impl Future<Output = Result<Vec<UpstreamItem>, FetchError>> + Send;

    /// Stream an artwork reference (an item's `thumb`) into a new file at
    /// `dest`. Returns the number of bytes written. On error `dest` may hold a
    /// prefix of the body; the caller owns cleanup.
    fn download_artwork(
        &self,
        thumb: &str,
        dest: &Path,
    ) -> impl Future<Output = Result<u64, FetchError>> + Send;
}

/// HTTP client for a Plex-compatible server.
#[derive(Clone)]
pub struct PlexClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl PlexClient {
    pub fn new(base_url: &str, token: &str, timeout: Duration) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("plex-shelf/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    pub fn from_config(
        upstream: &UpstreamConfig,
        processing: &ProcessingConfig,
    ) -> Result<Self, FetchError> {
        Self::new(
            &upstream.url,
            &upstream.token,
            Duration::from_secs(processing.timeout_secs),
        )
    }

    /// Absolute URL for a server-relative path. The token is added per request
    /// so it never shows up in error messages.
    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    async fn get(&self, path: &str) -> Result<reqwest::Response, FetchError> {
        let url = self.url(path);
        tracing::debug!(url = %url, "GET upstream");

        let response = self
            .http
            .get(&url)
            .query(&[(TOKEN_PARAM, self.token.as_str())])
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| FetchError::Network(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url,
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, FetchError> {
        let bytes = self
            .get(path)
            .await?
            .bytes()
            .await
            .map_err(|e| FetchError::Network(e.without_url().to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| FetchError::Decode(e.to_string()))
    }
}

impl LibrarySource for PlexClient {
    async fn section_info(&self, section_id: u32) -> Result<SectionInfo, FetchError> {
        let envelope: Envelope<SectionInfo> = self
            .get_json(&format!("/library/sections/{section_id}"))
            .await?;
        Ok(envelope.media_container)
    }

    async fn section_items(&self, section_id: u32) -> Result<Vec<UpstreamItem>, FetchError> {
        let envelope: Envelope<ItemsContainer> = self
            .get_json(&format!("/library/sections/{section_id}/all"))
            .await?;
        Ok(envelope.media_container.metadata)
    }

    async fn download_artwork(&self, thumb: &str, dest: &Path) -> Result<u64, FetchError> {
        let mut body = self.get(thumb).await?.bytes_stream();
        let mut file = tokio::fs::File::create(dest).await?;
        let mut written = 0u64;

        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| FetchError::Network(e.without_url().to_string()))?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        Ok(written)
    }
}
