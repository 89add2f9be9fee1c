//! Remote API client with a version-keyed catalog cache.
//!
//! Two endpoints, both answering `{"version": …, "data": …}`:
//!
//! * `GET /list-langs/` – the language catalog
//! * `GET /chars/?chars=…` – readings for the queried characters
//!
//! The catalog is cached in the [`KeyValueStore`] together with the version
//! token it came with.  A query answered under a different version refreshes
//! the catalog on a background thread and hands back the join handle.

use crate::catalog::{Catalog, LanguageInfo, Scalar};
use crate::rows::CharacterResult;
use crate::storage::{KeyValueStore, read_json, read_string, remove_key, write_json, write_string};
use icu_normalizer::{ComposingNormalizer, ComposingNormalizerBorrowed};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::{Arc, LazyLock};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://1305783649-j61pduj0mx.ap-guangzhou.tencentscf.com";
pub const LANGUAGES_PATH: &str = "/list-langs/";
pub const CHARS_PATH: &str = "/chars/";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub const VERSION_CACHE_KEY: &str = "yindian_api_version";
pub const LANGUAGES_CACHE_KEY: &str = "yindian_languages_cache";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Http(String),
    #[error("HTTP error! status: {0}")]
    Status(u16),
    #[error("malformed response: {0}")]
    Json(#[from] serde_json::Error),
    #[error("nothing to query")]
    EmptyQuery,
    #[error("invalid client configuration: {0}")]
    Config(String),
}

/// Response envelope shared by both endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Data version; numeric tokens are normalised to their decimal text.
    #[serde(deserialize_with = "version_token")]
    pub version: String,
    pub data: T,
}

fn version_token<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Scalar::deserialize(deserializer).map(|v| v.text())
}

// ---------------------------------------------------------------------------
//    Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ClientConfig {
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }
}

#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
}

impl ClientConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> ClientConfig {
        let defaults = ClientConfig::default();
        ClientConfig {
            base_url: self
                .base_url
                .map(|u| u.trim_end_matches('/').to_owned())
                .unwrap_or(defaults.base_url),
            timeout: self.timeout.unwrap_or(defaults.timeout),
        }
    }
}

// ---------------------------------------------------------------------------
//    Transport
// ---------------------------------------------------------------------------

/// Performs a GET against the API and returns the body of a 2xx response.
pub trait Transport: Send + Sync {
    fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<String, ApiError>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<String, ApiError> {
        (**self).get(path, query)
    }
}

/// Blocking reqwest transport.
#[cfg(feature = "http")]
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::blocking::Client,
    base_url: String,
}

#[cfg(feature = "http")]
impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::Config(e.to_string()))?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }
}

#[cfg(feature = "http")]
impl Transport for HttpTransport {
    fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<String, ApiError> {
        let url = format!("{}{path}", self.base_url);
        log::trace!("GET {url} {query:?}");
        let response = self
            .client
            .get(&url)
            .query(query)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .map_err(|e| ApiError::Http(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status(status.as_u16()));
        }
        response.text().map_err(|e| ApiError::Http(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
//    Query input
// ---------------------------------------------------------------------------

static NFC: LazyLock<ComposingNormalizerBorrowed<'static>> =
    LazyLock::new(ComposingNormalizer::new_nfc);

/// Whitespace removed, NFC-composed; empty input is rejected.
pub fn normalize_query(input: &str) -> Result<String, ApiError> {
    let compact: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Err(ApiError::EmptyQuery);
    }
    Ok(NFC.normalize(&compact).into_owned())
}

// ---------------------------------------------------------------------------
//    Client
// ---------------------------------------------------------------------------

pub type RefreshHandle = JoinHandle<Result<Vec<LanguageInfo>, ApiError>>;

/// Query outcome, plus the catalog refresh it set off when the version moved.
#[derive(Debug)]
pub struct QueryResponse {
    pub version: String,
    pub data: Vec<CharacterResult>,
    pub refresh: Option<RefreshHandle>,
}

/// Cheap to clone; clones share transport and store.
pub struct ApiClient<T, S> {
    inner: Arc<ClientInner<T, S>>,
}

impl<T, S> Clone for ApiClient<T, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct ClientInner<T, S> {
    transport: T,
    store: S,
}

#[cfg(feature = "http")]
impl<S: KeyValueStore + 'static> ApiClient<HttpTransport, S> {
    pub fn from_config(config: &ClientConfig, store: S) -> Result<Self, ApiError> {
        Ok(Self::new(HttpTransport::new(config)?, store))
    }
}

impl<T: Transport + 'static, S: KeyValueStore + 'static> ApiClient<T, S> {
    pub fn new(transport: T, store: S) -> Self {
        Self {
            inner: Arc::new(ClientInner { transport, store }),
        }
    }

    pub fn store(&self) -> &S {
        &self.inner.store
    }

    pub fn cached_version(&self) -> Option<String> {
        self.inner.cached_version()
    }

    pub fn cached_languages(&self) -> Option<Vec<LanguageInfo>> {
        self.inner.cached_languages()
    }

    /// Drop the cached catalog and its version.
    pub fn clear_cache(&self) {
        remove_key(&self.inner.store, VERSION_CACHE_KEY);
        remove_key(&self.inner.store, LANGUAGES_CACHE_KEY);
    }

    /// Fetch the catalog.  The response replaces the cache when forced or when
    /// its version differs; otherwise the cached copy is served.  A failed
    /// request falls back to the cache, or fails when there is none.
    pub fn fetch_languages(&self, force_refresh: bool) -> Result<Vec<LanguageInfo>, ApiError> {
        self.inner.fetch_languages(force_refresh)
    }

    /// Query readings for `chars` (normalised first).
    pub fn query_characters(&self, chars: &str) -> Result<QueryResponse, ApiError> {
        let chars = normalize_query(chars)?;
        let response: ApiResponse<Vec<CharacterResult>> = self
            .inner
            .request(CHARS_PATH, &[("chars", chars.as_str())])
            .inspect_err(|e| log::error!("failed to query characters: {e}"))?;

        let refresh = match self.inner.cached_version() {
            Some(cached) if cached != response.version => {
                log::info!(
                    "version mismatch detected (cached {cached}, api {}); refreshing catalog",
                    response.version
                );
                self.spawn_refresh()
            }
            _ => None,
        };

        Ok(QueryResponse {
            version: response.version,
            data: response.data,
            refresh,
        })
    }

    fn spawn_refresh(&self) -> Option<RefreshHandle> {
        let inner = Arc::clone(&self.inner);
        let spawned = thread::Builder::new()
            .name("yindian-catalog-refresh".into())
            .spawn(move || {
                inner
                    .fetch_languages(true)
                    .inspect_err(|e| log::error!("background catalog refresh failed: {e}"))
            });
        match spawned {
            Ok(handle) => Some(handle),
            Err(e) => {
                log::error!("could not start catalog refresh: {e}");
                None
            }
        }
    }
}

impl<T: Transport, S: KeyValueStore> ClientInner<T, S> {
    fn request<D: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<D, ApiError> {
        let body = self.transport.get(path, query)?;
        Ok(serde_json::from_str(&body)?)
    }

    fn cached_version(&self) -> Option<String> {
        read_string(&self.store, VERSION_CACHE_KEY)
    }

    fn cached_languages(&self) -> Option<Vec<LanguageInfo>> {
        read_json(&self.store, LANGUAGES_CACHE_KEY)
    }

    fn store_catalog(&self, version: &str, languages: &[LanguageInfo]) {
        write_string(&self.store, VERSION_CACHE_KEY, version);
        write_json(&self.store, LANGUAGES_CACHE_KEY, languages);
    }

    fn fetch_languages(&self, force_refresh: bool) -> Result<Vec<LanguageInfo>, ApiError> {
        let response = match self.request::<ApiResponse<Catalog>>(LANGUAGES_PATH, &[]) {
            Ok(response) => response,
            Err(e) => {
                log::error!("failed to fetch languages: {e}");
                return match self.cached_languages() {
                    Some(cached) => {
                        log::warn!("using cached languages as fallback");
                        Ok(cached)
                    }
                    None => Err(e),
                };
            }
        };

        let ApiResponse {
            version,
            data: Catalog(data),
        } = response;
        let cached_version = self.cached_version();
        if force_refresh || cached_version.as_deref() != Some(version.as_str()) {
            log::info!(
                "catalog version {} (cached {}), storing",
                version,
                cached_version.as_deref().unwrap_or("none")
            );
            self.store_catalog(&version, &data);
            return Ok(data);
        }

        if let Some(cached) = self.cached_languages() {
            log::info!("using cached languages data");
            return Ok(cached);
        }

        self.store_catalog(&version, &data);
        Ok(data)
    }
}
