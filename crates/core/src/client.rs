//! Blocking HTTP client shared by every stage of the pipeline.
//! It owns the endpoint configuration and decodes the `{code, data}` envelope.

use crate::error::ApiError;
use reqwest::blocking::Client;
use reqwest::header::{REFERER, USER_AGENT};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, trace};

/// Public API host used when nothing else is configured.
pub const DEFAULT_API_BASE: &str = "https://api.bilibili.com";

/// Environment variable overriding [`ClientConfig::api_base`].
pub const API_BASE_ENV: &str = "BILISUB_API_BASE";

const API_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64)";
const BROWSER_USER_AGENT: &str = "Mozilla/5.0";
const SITE_REFERER: &str = "https://www.bilibili.com/";

/// Endpoint and timeout settings for [`BiliClient`].
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Scheme and host of the metadata API, without a trailing slash.
    pub api_base: String,
    /// Timeout applied to API calls and short link resolution.
    pub api_timeout: Duration,
    /// Timeout applied to subtitle payload downloads.
    pub payload_timeout: Duration,
    /// User agent sent to the metadata API.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            api_timeout: Duration::from_secs(15),
            payload_timeout: Duration::from_secs(20),
            user_agent: API_USER_AGENT.to_string(),
        }
    }
}

impl ClientConfig {
    /// Defaults, with the API host taken from `BILISUB_API_BASE` when set.
    pub fn from_env() -> Self {
        match std::env::var(API_BASE_ENV) {
            Ok(base) if !base.trim().is_empty() => Self::default().with_api_base(base.trim()),
            _ => Self::default(),
        }
    }

    /// Point the client at another API host.
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into().trim_end_matches('/').to_string();
        self
    }
}

/// Response envelope shared by every upstream endpoint.
#[derive(Debug, Deserialize)]
struct Envelope {
    code: i64,
    #[serde(default)]
    message: String,
    #[serde(default)]
    data: Value,
}

/// Whether an API request should carry the site referer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Referer {
    Site,
    Omit,
}

/// Thin wrapper around a blocking reqwest client.
#[derive(Debug, Clone)]
pub struct BiliClient {
    http: Client,
    config: ClientConfig,
}

impl BiliClient {
    /// Build a client using [`ClientConfig::from_env`].
    pub fn new() -> Result<Self, ApiError> {
        Self::with_config(ClientConfig::from_env())
    }

    /// Build a client with explicit settings.
    pub fn with_config(config: ClientConfig) -> Result<Self, ApiError> {
        let http = Client::builder().build()?;
        Ok(Self { http, config })
    }

    /// Call `path` on the API host and return the decoded `data` member.
    /// A non-zero envelope `code` becomes [`ApiError::Service`].
    pub(crate) fn get_api<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        path: &str,
        query: &[(&str, String)],
        referer: Referer,
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", self.config.api_base, path);
        trace!("get_api endpoint={endpoint} url={url} query={query:?}");
        let mut request = self
            .http
            .get(&url)
            .query(query)
            .header(USER_AGENT, &self.config.user_agent)
            .timeout(self.config.api_timeout);
        if referer == Referer::Site {
            request = request.header(REFERER, SITE_REFERER);
        }
        let body = request.send()?.error_for_status()?.text()?;
        let envelope: Envelope = serde_json::from_str(&body)
            .map_err(|e| ApiError::malformed(endpoint, e.to_string()))?;
        if envelope.code != 0 {
            debug!("{endpoint} answered code {}", envelope.code);
            return Err(ApiError::Service {
                endpoint,
                code: envelope.code,
                message: envelope.message,
            });
        }
        // A null or missing `data` decodes like an empty object so that
        // lenient shapes fall back to their defaults.
        let data = match envelope.data {
            Value::Null => Value::Object(Default::default()),
            other => other,
        };
        serde_json::from_value(data).map_err(|e| ApiError::malformed(endpoint, e.to_string()))
    }

    /// Download a standalone JSON document such as a subtitle payload.
    pub(crate) fn get_document<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        url: &str,
    ) -> Result<T, ApiError> {
        trace!("get_document endpoint={endpoint} url={url}");
        let body = self
            .http
            .get(url)
            .header(USER_AGENT, BROWSER_USER_AGENT)
            .timeout(self.config.payload_timeout)
            .send()?
            .error_for_status()?
            .text()?;
        serde_json::from_str(&body).map_err(|e| ApiError::malformed(endpoint, e.to_string()))
    }

    /// GET `url` following redirects and return the final location.
    pub(crate) fn final_url(&self, url: &str) -> Result<String, ApiError> {
        trace!("final_url url={url}");
        let response = self
            .http
            .get(url)
            .header(USER_AGENT, BROWSER_USER_AGENT)
            .timeout(self.config.api_timeout)
            .send()?;
        Ok(response.url().to_string())
    }
}
