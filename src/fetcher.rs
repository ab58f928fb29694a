use crate::{MetadataSource, PageMetadata, PreviewError};
use async_trait::async_trait;
use reqwest::{header::HeaderMap, Client};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

pub const DEFAULT_METADATA_ENDPOINT: &str =
    "https://open-apis.hax.cloud/api/services/website/metadata";

const DEFAULT_USER_AGENT: &str = concat!("link_preview_card/", env!("CARGO_PKG_VERSION"));

/// HTTP client for the metadata service.
#[derive(Clone)]
pub struct Fetcher {
    client: Client,
    endpoint: String,
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Fetcher {
    pub fn new() -> Self {
        debug!("Fetcher initialized with default configuration");
        Self::new_with_config(FetcherConfig::default())
    }

    /// Builds a fetcher, falling back to a plain client if the configured
    /// one cannot be constructed.
    pub fn new_with_config(config: FetcherConfig) -> Self {
        let endpoint = config.endpoint.clone();
        Self::try_new_with_config(config).unwrap_or_else(|e| {
            e.log();
            warn!("Falling back to default HTTP client");
            Self {
                client: Client::new(),
                endpoint,
            }
        })
    }

    pub fn try_new_with_config(config: FetcherConfig) -> Result<Self, PreviewError> {
        let mut client_builder = Client::builder()
            .user_agent(config.user_agent)
            .timeout(config.timeout)
            .pool_max_idle_per_host(10);

        if let Some(headers) = config.headers {
            client_builder = client_builder.default_headers(headers);
        }

        let client = client_builder
            .build()
            .map_err(|e| PreviewError::ClientBuild(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.endpoint,
        })
    }

    pub fn with_client(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The service URL for a lookup of `target`, with `target` encoded as
    /// the `q` query value.
    pub fn request_url(&self, target: &str) -> Result<Url, PreviewError> {
        if target.trim().is_empty() {
            return Err(PreviewError::InvalidUrl("empty target URL".to_string()));
        }

        let mut request_url = Url::parse(&self.endpoint)?;
        request_url.query_pairs_mut().append_pair("q", target);
        Ok(request_url)
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn fetch_metadata(&self, target: &str) -> Result<PageMetadata, PreviewError> {
        let request_url = self.request_url(target)?;
        debug!(url = %target, endpoint = %request_url, "Requesting page metadata");

        let response = self
            .client
            .get(request_url)
            .send()
            .await
            .map_err(PreviewError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(PreviewError::HttpStatus {
                status: status.as_u16(),
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| PreviewError::ParseError(e.to_string()))?;

        let metadata = PageMetadata::from_value(body)?;
        debug!(
            url = %target,
            title = ?metadata.title,
            image = ?metadata.image,
            "Successfully fetched page metadata"
        );
        Ok(metadata)
    }
}

#[async_trait]
impl MetadataSource for Fetcher {
    async fn fetch_metadata(&self, url: &str) -> Result<PageMetadata, PreviewError> {
        Fetcher::fetch_metadata(self, url).await
    }
}

/// Settings for [`Fetcher`].
///
/// # Examples
/// ```ignore
/// let fetcher = Fetcher::new_with_config(FetcherConfig {
///     endpoint: "http://localhost:8080/metadata".to_string(),
///     timeout: Duration::from_secs(3),
///     ..FetcherConfig::default()
/// });
/// ```
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    pub endpoint: String,
    pub user_agent: String,
    pub timeout: Duration,
    pub headers: Option<HeaderMap>,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_METADATA_ENDPOINT.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(10),
            headers: None,
        }
    }
}
