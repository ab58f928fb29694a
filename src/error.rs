use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("Failed to parse URL: {0}")]
    UrlParseError(#[from] url::ParseError),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Network failure: {0}")]
    NetworkFailure(String),

    #[error("Request timeout: {0}")]
    Timeout(String),

    #[error("Metadata service returned status {status}")]
    HttpStatus { status: u16 },

    #[error("Failed to parse metadata response: {0}")]
    ParseError(String),

    #[error("Metadata source panicked: {0}")]
    SourcePanicked(String),

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    #[error("Unknown attribute: {0}")]
    UnknownAttribute(String),

    #[error("Attribute is read-only: {0}")]
    ReadOnlyAttribute(String),

    #[error("Invalid custom element name: {0}")]
    InvalidTagName(String),
}

impl PreviewError {
    /// Maps a transport error from reqwest onto the failure taxonomy.
    pub fn from_transport(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            PreviewError::Timeout(e.to_string())
        } else if e.is_decode() {
            PreviewError::ParseError(e.to_string())
        } else if let Some(status) = e.status() {
            PreviewError::HttpStatus {
                status: status.as_u16(),
            }
        } else {
            PreviewError::NetworkFailure(e.to_string())
        }
    }

    pub fn log(&self) {
        match self {
            PreviewError::UrlParseError(e) => {
                warn!(error = %e, "URL parsing failed");
            }
            PreviewError::InvalidUrl(e) => {
                warn!(error = %e, "Invalid URL");
            }
            PreviewError::NetworkFailure(e) => {
                error!(error = %e, "Metadata request failed");
            }
            PreviewError::Timeout(e) => {
                warn!(error = %e, "Metadata request timed out");
            }
            PreviewError::HttpStatus { status } => {
                error!(status = %status, "Metadata service returned non-success status");
            }
            PreviewError::ParseError(e) => {
                error!(error = %e, "Metadata response could not be parsed");
            }
            PreviewError::SourcePanicked(e) => {
                error!(error = %e, "Metadata source panicked");
            }
            PreviewError::ClientBuild(e) => {
                error!(error = %e, "HTTP client construction failed");
            }
            PreviewError::UnknownAttribute(name) => {
                warn!(attribute = %name, "Unknown attribute");
            }
            PreviewError::ReadOnlyAttribute(name) => {
                warn!(attribute = %name, "Attempted to set read-only attribute");
            }
            PreviewError::InvalidTagName(tag) => {
                warn!(tag = %tag, "Invalid custom element name");
            }
        }
    }

    /// True for failures raised while fetching or decoding metadata.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(
            self,
            PreviewError::NetworkFailure(_)
                | PreviewError::Timeout(_)
                | PreviewError::HttpStatus { .. }
                | PreviewError::ParseError(_)
                | PreviewError::SourcePanicked(_)
        )
    }
}
