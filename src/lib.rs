use async_trait::async_trait;

mod card;
mod error;
mod fetcher;
#[cfg(feature = "logging")]
mod logging;
mod metadata;
pub mod registry;
pub mod render;
mod state;
mod utils;

pub use card::{MetadataCard, OBSERVED_ATTRIBUTES};
pub use error::PreviewError;
pub use fetcher::{Fetcher, FetcherConfig, DEFAULT_METADATA_ENDPOINT};
#[cfg(feature = "logging")]
pub use logging::{
    format_error_card, format_preview_card, log_error_card, log_preview_card, setup_logging,
    LogConfig, LogLevelGuard,
};
pub use metadata::PageMetadata;
pub use state::{LoadStatus, PreviewState};
pub use utils::truncate_str;

/// Anything that can resolve page metadata for a URL.
///
/// [`Fetcher`] talks to the metadata service over HTTP; tests and embedders
/// can supply their own.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    async fn fetch_metadata(&self, url: &str) -> Result<PageMetadata, PreviewError>;
}
