use crate::PageMetadata;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Where a card is in its fetch cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading,
    Loaded,
    Failed,
}

impl LoadStatus {
    pub fn is_settled(self) -> bool {
        !matches!(self, LoadStatus::Loading)
    }
}

/// Everything a card displays, plus the raw payload of the last successful
/// fetch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreviewState {
    pub url: String,
    pub title: String,
    pub image: String,
    pub description: String,
    pub status: LoadStatus,
    pub metadata: Map<String, Value>,
    pub fancy: bool,
}

impl PreviewState {
    pub fn loading(&self) -> bool {
        self.status == LoadStatus::Loading
    }

    /// Commits a successful fetch. `url` is left alone even when the payload
    /// carries `og:url`.
    pub(crate) fn apply(&mut self, metadata: PageMetadata) {
        self.title = metadata.title.unwrap_or_default();
        self.image = metadata.image.unwrap_or_default();
        self.description = metadata.description.unwrap_or_default();
        self.metadata = metadata.raw;
        self.status = LoadStatus::Loaded;
    }
}
