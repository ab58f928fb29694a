use crate::utils::truncate_str;
use crate::{Fetcher, LoadStatus, MetadataSource, PageMetadata, PreviewError, PreviewState};
use futures::FutureExt;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument};

/// Attributes a card reacts to or reflects.
pub const OBSERVED_ATTRIBUTES: [&str; 6] =
    ["title", "image", "description", "url", "loading", "fancy"];

struct Inner {
    state: PreviewState,
    // Bumped on every fetch start; a fetch may only commit under the
    // generation it was started with.
    generation: u64,
}

struct Shared {
    inner: Mutex<Inner>,
    notifier: watch::Sender<PreviewState>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn mutate(&self, f: impl FnOnce(&mut PreviewState)) {
        let mut inner = self.lock();
        f(&mut inner.state);
        self.notifier.send_replace(inner.state.clone());
    }
}

/// A link preview card: watches its `url`, fetches metadata for it and
/// renders the result.
///
/// Clones are handles to the same card.
#[derive(Clone)]
pub struct MetadataCard {
    source: Arc<dyn MetadataSource>,
    shared: Arc<Shared>,
}

impl Default for MetadataCard {
    fn default() -> Self {
        Self::with_fetcher(Fetcher::new())
    }
}

impl fmt::Debug for MetadataCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetadataCard")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl MetadataCard {
    pub const TAG: &'static str = "link-preview";

    pub fn new(source: Arc<dyn MetadataSource>) -> Self {
        let (notifier, _rx) = watch::channel(PreviewState::default());
        Self {
            source,
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    state: PreviewState::default(),
                    generation: 0,
                }),
                notifier,
            }),
        }
    }

    pub fn with_fetcher(fetcher: Fetcher) -> Self {
        Self::new(Arc::new(fetcher))
    }

    /// Sets the target URL. A value different from the current one starts a
    /// fetch on the current tokio runtime and returns its handle; an equal
    /// value does nothing. An empty value returns the card to `Idle`.
    pub fn set_url(&self, url: impl Into<String>) -> Option<JoinHandle<()>> {
        let url = url.into();

        {
            let mut inner = self.shared.lock();
            if inner.state.url == url {
                return None;
            }
            if url.is_empty() {
                inner.generation += 1;
                inner.state.url.clear();
                inner.state.status = LoadStatus::Idle;
                self.shared.notifier.send_replace(inner.state.clone());
                debug!("URL cleared, card is idle");
                return None;
            }
        }

        let generation = self.begin(&url);

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                error!(error = %e, url = %url, "No tokio runtime available for metadata fetch");
                self.settle(
                    generation,
                    &url,
                    Err(PreviewError::NetworkFailure(e.to_string())),
                );
                return None;
            }
        };

        let card = self.clone();
        Some(runtime.spawn(async move {
            let result = card.query_source(&url).await;
            card.settle(generation, &url, result);
        }))
    }

    /// Fetches metadata for `url` and waits for it to settle, even if `url`
    /// is already the current one. Returns the card's status afterwards.
    #[instrument(level = "debug", skip(self))]
    pub async fn fetch_metadata(&self, url: &str) -> LoadStatus {
        if url.is_empty() {
            let err = PreviewError::InvalidUrl("empty target URL".to_string());
            err.log();
            return self.status();
        }

        let generation = self.begin(url);
        let result = self.query_source(url).await;
        self.settle(generation, url, result);
        self.status()
    }

    // A panicking source counts as a failed fetch so the card still settles.
    async fn query_source(&self, url: &str) -> Result<PageMetadata, PreviewError> {
        AssertUnwindSafe(self.source.fetch_metadata(url))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                Err(PreviewError::SourcePanicked(message))
            })
    }

    fn begin(&self, url: &str) -> u64 {
        let mut inner = self.shared.lock();
        inner.generation += 1;
        inner.state.url = url.to_string();
        inner.state.status = LoadStatus::Loading;
        self.shared.notifier.send_replace(inner.state.clone());
        debug!(url = %url, generation = inner.generation, "Metadata fetch started");
        inner.generation
    }

    /// Commits a fetch result if it is still the latest fetch for the
    /// current URL. Returns whether it was committed.
    fn settle(
        &self,
        generation: u64,
        url: &str,
        result: Result<PageMetadata, PreviewError>,
    ) -> bool {
        let mut inner = self.shared.lock();
        if inner.generation != generation || inner.state.url != url {
            debug!(
                url = %url,
                generation,
                current = inner.generation,
                failed = result.is_err(),
                "Discarding superseded metadata fetch"
            );
            return false;
        }

        match result {
            Ok(metadata) => {
                inner.state.apply(metadata);
                info!(
                    url = %url,
                    title = %truncate_str(&inner.state.title, 60),
                    "Metadata loaded"
                );
            }
            Err(e) => {
                e.log();
                inner.state.status = LoadStatus::Failed;
            }
        }
        self.shared.notifier.send_replace(inner.state.clone());
        true
    }

    /// Waits until no fetch is in flight and returns the state at that point.
    pub async fn settled(&self) -> PreviewState {
        let mut rx = self.subscribe();
        let state = match rx.wait_for(|state| state.status.is_settled()).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        };
        state
    }

    /// Receives every committed state change.
    pub fn subscribe(&self) -> watch::Receiver<PreviewState> {
        self.shared.notifier.subscribe()
    }

    pub fn state(&self) -> PreviewState {
        self.shared.lock().state.clone()
    }

    pub fn render(&self) -> String {
        crate::render::render(&self.state())
    }

    pub fn url(&self) -> String {
        self.shared.lock().state.url.clone()
    }

    pub fn title(&self) -> String {
        self.shared.lock().state.title.clone()
    }

    pub fn image(&self) -> String {
        self.shared.lock().state.image.clone()
    }

    pub fn description(&self) -> String {
        self.shared.lock().state.description.clone()
    }

    pub fn status(&self) -> LoadStatus {
        self.shared.lock().state.status
    }

    pub fn loading(&self) -> bool {
        self.status() == LoadStatus::Loading
    }

    pub fn fancy(&self) -> bool {
        self.shared.lock().state.fancy
    }

    pub fn metadata(&self) -> serde_json::Map<String, serde_json::Value> {
        self.shared.lock().state.metadata.clone()
    }

    pub fn set_title(&self, title: impl Into<String>) {
        let title = title.into();
        self.shared.mutate(|state| state.title = title);
    }

    pub fn set_image(&self, image: impl Into<String>) {
        let image = image.into();
        self.shared.mutate(|state| state.image = image);
    }

    pub fn set_description(&self, description: impl Into<String>) {
        let description = description.into();
        self.shared.mutate(|state| state.description = description);
    }

    pub fn set_fancy(&self, fancy: bool) {
        self.shared.mutate(|state| state.fancy = fancy);
    }

    /// Sets an attribute by name. Setting `url` may start a fetch, whose
    /// handle is returned.
    pub fn set_attribute(
        &self,
        name: &str,
        value: &str,
    ) -> Result<Option<JoinHandle<()>>, PreviewError> {
        match name {
            "url" => return Ok(self.set_url(value)),
            "title" => self.set_title(value),
            "image" => self.set_image(value),
            "description" => self.set_description(value),
            "fancy" => self.set_fancy(!value.eq_ignore_ascii_case("false")),
            "loading" => return Err(PreviewError::ReadOnlyAttribute(name.to_string())),
            _ => return Err(PreviewError::UnknownAttribute(name.to_string())),
        }
        Ok(None)
    }

    /// Reads an attribute. Boolean attributes are `Some("")` when set and
    /// `None` when not.
    pub fn get_attribute(&self, name: &str) -> Result<Option<String>, PreviewError> {
        let inner = self.shared.lock();
        let state = &inner.state;
        let value = match name {
            "url" => Some(state.url.clone()),
            "title" => Some(state.title.clone()),
            "image" => Some(state.image.clone()),
            "description" => Some(state.description.clone()),
            "loading" => state.loading().then(String::new),
            "fancy" => state.fancy.then(String::new),
            _ => return Err(PreviewError::UnknownAttribute(name.to_string())),
        };
        Ok(value)
    }

    pub fn remove_attribute(&self, name: &str) -> Result<(), PreviewError> {
        match name {
            "url" => {
                self.set_url("");
            }
            "title" => self.set_title(""),
            "image" => self.set_image(""),
            "description" => self.set_description(""),
            "fancy" => self.set_fancy(false),
            "loading" => return Err(PreviewError::ReadOnlyAttribute(name.to_string())),
            _ => return Err(PreviewError::UnknownAttribute(name.to_string())),
        }
        Ok(())
    }
}
