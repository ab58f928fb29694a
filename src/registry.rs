use crate::{MetadataCard, PreviewError};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};
use tracing::debug;

pub type Constructor = Arc<dyn Fn() -> MetadataCard + Send + Sync>;

static REGISTRY: OnceLock<RwLock<HashMap<String, Constructor>>> = OnceLock::new();

fn registry() -> &'static RwLock<HashMap<String, Constructor>> {
    REGISTRY.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Registers `constructor` under `tag`. The first definition of a tag wins;
/// later calls leave it in place and return `Ok(false)`.
pub fn define<F>(tag: &str, constructor: F) -> Result<bool, PreviewError>
where
    F: Fn() -> MetadataCard + Send + Sync + 'static,
{
    validate_tag(tag)?;

    let mut map = registry().write().unwrap_or_else(PoisonError::into_inner);
    if map.contains_key(tag) {
        debug!(tag = %tag, "Element already defined, ignoring");
        return Ok(false);
    }
    map.insert(tag.to_string(), Arc::new(constructor));
    debug!(tag = %tag, "Element defined");
    Ok(true)
}

pub fn is_defined(tag: &str) -> bool {
    registry()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .contains_key(tag)
}

/// Builds a new card from the constructor registered for `tag`.
pub fn create(tag: &str) -> Option<MetadataCard> {
    let constructor = registry()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(tag)
        .cloned()?;
    Some(constructor())
}

/// Defines `link-preview` with the default HTTP-backed card.
pub fn register_link_preview() -> bool {
    define(MetadataCard::TAG, MetadataCard::default).unwrap_or(false)
}

// Custom element names: lowercase ASCII letter first, at least one hyphen,
// no uppercase or whitespace.
fn validate_tag(tag: &str) -> Result<(), PreviewError> {
    let starts_lower = tag.chars().next().is_some_and(|c| c.is_ascii_lowercase());
    let valid_chars = tag
        .chars()
        .all(|c| !c.is_ascii_uppercase() && !c.is_whitespace() && c != '/' && c != '>');

    if starts_lower && tag.contains('-') && valid_chars {
        Ok(())
    } else {
        Err(PreviewError::InvalidTagName(tag.to_string()))
    }
}
