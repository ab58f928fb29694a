use crate::PreviewError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const OG_TITLE: &str = "og:title";
pub const OG_IMAGE: &str = "og:image";
pub const OG_DESCRIPTION: &str = "og:description";
pub const OG_URL: &str = "og:url";

/// Display fields resolved from a metadata service payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageMetadata {
    pub title: Option<String>,
    pub image: Option<String>,
    pub description: Option<String>,
    pub canonical_url: Option<String>,
    /// The payload object exactly as received.
    pub raw: Map<String, Value>,
}

impl PageMetadata {
    /// Resolves display fields from a response body.
    ///
    /// The service wraps its answer as `{ "data": { ... } }`; a bare object
    /// is accepted too. Missing keys never fail, they just leave the field
    /// empty.
    pub fn from_value(value: Value) -> Result<Self, PreviewError> {
        let mut object = match value {
            Value::Object(object) => object,
            other => {
                return Err(PreviewError::ParseError(format!(
                    "expected a JSON object, got {}",
                    json_kind(&other)
                )))
            }
        };

        let payload = match object.remove("data") {
            Some(Value::Object(inner)) => inner,
            Some(other) => {
                object.insert("data".to_string(), other);
                object
            }
            None => object,
        };

        Ok(Self::from_map(payload))
    }

    pub fn from_map(raw: Map<String, Value>) -> Self {
        Self {
            title: first_present(&raw, &[OG_TITLE, "title"]),
            image: first_present(&raw, &[OG_IMAGE, "logo"]),
            description: first_present(&raw, &[OG_DESCRIPTION]),
            canonical_url: first_present(&raw, &[OG_URL]),
            raw,
        }
    }

    pub fn from_slice(body: &[u8]) -> Result<Self, PreviewError> {
        let value: Value =
            serde_json::from_slice(body).map_err(|e| PreviewError::ParseError(e.to_string()))?;
        Self::from_value(value)
    }
}

// Only non-empty strings count; anything else falls through to the next key.
fn first_present(raw: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| raw.get(*key).and_then(Value::as_str))
        .find(|s| !s.is_empty())
        .map(String::from)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_open_graph_fields() {
        let meta = PageMetadata::from_value(json!({
            "og:title": "A",
            "og:image": "b.png",
            "og:description": "D"
        }))
        .unwrap();

        assert_eq!(meta.title.as_deref(), Some("A"));
        assert_eq!(meta.image.as_deref(), Some("b.png"));
        assert_eq!(meta.description.as_deref(), Some("D"));
        assert_eq!(meta.canonical_url, None);
    }

    #[test]
    fn test_fallback_keys() {
        let meta = PageMetadata::from_value(json!({
            "title": "Fallback",
            "logo": "https://example.com/logo.svg"
        }))
        .unwrap();

        assert_eq!(meta.title.as_deref(), Some("Fallback"));
        assert_eq!(meta.image.as_deref(), Some("https://example.com/logo.svg"));
        assert_eq!(meta.description, None);
    }

    #[test]
    fn test_empty_and_non_string_values_fall_through() {
        let meta = PageMetadata::from_value(json!({
            "og:title": "",
            "title": "Plain",
            "og:image": ["not", "a", "string"],
            "logo": "logo.png"
        }))
        .unwrap();

        assert_eq!(meta.title.as_deref(), Some("Plain"));
        assert_eq!(meta.image.as_deref(), Some("logo.png"));
    }

    #[test]
    fn test_data_envelope_is_unwrapped() {
        let meta = PageMetadata::from_value(json!({
            "status": 200,
            "data": { "og:title": "Inside", "og:url": "https://example.com/" }
        }))
        .unwrap();

        assert_eq!(meta.title.as_deref(), Some("Inside"));
        assert_eq!(meta.canonical_url.as_deref(), Some("https://example.com/"));
        assert!(meta.raw.contains_key("og:url"));
        assert!(!meta.raw.contains_key("status"));
    }

    #[test]
    fn test_non_object_data_is_kept_in_place() {
        let meta = PageMetadata::from_value(json!({ "data": "nope", "title": "T" })).unwrap();
        assert_eq!(meta.title.as_deref(), Some("T"));
        assert_eq!(meta.raw.get("data"), Some(&json!("nope")));
    }

    #[test]
    fn test_non_object_payload_is_rejected() {
        assert!(matches!(
            PageMetadata::from_value(json!(["og:title"])),
            Err(PreviewError::ParseError(_))
        ));
        assert!(matches!(
            PageMetadata::from_slice(b"<html>"),
            Err(PreviewError::ParseError(_))
        ));
    }
}
