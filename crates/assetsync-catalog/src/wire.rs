//! Wire shapes of the Content Management API.
//!
//! Asset `fields` stay as raw JSON so a read-modify-write cycle preserves
//! locales and fields this client does not know about.

use serde::Deserialize;
use serde_json::{json, Map, Value};

/// `sys` block of any entity.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Sys {
    pub id: String,
    #[serde(default)]
    pub version: Option<u64>,
}

/// An asset as returned by the management API.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Asset {
    pub sys: Sys,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl Asset {
    /// Localized title, empty when missing.
    pub fn title(&self, locale: &str) -> String {
        self.fields
            .get("title")
            .and_then(|t| t.get(locale))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }

    /// Set one localized field.
    pub fn set_localized(&mut self, field: &str, locale: &str, value: Value) {
        let entry = self
            .fields
            .entry(field.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        if let Value::Object(map) = entry {
            map.insert(locale.to_string(), value);
        }
    }

    /// Whether processing produced a URL for the localized file.
    pub fn is_processed(&self, locale: &str) -> bool {
        self.fields
            .get("file")
            .and_then(|f| f.get(locale))
            .and_then(|f| f.get("url"))
            .is_some()
    }

    pub fn body(&self) -> Value {
        json!({ "fields": self.fields })
    }
}

/// One page of a collection.
#[derive(Debug, Deserialize)]
pub(crate) struct Collection<T> {
    pub items: Vec<T>,
    #[serde(default)]
    pub total: u64,
}

/// Body of a freshly created asset.
pub(crate) fn new_asset_body(
    locale: &str,
    display_name: &str,
    description: &str,
    file_name: &str,
) -> Value {
    json!({
        "fields": {
            "title": { locale: display_name },
            "description": { locale: description },
            "file": {
                locale: {
                    "contentType": content_type(file_name),
                    "fileName": file_name,
                }
            }
        }
    })
}

/// File field pointing at an upload.
pub(crate) fn upload_link(file_name: &str, upload_id: &str) -> Value {
    json!({
        "contentType": content_type(file_name),
        "fileName": file_name,
        "uploadFrom": {
            "sys": { "type": "Link", "linkType": "Upload", "id": upload_id }
        }
    })
}

fn content_type(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "image/jpeg",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_localized_keeps_other_locales() {
        let mut asset: Asset = serde_json::from_value(json!({
            "sys": { "id": "a1", "version": 3 },
            "fields": { "title": { "en-US": "Rose", "de-DE": "Rose" } }
        }))
        .unwrap();

        asset.set_localized("title", "en-US", json!("Tulip"));
        asset.set_localized("description", "en-US", json!("Yellow"));

        assert_eq!(asset.title("en-US"), "Tulip");
        assert_eq!(asset.fields["title"]["de-DE"], "Rose");
        assert_eq!(asset.fields["description"]["en-US"], "Yellow");
    }

    #[test]
    fn test_new_asset_body_shape() {
        let body = new_asset_body("en-US", "Rose", "Red", "$Rose-Red.jpg");
        assert_eq!(body["fields"]["title"]["en-US"], "Rose");
        assert_eq!(body["fields"]["file"]["en-US"]["contentType"], "image/jpeg");
        assert_eq!(body["fields"]["file"]["en-US"]["fileName"], "$Rose-Red.jpg");
    }

    #[test]
    fn test_processed_requires_url() {
        let mut asset: Asset =
            serde_json::from_value(json!({ "sys": { "id": "a1" }, "fields": {} })).unwrap();
        assert!(!asset.is_processed("en-US"));

        asset.set_localized("file", "en-US", json!({ "url": "//images/a1.jpg" }));
        assert!(asset.is_processed("en-US"));
    }
}
