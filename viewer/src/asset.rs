//! Model metadata and launch parameters.
//!
//! `ModelAsset` is the metadata record as stored by the hosted database and
//! delivered as JSON. It is read-only once a viewing session starts.

#[cfg(test)]
#[path = "asset_test.rs"]
mod asset_test;

use serde::{Deserialize, Deserializer, Serialize};

/// A model record from the metadata store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelAsset {
    /// Record identifier; numeric ids are normalized to strings.
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Explicit public URL of the model file, when recorded.
    #[serde(rename = "file_url", default)]
    pub asset_url: Option<String>,
    /// Storage-relative path of the model file, e.g. `models/123-abc.glb`.
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(rename = "file_size", default)]
    pub size_bytes: u64,
    #[serde(default)]
    pub upload_date: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: Vec<String>,
    #[serde(default = "default_public")]
    pub is_public: bool,
}

impl ModelAsset {
    /// Upload timestamp, preferring the row creation time.
    #[must_use]
    pub fn uploaded_at(&self) -> Option<&str> {
        self.created_at.as_deref().or(self.upload_date.as_deref())
    }
}

fn default_public() -> bool {
    true
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("expected string or number id, got {other}"))),
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// What the rendering adapter should import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetSource {
    /// A resolved, reachable model URL.
    Url(String),
    /// Built-in unit cube used in demo mode.
    DemoCube,
}

/// Parameters read from the viewer page URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchParams {
    /// Model identifier (`id`); absent means demo mode.
    pub model_id: Option<String>,
    /// Start AR as soon as the viewer is ready (`ar=true`).
    pub auto_start_ar: bool,
}

impl LaunchParams {
    /// Parse a query string, with or without the leading `?`.
    #[must_use]
    pub fn from_query(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut params = Self::default();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "id" => {
                    let id = value.trim();
                    if !id.is_empty() {
                        params.model_id = Some(id.to_owned());
                    }
                }
                "ar" => params.auto_start_ar = matches!(value.as_ref(), "true" | "1"),
                _ => {}
            }
        }
        params
    }

    #[must_use]
    pub fn is_demo(&self) -> bool {
        self.model_id.is_none()
    }
}
