//! Metadata store collaborator.
//!
//! The hosted store speaks a PostgREST-style REST dialect. This module builds
//! the requests and decodes the responses; hosts execute them with their own
//! HTTP client (`reqwest` natively, `fetch` in the browser) and expose the
//! result through [`MetadataStore`].

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

use async_trait::async_trait;

use crate::asset::ModelAsset;
use crate::config::StoreConfig;

/// Table holding model metadata rows.
pub const MODELS_TABLE: &str = "models";

/// Errors from the metadata store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The store URL or key is missing.
    #[error("metadata store is not configured")]
    NotConfigured,
    /// Transport failure reaching the store.
    #[error("store connection failed: {0}")]
    Connection(String),
    /// The store answered with a non-success status.
    #[error("store returned status {status}")]
    Status { status: u16, body: String },
    /// The response body was not a list of model rows.
    #[error("store response decode failed: {0}")]
    Decode(String),
}

/// Read access to model metadata.
#[async_trait(?Send)]
pub trait MetadataStore {
    /// Fetch one public model by id; `Ok(None)` when no such record exists.
    async fn get(&self, id: &str) -> Result<Option<ModelAsset>, StoreError>;

    /// All public models.
    async fn list(&self) -> Result<Vec<ModelAsset>, StoreError>;
}

/// A prepared GET request against the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestRequest {
    pub url: String,
    pub headers: Vec<(&'static str, String)>,
}

impl StoreConfig {
    /// Whether enough is configured to talk to the store.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.url.is_empty() && !self.anon_key.is_empty()
    }

    /// Request for a single public model row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotConfigured`] when the URL or key is missing.
    pub fn get_request(&self, id: &str) -> Result<RestRequest, StoreError> {
        let id_filter = format!("eq.{id}");
        self.request(&[("select", "*"), ("id", id_filter.as_str()), ("is_public", "eq.true")])
    }

    /// Request for all public model rows.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotConfigured`] when the URL or key is missing.
    pub fn list_request(&self) -> Result<RestRequest, StoreError> {
        self.request(&[("select", "*"), ("is_public", "eq.true")])
    }

    fn request(&self, query: &[(&str, &str)]) -> Result<RestRequest, StoreError> {
        if !self.is_configured() {
            return Err(StoreError::NotConfigured);
        }
        let query = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(query)
            .finish();
        Ok(RestRequest {
            url: format!("{}/rest/v1/{MODELS_TABLE}?{query}", self.url.trim_end_matches('/')),
            headers: vec![
                ("apikey", self.anon_key.clone()),
                ("Authorization", format!("Bearer {}", self.anon_key)),
                ("Accept", "application/json".to_owned()),
            ],
        })
    }
}

/// Decode a JSON array of model rows.
///
/// # Errors
///
/// Returns [`StoreError::Decode`] when the body is not an array of rows.
pub fn decode_rows(body: &str) -> Result<Vec<ModelAsset>, StoreError> {
    serde_json::from_str(body).map_err(|e| StoreError::Decode(e.to_string()))
}

/// Decode a filtered response that holds at most one row.
///
/// # Errors
///
/// Returns [`StoreError::Decode`] when the body is not an array of rows.
pub fn decode_single(body: &str) -> Result<Option<ModelAsset>, StoreError> {
    Ok(decode_rows(body)?.into_iter().next())
}

/// Map a completed HTTP exchange to rows, treating non-2xx as an error.
///
/// # Errors
///
/// Returns [`StoreError::Status`] for non-success statuses and
/// [`StoreError::Decode`] for malformed bodies.
pub fn rows_from_response(status: u16, body: &str) -> Result<Vec<ModelAsset>, StoreError> {
    if !(200..300).contains(&status) {
        return Err(StoreError::Status { status, body: body.to_owned() });
    }
    decode_rows(body)
}
