//! Model source resolution: metadata lookup, content URL, reachability probe.
//!
//! Failure at any step is terminal for the current load. Nothing is retried.

#[cfg(test)]
#[path = "resolve_test.rs"]
mod resolve_test;

use async_trait::async_trait;

use crate::asset::ModelAsset;
use crate::config::StoreConfig;
use crate::error::{UnreachableCategory, ViewerError};
use crate::store::MetadataStore;

/// Answer to a `HEAD` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResponse {
    pub status: u16,
    pub status_text: String,
}

impl ProbeResponse {
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transport-level probe failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProbeError {
    #[error("request timed out")]
    Timeout,
    #[error("{0}")]
    Network(String),
}

/// Lightweight existence check for content URLs.
#[async_trait(?Send)]
pub trait ContentProbe {
    async fn head(&self, url: &str) -> Result<ProbeResponse, ProbeError>;
}

/// A model record together with its verified content URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedModel {
    pub asset: ModelAsset,
    pub content_url: String,
}

/// Public content URL for `asset`: the recorded URL, else the storage path
/// under the store's public object endpoint.
///
/// # Errors
///
/// Returns [`ViewerError::AssetUnreachable`] when the record has neither.
pub fn content_url(asset: &ModelAsset, store: &StoreConfig) -> Result<String, ViewerError> {
    if let Some(url) = asset.asset_url.as_deref().filter(|u| !u.trim().is_empty()) {
        return Ok(url.to_owned());
    }
    if let Some(path) = asset.file_path.as_deref().filter(|p| !p.trim().is_empty()) {
        if store.url.is_empty() {
            return Err(ViewerError::Config("store url is required to resolve storage paths".into()));
        }
        return Ok(format!(
            "{}/storage/v1/object/public/{}/{}",
            store.url.trim_end_matches('/'),
            store.bucket,
            path.trim_start_matches('/')
        ));
    }
    Err(ViewerError::AssetUnreachable {
        category: UnreachableCategory::Other,
        detail: format!("model {} has no file location", asset.id),
    })
}

/// Categorize a transport failure message.
#[must_use]
pub fn classify_transport(error: &ProbeError) -> UnreachableCategory {
    match error {
        ProbeError::Timeout => UnreachableCategory::Timeout,
        ProbeError::Network(message) => {
            let lower = message.to_ascii_lowercase();
            if lower.contains("cors") || lower.contains("cross-origin") {
                UnreachableCategory::Cors
            } else if lower.contains("timeout") || lower.contains("timed out") {
                UnreachableCategory::Timeout
            } else {
                UnreachableCategory::Other
            }
        }
    }
}

/// Probe `url` and turn anything but a 2xx answer into `AssetUnreachable`.
///
/// # Errors
///
/// Returns [`ViewerError::AssetUnreachable`] categorized as not-found (404),
/// CORS, timeout, or other.
pub async fn verify_reachable<P: ContentProbe + ?Sized>(probe: &P, url: &str) -> Result<(), ViewerError> {
    match probe.head(url).await {
        Ok(resp) if resp.is_success() => Ok(()),
        Ok(resp) => {
            let category = match resp.status {
                404 | 410 => UnreachableCategory::NotFound,
                408 | 504 => UnreachableCategory::Timeout,
                _ => UnreachableCategory::Other,
            };
            Err(ViewerError::AssetUnreachable {
                category,
                detail: format!("HTTP {}: {}", resp.status, resp.status_text),
            })
        }
        Err(err) => Err(ViewerError::AssetUnreachable { category: classify_transport(&err), detail: err.to_string() }),
    }
}

/// Resolve a model identifier to a verified content URL.
///
/// # Errors
///
/// - [`ViewerError::DatabaseUnavailable`] when the store call fails
/// - [`ViewerError::ModelNotFound`] when no public record exists
/// - [`ViewerError::AssetUnreachable`] when the content URL fails the probe
pub async fn resolve_model<S, P>(
    store: &S,
    probe: &P,
    store_config: &StoreConfig,
    id: &str,
) -> Result<ResolvedModel, ViewerError>
where
    S: MetadataStore + ?Sized,
    P: ContentProbe + ?Sized,
{
    let asset = store
        .get(id)
        .await
        .map_err(|e| ViewerError::DatabaseUnavailable(e.to_string()))?
        .ok_or_else(|| ViewerError::ModelNotFound { id: id.to_owned() })?;

    let content_url = content_url(&asset, store_config)?;
    tracing::debug!(model_id = %asset.id, url = %content_url, "probing model content");
    verify_reachable(probe, &content_url).await?;

    Ok(ResolvedModel { asset, content_url })
}
