//! Viewer configuration embedded in the page.
//!
//! The host page carries a `<script type="application/json" id="viewer-config">`
//! block. Missing fields take defaults; a missing `base_url` falls back to the
//! page origin so share links point back at whoever served the page.

#[cfg(test)]
#[path = "page_test.rs"]
mod page_test;

use viewer::ViewerError;
use viewer::config::ViewerConfig;

/// Id of the embedded JSON config element.
pub const CONFIG_ELEMENT_ID: &str = "viewer-config";

/// Build the viewer config from the embedded JSON (if any) and the page
/// origin.
///
/// # Errors
///
/// Returns [`ViewerError::Config`] when the JSON is malformed or the result
/// fails validation.
pub fn page_config(raw: Option<&str>, origin: &str) -> Result<ViewerConfig, ViewerError> {
    let mut config = match raw.map(str::trim).filter(|r| !r.is_empty()) {
        Some(raw) => serde_json::from_str::<ViewerConfig>(raw).map_err(|e| ViewerError::Config(e.to_string()))?,
        None => ViewerConfig::default(),
    };
    if config.base_url.trim().is_empty() {
        origin.clone_into(&mut config.base_url);
    }
    config.normalized().validate()
}
