//! Viewer configuration.
//!
//! Hosts build this from their own sources: the CLI from flags and `VIEWER_*`
//! environment variables, the web host from a JSON block embedded in the
//! page. Every field has a default so partial documents deserialize.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::consts::{AUTO_ROTATE_RADIANS_PER_SEC, LOAD_TIMEOUT, QR_SIZE_PX, TARGET_SIZE};
use crate::error::ViewerError;

pub const DEFAULT_QR_SERVICE_URL: &str = "https://api.qrserver.com/v1/create-qr-code/";
pub const DEFAULT_VIEWER_PATH: &str = "viewer.html";
pub const DEFAULT_BUCKET: &str = "3d-models";
pub const DEFAULT_MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// Metadata store and storage bucket location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Base URL of the hosted store, e.g. `https://project.supabase.co`.
    pub url: String,
    /// Public (anonymous) API key sent with every request.
    pub anon_key: String,
    /// Storage bucket holding model files.
    pub bucket: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { url: String::new(), anon_key: String::new(), bucket: DEFAULT_BUCKET.to_owned() }
    }
}

/// Full viewer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub store: StoreConfig,
    /// Public origin the viewer pages are served from; share links start here.
    pub base_url: String,
    /// Path of the viewer page relative to `base_url`.
    pub viewer_path: String,
    /// QR image service endpoint.
    pub qr_service_url: String,
    /// Requested QR image edge length, in pixels.
    pub qr_size: u32,
    /// Largest dimension of the framed preview asset.
    pub target_size: f32,
    /// Import timeout, in seconds.
    pub load_timeout_secs: u64,
    /// Preview auto-rotation speed, in radians per second.
    pub auto_rotate_speed: f32,
    /// Upload limit shown in model info; uploads themselves happen elsewhere.
    pub max_file_size: u64,
    pub allowed_formats: Vec<String>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            base_url: String::new(),
            viewer_path: DEFAULT_VIEWER_PATH.to_owned(),
            qr_service_url: DEFAULT_QR_SERVICE_URL.to_owned(),
            qr_size: QR_SIZE_PX,
            target_size: TARGET_SIZE,
            load_timeout_secs: LOAD_TIMEOUT.as_secs(),
            auto_rotate_speed: AUTO_ROTATE_RADIANS_PER_SEC,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            allowed_formats: vec![".glb".to_owned(), ".gltf".to_owned()],
        }
    }
}

impl ViewerConfig {
    /// Parse a JSON config document. Missing fields take defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ViewerError::Config`] when the JSON is malformed or fails
    /// validation.
    pub fn from_json(raw: &str) -> Result<Self, ViewerError> {
        let config: Self = serde_json::from_str(raw).map_err(|e| ViewerError::Config(e.to_string()))?;
        config.normalized().validate()
    }

    /// Trim trailing slashes from URL fields.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.base_url = self.base_url.trim_end_matches('/').to_owned();
        self.store.url = self.store.url.trim_end_matches('/').to_owned();
        self.viewer_path = self.viewer_path.trim_start_matches('/').to_owned();
        self
    }

    /// Check invariants the rest of the viewer relies on.
    ///
    /// # Errors
    ///
    /// Returns [`ViewerError::Config`] naming the first offending field.
    pub fn validate(self) -> Result<Self, ViewerError> {
        if self.base_url.is_empty() {
            return Err(ViewerError::Config("base_url must not be empty".into()));
        }
        if self.qr_service_url.is_empty() {
            return Err(ViewerError::Config("qr_service_url must not be empty".into()));
        }
        if self.qr_size == 0 {
            return Err(ViewerError::Config("qr_size must be positive".into()));
        }
        if !(self.target_size.is_finite() && self.target_size > 0.0) {
            return Err(ViewerError::Config("target_size must be a positive number".into()));
        }
        if self.load_timeout_secs == 0 {
            return Err(ViewerError::Config("load_timeout_secs must be positive".into()));
        }
        Ok(self)
    }

    #[must_use]
    pub fn load_timeout(&self) -> Duration {
        Duration::from_secs(self.load_timeout_secs)
    }

    /// Absolute URL of the viewer page.
    #[must_use]
    pub fn viewer_page_url(&self) -> String {
        format!("{}/{}", self.base_url, self.viewer_path)
    }
}
