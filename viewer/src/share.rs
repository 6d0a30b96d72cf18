//! Share links and QR image requests.
//!
//! QR codes are rendered by an external image service; this module only
//! builds the request URL and tracks whether the image loaded.

#[cfg(test)]
#[path = "share_test.rs"]
mod share_test;

use serde::{Deserialize, Serialize};

use crate::config::ViewerConfig;

/// Placeholder text shown in place of a QR image that failed to load.
pub const QR_FAILED_PLACEHOLDER: &str = "QR Code generation failed";

/// Which page a share link opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShareMode {
    /// Launch straight into AR (`ar=true`).
    #[default]
    Direct,
    /// Open the viewer page; the user starts AR from there.
    Webpage,
}

impl ShareMode {
    #[must_use]
    pub fn auto_start_ar(self) -> bool {
        matches!(self, Self::Direct)
    }

    /// Short instruction shown under the QR image.
    #[must_use]
    pub fn instructions(self) -> &'static str {
        match self {
            Self::Direct => "Direct WebXR AR: Scan to launch AR experience immediately",
            Self::Webpage => "Webpage First: Scan to open model page, then tap \"Start AR\"",
        }
    }
}

/// A share link and the QR image that encodes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareTarget {
    pub url: String,
    pub qr_image_url: String,
}

impl ShareTarget {
    /// Build the target for `model_id` (`None` in demo mode) in `mode`.
    #[must_use]
    pub fn new(config: &ViewerConfig, model_id: Option<&str>, mode: ShareMode) -> Self {
        let url = share_url(config, model_id, mode);
        let qr_image_url = qr_image_url(config, &url);
        Self { url, qr_image_url }
    }
}

/// Viewer page link, with `id` unless in demo mode and `ar=true` in direct
/// mode.
#[must_use]
pub fn share_url(config: &ViewerConfig, model_id: Option<&str>, mode: ShareMode) -> String {
    let mut query = url::form_urlencoded::Serializer::new(String::new());
    if let Some(id) = model_id {
        query.append_pair("id", id);
    }
    if mode.auto_start_ar() {
        query.append_pair("ar", "true");
    }
    let query = query.finish();
    let page = config.viewer_page_url();
    if query.is_empty() { page } else { format!("{page}?{query}") }
}

/// Image-service request for a QR code encoding `target`.
#[must_use]
pub fn qr_image_url(config: &ViewerConfig, target: &str) -> String {
    let size = format!("{0}x{0}", config.qr_size);
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("size", &size)
        .append_pair("data", target)
        .finish();
    format!("{}?{query}", config.qr_service_url)
}

/// Load state of the QR `<img>` (or equivalent).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QrImageState {
    #[default]
    Loading,
    Ready,
    Failed,
}

/// Payload for the platform share sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SharePayload {
    pub title: String,
    pub text: String,
    pub url: String,
}

impl SharePayload {
    /// Shares always point at the viewer page, never straight into AR.
    #[must_use]
    pub fn new(config: &ViewerConfig, model_id: Option<&str>, title: &str) -> Self {
        Self {
            title: title.to_owned(),
            text: format!("Check out this 3D model with WebXR AR: {title}"),
            url: share_url(config, model_id, ShareMode::Webpage),
        }
    }
}

/// File name offered when downloading the QR image.
#[must_use]
pub fn qr_download_filename(title: &str) -> String {
    format!("{}_QR.png", file_stem(title))
}

/// File name offered for a PNG capture of the preview canvas.
#[must_use]
pub fn screenshot_filename(title: &str) -> String {
    format!("{}-screenshot.png", file_stem(title))
}

/// `title` with path and shell-hostile characters replaced; `model` when blank.
fn file_stem(title: &str) -> String {
    let title = title.trim();
    let title = if title.is_empty() { "model" } else { title };
    title.chars().map(|c| if matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|') { '_' } else { c }).collect()
}
