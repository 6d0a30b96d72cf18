//! Pure mapping from viewer state to what the page shows.
//!
//! Nothing here owns state or enforces invariants; hosts call
//! [`present`] after every change and apply the result to their DOM (or
//! terminal).

#[cfg(test)]
#[path = "presenter_test.rs"]
mod presenter_test;

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;

use crate::ar::{ArPhase, Tracking};
use crate::asset::ModelAsset;
use crate::error::ViewerError;
use crate::session::{LoadStage, LoadState};
use crate::share::{QR_FAILED_PLACEHOLDER, QrImageState, ShareMode, ShareTarget};

pub const DEFAULT_DESCRIPTION: &str = "Interactive 3D model with WebXR AR support";
pub const DEMO_TITLE: &str = "Demo - WebXR AR Cube";
pub const DEMO_DESCRIPTION: &str =
    "Demo of WebXR AR capabilities. Upload models in the gallery to view your own 3D models here.";

/// Everything the presenter reads.
#[derive(Debug, Clone, Copy)]
pub struct ViewState<'a> {
    pub load: &'a LoadState,
    pub phase: ArPhase,
    pub placements: usize,
    /// `None` while the capability probe is pending.
    pub ar_supported: Option<bool>,
    /// Last AR acquisition failure, cleared on the next attempt.
    pub ar_error: Option<&'a ViewerError>,
    pub asset: Option<&'a ModelAsset>,
    pub demo: bool,
    pub auto_rotate: bool,
    pub share_mode: ShareMode,
    pub share: &'a ShareTarget,
    pub qr: QrImageState,
    pub fullscreen: bool,
}

/// Top-level screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Loading { text: String },
    Error { message: String },
    Main,
}

/// Model details panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelInfo {
    pub title: String,
    pub description: String,
    pub size: String,
    pub date: String,
    pub tags: Vec<String>,
}

/// QR panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareView {
    pub mode: ShareMode,
    pub url: String,
    /// `None` once the image failed; show `placeholder` instead.
    pub qr_image_url: Option<String>,
    pub placeholder: Option<&'static str>,
    pub instructions: &'static str,
}

/// Visible UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewModel {
    pub screen: Screen,
    /// AR is unavailable; the preview still works.
    pub unsupported_notice: bool,
    pub show_start_ar: bool,
    pub start_ar_enabled: bool,
    pub show_exit_ar: bool,
    pub show_place: bool,
    pub place_enabled: bool,
    pub show_reset_placements: bool,
    pub ar_status: Option<String>,
    pub auto_rotate: bool,
    pub model_info: Option<ModelInfo>,
    pub share: Option<ShareView>,
    pub demo: bool,
    pub fullscreen: bool,
}

/// Document description and Open Graph tags for a loaded model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageMeta {
    /// Content of `<meta name="description">`.
    pub description: String,
    /// `(property, content)` pairs for `<meta property=...>`.
    pub open_graph: Vec<(&'static str, String)>,
}

/// Map state to the visible UI.
#[must_use]
pub fn present(state: &ViewState<'_>) -> ViewModel {
    let screen = match state.load {
        LoadState::Loading { stage, progress } => Screen::Loading { text: loading_text(*stage, *progress) },
        LoadState::Failed(err) => Screen::Error { message: err.user_message() },
        LoadState::Ready => Screen::Main,
    };

    if screen != Screen::Main {
        return ViewModel {
            screen,
            unsupported_notice: false,
            show_start_ar: false,
            start_ar_enabled: false,
            show_exit_ar: false,
            show_place: false,
            place_enabled: false,
            show_reset_placements: false,
            ar_status: None,
            auto_rotate: state.auto_rotate,
            model_info: None,
            share: None,
            demo: state.demo,
            fullscreen: state.fullscreen,
        };
    }

    let supported = state.ar_supported == Some(true);
    let active = state.phase.is_active();
    ViewModel {
        screen,
        unsupported_notice: state.ar_supported == Some(false),
        show_start_ar: supported && matches!(state.phase, ArPhase::Preview | ArPhase::RequestingSession),
        start_ar_enabled: supported && state.phase == ArPhase::Preview,
        show_exit_ar: active || state.phase == ArPhase::Ending,
        show_place: active,
        place_enabled: state.phase == ArPhase::Active(Tracking::SurfaceDetected),
        show_reset_placements: active && state.placements > 0,
        ar_status: Some(ar_status(state)),
        auto_rotate: state.auto_rotate,
        model_info: Some(model_info(state)),
        share: Some(share_view(state)),
        demo: state.demo,
        fullscreen: state.fullscreen,
    }
}

/// Social-sharing metadata for `asset`, pointing at `page_url`.
#[must_use]
pub fn page_meta(asset: &ModelAsset, page_url: &str) -> PageMeta {
    let description = asset.description.as_deref().map(str::trim).filter(|d| !d.is_empty());
    PageMeta {
        description: format!("View {} in 3D and AR. {}", asset.title, description.unwrap_or_default()).trim_end().to_owned(),
        open_graph: vec![
            ("og:title", asset.title.clone()),
            ("og:description", description.unwrap_or("View this 3D model in AR").to_owned()),
            ("og:url", page_url.to_owned()),
            ("og:type", "website".to_owned()),
        ],
    }
}

fn loading_text(stage: LoadStage, progress: Option<u8>) -> String {
    match (stage, progress) {
        (LoadStage::Resolving, _) => "Loading model data...".to_owned(),
        (LoadStage::Importing, None) => "Loading 3D model...".to_owned(),
        (LoadStage::Importing, Some(pct)) => format!("Loading model... {pct}%"),
    }
}

fn ar_status(state: &ViewState<'_>) -> String {
    match state.phase {
        ArPhase::Preview => match (state.ar_supported, state.ar_error) {
            (None, _) => "Checking AR support...".to_owned(),
            (Some(false), _) => ViewerError::ArUnsupported.user_message(),
            (Some(true), Some(err)) => err.user_message(),
            (Some(true), None) => "Ready for AR".to_owned(),
        },
        ArPhase::RequestingSession => "Starting AR session...".to_owned(),
        ArPhase::Active(_) if state.placements > 0 => format!("{} model(s) placed", state.placements),
        ArPhase::Active(Tracking::Searching) => "AR session active - Look around to find surfaces".to_owned(),
        ArPhase::Active(Tracking::SurfaceDetected) => "Surface detected - Tap to place model".to_owned(),
        ArPhase::Ending => "Ending AR session...".to_owned(),
    }
}

fn model_info(state: &ViewState<'_>) -> ModelInfo {
    match state.asset {
        Some(asset) if !state.demo => ModelInfo {
            title: asset.title.clone(),
            description: asset
                .description
                .as_deref()
                .filter(|d| !d.trim().is_empty())
                .unwrap_or(DEFAULT_DESCRIPTION)
                .to_owned(),
            size: format_size_mb(asset.size_bytes),
            date: asset.uploaded_at().map(format_date).unwrap_or_default(),
            tags: asset.tags.clone(),
        },
        _ => ModelInfo {
            title: DEMO_TITLE.to_owned(),
            description: DEMO_DESCRIPTION.to_owned(),
            size: "Demo".to_owned(),
            date: "Demo".to_owned(),
            tags: Vec::new(),
        },
    }
}

fn share_view(state: &ViewState<'_>) -> ShareView {
    let failed = state.qr == QrImageState::Failed;
    ShareView {
        mode: state.share_mode,
        url: state.share.url.clone(),
        qr_image_url: (!failed).then(|| state.share.qr_image_url.clone()),
        placeholder: failed.then_some(QR_FAILED_PLACEHOLDER),
        instructions: state.share_mode.instructions(),
    }
}

// --- Formatting ---

/// Size in mebibytes with one decimal, e.g. `1.5 MB`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_size_mb(bytes: u64) -> String {
    format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
}

/// Human-readable size in the largest fitting unit, up to two decimals with
/// trailing zeros dropped: `0 B`, `512 B`, `1.5 KB`, `2 MB`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 B".to_owned();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = format!("{:.2}", (value * 100.0).round() / 100.0);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed} {}", UNITS[unit])
}

/// Long-form date ("June 15, 2025") from an RFC 3339 timestamp or a bare
/// `YYYY-MM-DD` date. Unparseable input is returned unchanged.
#[must_use]
pub fn format_date(raw: &str) -> String {
    let long = format_description!("[month repr:long] [day padding:none], [year]");
    let date = OffsetDateTime::parse(raw, &Rfc3339).map(OffsetDateTime::date).or_else(|_| {
        time::Date::parse(raw.get(..10).unwrap_or(raw), format_description!("[year]-[month]-[day]"))
    });
    match date.map(|d| d.format(long)) {
        Ok(Ok(formatted)) => formatted,
        _ => raw.to_owned(),
    }
}
