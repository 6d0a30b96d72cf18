//! Page element ids and the view-model-to-DOM patch.
//!
//! The viewer page markup is static. Every visible change goes through
//! [`patch`], which flattens a [`ViewModel`] into element updates; the
//! browser host applies the list and never decides visibility itself.

#[cfg(test)]
#[path = "dom_test.rs"]
mod dom_test;

use viewer::presenter::{Screen, ViewModel};
use viewer::session::NoticeKind;
use viewer::share::ShareMode;

/// Element ids the viewer page must provide.
pub mod ids {
    pub const CANVAS: &str = "viewerCanvas";
    pub const LOADING_SCREEN: &str = "loadingScreen";
    pub const LOADING_TEXT: &str = "loadingText";
    pub const ERROR_SCREEN: &str = "errorScreen";
    pub const ERROR_MESSAGE: &str = "errorMessage";
    pub const UNSUPPORTED_NOTICE: &str = "unsupportedScreen";
    pub const AR_CONTAINER: &str = "arContainer";
    pub const AR_STATUS: &str = "arStatus";
    pub const AR_INSTRUCTIONS: &str = "arInstructions";
    pub const START_AR: &str = "startARBtn";
    pub const EXIT_AR: &str = "exitARBtn";
    pub const PLACE_MODEL: &str = "placeModelBtn";
    pub const RESET_PLACEMENTS: &str = "resetPlacementsBtn";
    pub const TOGGLE_ROTATION: &str = "toggleRotation";
    pub const RESET_VIEW: &str = "resetView";
    pub const SCREENSHOT: &str = "takeScreenshot";
    pub const FULLSCREEN: &str = "fullscreenBtn";
    pub const MODEL_INFO: &str = "modelInfo";
    pub const MODEL_TITLE: &str = "modelTitle";
    pub const MODEL_DESCRIPTION: &str = "modelDescription";
    pub const MODEL_SIZE: &str = "modelSize";
    pub const MODEL_DATE: &str = "modelDate";
    pub const MODEL_TAGS: &str = "modelTags";
    pub const QR_SECTION: &str = "qrSection";
    pub const QR_IMAGE: &str = "qrImage";
    pub const QR_PLACEHOLDER: &str = "qrPlaceholder";
    pub const QR_INSTRUCTIONS: &str = "qrInstructions";
    pub const SHARE_URL: &str = "shareUrl";
    pub const DIRECT_AR_MODE: &str = "directARBtn";
    pub const WEBPAGE_MODE: &str = "webpageBtn";
    pub const COPY_LINK: &str = "copyLinkBtn";
    pub const DOWNLOAD_QR: &str = "downloadQRBtn";
    pub const SHARE: &str = "shareBtn";
    pub const NOTICES: &str = "notices";
}

/// Class set on `<body>` once a surface is under the reticle.
pub const STABILIZED_CLASS: &str = "stabilized";
/// Class marking the selected share mode button.
pub const ACTIVE_CLASS: &str = "active";

/// Element an update applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Id(&'static str),
    Body,
}

/// One element update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomOp {
    Show(bool),
    Text(String),
    Enabled(bool),
    Src(String),
    Class { name: &'static str, on: bool },
    /// Replace the children with one tag chip per entry.
    Tags(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomPatch {
    pub target: Target,
    pub op: DomOp,
}

fn on(id: &'static str, op: DomOp) -> DomPatch {
    DomPatch { target: Target::Id(id), op }
}

/// Flatten a view model into element updates, in document order.
#[must_use]
pub fn patch(vm: &ViewModel) -> Vec<DomPatch> {
    let mut out = Vec::new();

    let main = vm.screen == Screen::Main;
    out.push(on(ids::LOADING_SCREEN, DomOp::Show(matches!(vm.screen, Screen::Loading { .. }))));
    out.push(on(ids::ERROR_SCREEN, DomOp::Show(matches!(vm.screen, Screen::Error { .. }))));
    out.push(on(ids::AR_CONTAINER, DomOp::Show(main)));
    match &vm.screen {
        Screen::Loading { text } => out.push(on(ids::LOADING_TEXT, DomOp::Text(text.clone()))),
        Screen::Error { message } => out.push(on(ids::ERROR_MESSAGE, DomOp::Text(message.clone()))),
        Screen::Main => {}
    }
    out.push(on(ids::UNSUPPORTED_NOTICE, DomOp::Show(vm.unsupported_notice)));

    out.push(on(ids::START_AR, DomOp::Show(vm.show_start_ar)));
    out.push(on(ids::START_AR, DomOp::Enabled(vm.start_ar_enabled)));
    out.push(on(ids::EXIT_AR, DomOp::Show(vm.show_exit_ar)));
    out.push(on(ids::PLACE_MODEL, DomOp::Show(vm.show_place)));
    out.push(on(ids::PLACE_MODEL, DomOp::Enabled(vm.place_enabled)));
    out.push(on(ids::RESET_PLACEMENTS, DomOp::Show(vm.show_reset_placements)));
    out.push(on(ids::AR_INSTRUCTIONS, DomOp::Show(vm.show_place)));
    out.push(DomPatch { target: Target::Body, op: DomOp::Class { name: STABILIZED_CLASS, on: vm.place_enabled } });
    out.push(on(ids::AR_STATUS, DomOp::Show(vm.ar_status.is_some())));
    if let Some(status) = &vm.ar_status {
        out.push(on(ids::AR_STATUS, DomOp::Text(status.clone())));
    }

    // Preview controls are meaningless while the camera belongs to AR.
    let preview_controls = main && !vm.show_exit_ar;
    out.push(on(ids::TOGGLE_ROTATION, DomOp::Show(preview_controls)));
    out.push(on(ids::RESET_VIEW, DomOp::Show(preview_controls)));
    out.push(on(ids::TOGGLE_ROTATION, DomOp::Text(rotation_label(vm.auto_rotate).to_owned())));
    out.push(on(ids::SCREENSHOT, DomOp::Show(preview_controls)));
    out.push(on(ids::FULLSCREEN, DomOp::Show(preview_controls)));
    out.push(on(ids::FULLSCREEN, DomOp::Text(fullscreen_label(vm.fullscreen).to_owned())));

    out.push(on(ids::MODEL_INFO, DomOp::Show(vm.model_info.is_some())));
    if let Some(info) = &vm.model_info {
        out.push(on(ids::MODEL_TITLE, DomOp::Text(info.title.clone())));
        out.push(on(ids::MODEL_DESCRIPTION, DomOp::Text(info.description.clone())));
        out.push(on(ids::MODEL_SIZE, DomOp::Text(info.size.clone())));
        out.push(on(ids::MODEL_DATE, DomOp::Text(info.date.clone())));
        out.push(on(ids::MODEL_TAGS, DomOp::Show(!info.tags.is_empty())));
        out.push(on(ids::MODEL_TAGS, DomOp::Tags(info.tags.clone())));
    }

    out.push(on(ids::QR_SECTION, DomOp::Show(vm.share.is_some())));
    if let Some(share) = &vm.share {
        out.push(on(ids::SHARE_URL, DomOp::Text(share.url.clone())));
        out.push(on(ids::QR_INSTRUCTIONS, DomOp::Text(share.instructions.to_owned())));
        out.push(on(ids::QR_IMAGE, DomOp::Show(share.qr_image_url.is_some())));
        if let Some(src) = &share.qr_image_url {
            out.push(on(ids::QR_IMAGE, DomOp::Src(src.clone())));
        }
        out.push(on(ids::QR_PLACEHOLDER, DomOp::Show(share.placeholder.is_some())));
        if let Some(text) = share.placeholder {
            out.push(on(ids::QR_PLACEHOLDER, DomOp::Text(text.to_owned())));
        }
        out.push(on(ids::DOWNLOAD_QR, DomOp::Enabled(share.qr_image_url.is_some())));
        let direct = share.mode == ShareMode::Direct;
        out.push(on(ids::DIRECT_AR_MODE, DomOp::Class { name: ACTIVE_CLASS, on: direct }));
        out.push(on(ids::WEBPAGE_MODE, DomOp::Class { name: ACTIVE_CLASS, on: !direct }));
    }

    out
}

fn rotation_label(running: bool) -> &'static str {
    if running { "Pause Rotation" } else { "Start Rotation" }
}

fn fullscreen_label(fullscreen: bool) -> &'static str {
    if fullscreen { "Exit Fullscreen" } else { "Fullscreen" }
}

/// CSS class for a transient notice.
#[must_use]
pub fn notice_class(kind: NoticeKind) -> &'static str {
    match kind {
        NoticeKind::Info => "notice notice-info",
        NoticeKind::Success => "notice notice-success",
        NoticeKind::Error => "notice notice-error",
    }
}

/// How long a notice stays on screen.
pub const NOTICE_MILLIS: u32 = 3_000;
