//! Error taxonomy for the viewer.
//!
//! Initialization failures (store, resolver, import) are terminal for the page
//! and drive the error screen. AR failures are local to the AR subsystem and
//! leave the preview usable.

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;

use std::fmt;
use std::time::Duration;

/// Why an asset URL could not be reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnreachableCategory {
    Cors,
    NotFound,
    Timeout,
    Other,
}

impl fmt::Display for UnreachableCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Cors => "cors",
            Self::NotFound => "not found",
            Self::Timeout => "timeout",
            Self::Other => "other",
        })
    }
}

/// Why the platform refused an AR session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    /// The user (or a permissions policy) refused camera access.
    PermissionDenied,
    /// No AR-capable camera or the mode is not available.
    NoArCamera,
    /// The page is not a secure context.
    InsecureContext,
    /// Another immersive session holds the device.
    DeviceBusy,
    Other,
}

impl DenialReason {
    /// Classify a platform exception name (`DOMException.name` in browsers).
    #[must_use]
    pub fn from_exception_name(name: &str) -> Self {
        match name {
            "NotAllowedError" | "PermissionDeniedError" => Self::PermissionDenied,
            "NotSupportedError" | "NotFoundError" => Self::NoArCamera,
            "SecurityError" => Self::InsecureContext,
            "InvalidStateError" | "NotReadableError" | "AbortError" => Self::DeviceBusy,
            _ => Self::Other,
        }
    }
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::PermissionDenied => "permission denied",
            Self::NoArCamera => "no AR camera",
            Self::InsecureContext => "insecure context",
            Self::DeviceBusy => "device busy",
            Self::Other => "other",
        })
    }
}

/// Failure reported by a platform AR call, shaped like a DOM exception.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{name}: {message}")]
pub struct SessionError {
    pub name: String,
    pub message: String,
}

impl SessionError {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self { name: name.into(), message: message.into() }
    }

    #[must_use]
    pub fn reason(&self) -> DenialReason {
        DenialReason::from_exception_name(&self.name)
    }
}

/// Failure while importing a mesh through the rendering adapter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImportError {
    /// No load or error signal arrived within the timeout.
    #[error("model loading timeout ({}s)", .0.as_secs())]
    Timeout(Duration),
    /// The engine reported an import error.
    #[error("{0}")]
    Engine(String),
    /// The imported scene contained no geometry with extent.
    #[error("no meshes found in the model file")]
    Empty,
}

/// Top-level viewer error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ViewerError {
    /// Network/HTTP failure resolving or probing the asset URL.
    #[error("model file not accessible ({category}): {detail}")]
    AssetUnreachable { category: UnreachableCategory, detail: String },

    /// Mesh import failed or timed out.
    #[error("failed to load model: {0}")]
    ModelLoadFailed(#[from] ImportError),

    /// The AR capability probe reported no support.
    #[error("immersive AR is not supported")]
    ArUnsupported,

    /// The platform refused or aborted AR session setup.
    #[error("AR session denied ({reason}): {detail}")]
    ArSessionDenied { reason: DenialReason, detail: String },

    /// An AR session is already active or being requested.
    #[error("an AR session is already in progress")]
    ArSessionInProgress,

    /// The metadata store could not be reached.
    #[error("database unavailable: {0}")]
    DatabaseUnavailable(String),

    /// The metadata store has no public record for this identifier.
    #[error("model not found: {id}")]
    ModelNotFound { id: String },

    /// Configuration is invalid.
    #[error("invalid config: {0}")]
    Config(String),
}

impl From<SessionError> for ViewerError {
    fn from(err: SessionError) -> Self {
        Self::ArSessionDenied { reason: err.reason(), detail: err.to_string() }
    }
}

impl ViewerError {
    /// Stable machine-readable code.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::AssetUnreachable { .. } => "E_ASSET_UNREACHABLE",
            Self::ModelLoadFailed(_) => "E_MODEL_LOAD_FAILED",
            Self::ArUnsupported => "E_AR_UNSUPPORTED",
            Self::ArSessionDenied { .. } => "E_AR_SESSION_DENIED",
            Self::ArSessionInProgress => "E_AR_SESSION_IN_PROGRESS",
            Self::DatabaseUnavailable(_) => "E_DATABASE_UNAVAILABLE",
            Self::ModelNotFound { .. } => "E_MODEL_NOT_FOUND",
            Self::Config(_) => "E_CONFIG",
        }
    }

    /// Whether this error ends the page flow in the error screen.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::ArUnsupported | Self::ArSessionDenied { .. } | Self::ArSessionInProgress)
    }

    /// Message suitable for the status line or error screen.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::AssetUnreachable { category, detail } => {
                let hint = match category {
                    UnreachableCategory::Cors => "This may be a cross-origin issue. Try accessing the model directly.",
                    UnreachableCategory::NotFound => "Model file not found on server.",
                    UnreachableCategory::Timeout => "Model took too long to load. Check your internet connection.",
                    UnreachableCategory::Other => detail.as_str(),
                };
                format!("Failed to load 3D model. {hint}")
            }
            Self::ModelLoadFailed(ImportError::Timeout(_)) => {
                "Failed to load 3D model. Model took too long to load. Check your internet connection.".to_owned()
            }
            Self::ModelLoadFailed(err) => format!("Failed to load 3D model. {err}"),
            Self::ArUnsupported => "WebXR AR is not supported on this device".to_owned(),
            Self::ArSessionDenied { reason, .. } => match reason {
                DenialReason::PermissionDenied => "Camera permission denied - allow camera access to use AR",
                DenialReason::NoArCamera => "No AR-capable camera found on this device",
                DenialReason::InsecureContext => "AR requires a secure (HTTPS) connection",
                DenialReason::DeviceBusy => "AR is in use by another session - close it and try again",
                DenialReason::Other => "Failed to start AR - Check device compatibility",
            }
            .to_owned(),
            Self::ArSessionInProgress => "AR session already running".to_owned(),
            Self::DatabaseUnavailable(_) => "Failed to connect to database".to_owned(),
            Self::ModelNotFound { .. } => "Model not found".to_owned(),
            Self::Config(detail) => format!("Viewer is misconfigured: {detail}"),
        }
    }
}
