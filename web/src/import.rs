//! Records the JS engine hands back from an import.

#[cfg(test)]
#[path = "import_test.rs"]
mod import_test;

use serde::Deserialize;

use viewer::bounds::Aabb;
use viewer::error::ImportError;
use viewer::platform::{AssetHandle, ImportedAsset, LoadProgress};

/// `{ handle, min, max }` as serialized by `importAsset`/`createDemoCube`.
/// An empty three.js box has infinite corners, which JSON turns into `null`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ImportRecord {
    pub handle: u32,
    pub min: [Option<f32>; 3],
    pub max: [Option<f32>; 3],
}

/// Decode an import record.
///
/// # Errors
///
/// Returns [`ImportError::Engine`] for malformed records and
/// [`ImportError::Empty`] when the engine found no geometry.
pub fn parse_import(json: &str) -> Result<ImportedAsset, ImportError> {
    let record: ImportRecord =
        serde_json::from_str(json).map_err(|e| ImportError::Engine(format!("bad import record: {e}")))?;
    let (Some(min), Some(max)) = (corner(record.min), corner(record.max)) else {
        return Err(ImportError::Empty);
    };
    Ok(ImportedAsset { handle: AssetHandle(record.handle), bounds: Aabb::new(min.into(), max.into()) })
}

fn corner(values: [Option<f32>; 3]) -> Option<[f32; 3]> {
    let [Some(x), Some(y), Some(z)] = values else {
        return None;
    };
    [x, y, z].iter().all(|v| v.is_finite()).then_some([x, y, z])
}

/// Progress from a loader's `(loaded, total)` byte counts. Loaders report a
/// total of zero when the length is unknown.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn progress_from_js(loaded: f64, total: f64) -> LoadProgress {
    let bytes = |v: f64| if v.is_finite() && v > 0.0 { v as u64 } else { 0 };
    LoadProgress { loaded: bytes(loaded), total: Some(bytes(total)).filter(|t| *t > 0) }
}
