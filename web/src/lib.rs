//! Browser host for the WebXR model viewer.
//!
//! SYSTEM CONTEXT
//! ==============
//! The `viewer` crate owns all state and decisions. This crate maps its view
//! model onto the page, feeds it DOM and XR events, and implements its
//! capability traits on top of `fetch`, WebXR and a three.js engine shim.
//!
//! Pure mapping modules build everywhere and carry the tests; the
//! `wasm-bindgen` side only builds with the `browser` feature.
//!
//! | Module | Role |
//! |--------|------|
//! | [`dom`] | Element ids and view-model patches |
//! | [`draw`] | Scene graph to engine draw records |
//! | [`import`] | Engine import records and progress |
//! | [`input`] | Shortcuts and orbit gestures |
//! | [`page`] | Embedded page configuration |
//! | [`xr_state`] | Per-frame hit results and queued XR events |

pub mod dom;
pub mod draw;
pub mod import;
pub mod input;
pub mod page;
pub mod xr_state;

#[cfg(feature = "browser")]
pub mod app;
#[cfg(feature = "browser")]
pub mod bindings;
#[cfg(feature = "browser")]
pub mod net;
#[cfg(feature = "browser")]
pub mod platform;
#[cfg(feature = "browser")]
pub mod xr;

#[cfg(feature = "browser")]
use wasm_bindgen::prelude::*;

/// Module entry: panic hook, console logging, then the viewer.
///
/// # Errors
///
/// Propagates page setup failures to the console.
#[cfg(feature = "browser")]
#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    if let Err(err) = console_log::init_with_level(log::Level::Info) {
        web_sys::console::warn_1(&JsValue::from_str(&err.to_string()));
    }
    app::run()
}
