//! Platform-independent core of the WebXR model viewer.
//!
//! This crate resolves a model record to a verified content URL, frames the
//! imported mesh in an auto-rotating preview, and runs the AR session state
//! machine: session negotiation, per-frame hit testing, reticle updates,
//! placement of model copies on detected surfaces, and teardown back to the
//! preview. It never touches a browser or rendering engine directly; hosts
//! (the `web` crate in the browser, the `cli` crate natively) implement the
//! capability traits in [`platform`] and drive [`session::ViewerSession`].
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`session`] | Per-page [`session::ViewerSession`] and the async load/AR steps |
//! | [`ar`] | AR session controller and its phase machine |
//! | [`bootstrap`] | Preview scene: lights, shadow plane, reticle, framing, auto-rotate |
//! | [`scene`] | Flat render graph shared with backends |
//! | [`placement`] | Registry of placed asset copies |
//! | [`platform`] | Capability traits for engines and AR platforms |
//! | [`resolve`] | Metadata lookup, content URL, reachability probe |
//! | [`store`] | Metadata store trait and REST request building |
//! | [`share`] | Share links and QR image requests |
//! | [`presenter`] | Pure state-to-UI mapping |
//! | [`asset`] | Model records and launch parameters |
//! | [`bounds`] | Bounding boxes and preview framing |
//! | [`camera`] | Orbit camera and lens |
//! | [`transform`] | Node and pose transforms |
//! | [`config`] | Viewer configuration |
//! | [`error`] | Error taxonomy |
//! | [`consts`] | Shared numeric constants |

pub mod ar;
pub mod asset;
pub mod bootstrap;
pub mod bounds;
pub mod camera;
pub mod config;
pub mod consts;
pub mod error;
pub mod placement;
pub mod platform;
pub mod presenter;
pub mod resolve;
pub mod scene;
pub mod session;
pub mod share;
pub mod store;
pub mod transform;

#[cfg(test)]
mod test_support;

pub use error::ViewerError;
pub use session::ViewerSession;
