//! Browser [`Platform`]: three.js through `js/engine.js`, WebXR through
//! `navigator.xr`, timers through `gloo-timers`.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use futures::channel::mpsc;
use futures::future::{Either, select};
use gloo_timers::future::TimeoutFuture;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use viewer::ViewerError;
use viewer::asset::AssetSource;
use viewer::camera::OrbitCamera;
use viewer::error::{ImportError, SessionError};
use viewer::platform::{ArSession, ImportedAsset, LoadProgress, Platform, RenderSurface, SessionFeatures};
use viewer::scene::SceneGraph;

use crate::bindings::{Engine, exception_parts, xr_system};
use crate::draw::{camera_matrices, draw_list, is_transparent};
use crate::import::{parse_import, progress_from_js};
use crate::xr::{IMMERSIVE_AR, SharedLink, request_session};

pub struct BrowserPlatform {
    engine: Rc<Engine>,
    overlay_root: Option<web_sys::Element>,
    /// Link of the most recent session, read by the frame loop.
    active_link: RefCell<Option<SharedLink>>,
}

impl BrowserPlatform {
    pub fn new(engine: Rc<Engine>, overlay_root: Option<web_sys::Element>) -> Self {
        Self { engine, overlay_root, active_link: RefCell::new(None) }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Frame-loop handle of the live session, if it has not ended.
    pub fn active_link(&self) -> Option<SharedLink> {
        let mut slot = self.active_link.borrow_mut();
        if slot.as_ref().is_some_and(|link| link.borrow().state.is_ended()) {
            *slot = None;
        }
        slot.clone()
    }

    async fn import_url(&self, url: &str, progress: &dyn Fn(LoadProgress)) -> Result<ImportedAsset, ImportError> {
        let (tx, mut rx) = mpsc::unbounded::<LoadProgress>();
        let on_progress = Closure::<dyn FnMut(f64, f64)>::new(move |loaded: f64, total: f64| {
            if tx.unbounded_send(progress_from_js(loaded, total)).is_err() {
                tracing::trace!("progress after import settled");
            }
        });
        let mut import = JsFuture::from(self.engine.import_asset(url, on_progress.as_ref().unchecked_ref()));

        let settled = loop {
            match select(&mut import, rx.next()).await {
                Either::Left((result, _)) => break result,
                Either::Right((Some(update), _)) => progress(update),
                Either::Right((None, _)) => break (&mut import).await,
            }
        };
        drop(on_progress);

        let record = settled.map_err(|e| ImportError::Engine(exception_parts(&e).1))?;
        parse_import(&stringify(&record)?)
    }
}

fn stringify(value: &JsValue) -> Result<String, ImportError> {
    js_sys::JSON::stringify(value)
        .map(String::from)
        .map_err(|e| ImportError::Engine(exception_parts(&e).1))
}

#[async_trait(?Send)]
impl Platform for BrowserPlatform {
    async fn import_asset(
        &self,
        source: &AssetSource,
        progress: &dyn Fn(LoadProgress),
    ) -> Result<ImportedAsset, ImportError> {
        match source {
            AssetSource::Url(url) => self.import_url(url, progress).await,
            AssetSource::DemoCube => parse_import(&stringify(&self.engine.create_demo_cube())?),
        }
    }

    fn create_render_surface(&self) -> Result<Box<dyn RenderSurface>, ViewerError> {
        Ok(Box::new(EngineSurface { engine: Rc::clone(&self.engine) }))
    }

    async fn is_ar_supported(&self) -> bool {
        let Some(xr) = xr_system() else {
            return false;
        };
        match JsFuture::from(xr.is_session_supported(IMMERSIVE_AR)).await {
            Ok(supported) => supported.as_bool().unwrap_or(false),
            Err(err) => {
                tracing::debug!(error = ?exception_parts(&err), "isSessionSupported rejected");
                false
            }
        }
    }

    async fn request_ar_session(&self, features: &SessionFeatures) -> Result<Box<dyn ArSession>, SessionError> {
        let xr = xr_system().ok_or_else(|| SessionError::new("NotSupportedError", "WebXR is not available"))?;
        let session = request_session(&xr, &self.engine, features, self.overlay_root.as_ref()).await?;
        *self.active_link.borrow_mut() = Some(session.link());
        Ok(Box::new(session))
    }

    async fn sleep(&self, duration: Duration) {
        TimeoutFuture::new(u32::try_from(duration.as_millis()).unwrap_or(u32::MAX)).await;
    }
}

/// Render surface backed by the shared engine.
pub struct EngineSurface {
    engine: Rc<Engine>,
}

impl RenderSurface for EngineSurface {
    fn resize(&mut self, width: u32, height: u32) {
        self.engine.resize(width, height);
    }

    fn present(&mut self, graph: &SceneGraph, camera: &OrbitCamera) {
        self.engine.begin_sync(is_transparent(graph));
        for node in draw_list(graph) {
            self.engine.sync_node(&node.id, node.kind, node.handle, &node.params, &node.matrix, node.visible);
        }
        self.engine.end_sync();
        let (view, projection) = camera_matrices(camera);
        self.engine.render(&view, &projection);
    }
}
