//! WebXR adapter for [`ArSession`].
//!
//! The session object, its reference spaces and its hit-test source live in
//! an [`XrLink`] shared with the frame loop, which samples hit results inside
//! each XR animation frame. DOM `select` and `end` events are queued on the
//! same link and drained by the core's poll.

use std::cell::RefCell;
use std::rc::Rc;

use async_trait::async_trait;
use js_sys::{Array, Object, Reflect};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use viewer::error::SessionError;
use viewer::platform::{ArSession, InputSourceId, PendingEnd, ReferenceSpaceKind, SessionEvent, SessionFeatures};
use viewer::transform::Transform;

use crate::bindings::{
    Engine, XrFrame, XrHitTestResult, XrInputSourceEvent, XrSession, XrSystem, exception_parts, pulse_input_source,
};
use crate::xr_state::{SourceRegistry, XrFrameState, pose_from_matrix};

pub const IMMERSIVE_AR: &str = "immersive-ar";

pub type SharedLink = Rc<RefCell<XrLink>>;

/// Session-scoped JS handles plus the frame state they feed.
#[derive(Default)]
pub struct XrLink {
    pub state: XrFrameState,
    local_space: Option<JsValue>,
    viewer_space: Option<JsValue>,
    hit_test_source: Option<JsValue>,
}

impl XrLink {
    fn space(&self, kind: ReferenceSpaceKind) -> Option<&JsValue> {
        match kind {
            ReferenceSpaceKind::Local => self.local_space.as_ref(),
            ReferenceSpaceKind::Viewer => self.viewer_space.as_ref(),
        }
    }
}

/// Sample this frame's hit results into the link. Called from the XR
/// animation frame before the core ticks.
pub fn capture_frame(link: &SharedLink, frame: &XrFrame) {
    let mut link = link.borrow_mut();
    if link.state.is_ended() {
        return;
    }
    let (Some(source), Some(local)) = (link.hit_test_source.clone(), link.local_space.clone()) else {
        return;
    };
    let hits: Vec<Transform> = frame
        .get_hit_test_results(&source)
        .iter()
        .filter_map(|result| result.unchecked_into::<XrHitTestResult>().get_pose(&local))
        .filter_map(|pose| pose_from_matrix(&pose.transform().matrix().to_vec()))
        .collect();
    link.state.record_hits(hits);
}

pub fn session_error(err: &JsValue) -> SessionError {
    let (name, message) = exception_parts(err);
    SessionError::new(name, message)
}

/// Request an immersive AR session and bind it to the engine.
///
/// # Errors
///
/// Returns the platform's rejection (`NotAllowedError`, `SecurityError`,
/// `NotSupportedError`, ...) as a [`SessionError`].
pub async fn request_session(
    xr: &XrSystem,
    engine: &Engine,
    features: &SessionFeatures,
    overlay_root: Option<&web_sys::Element>,
) -> Result<WebXrSession, SessionError> {
    let init = session_init(features, overlay_root).map_err(|e| session_error(&e))?;
    let session: XrSession = JsFuture::from(xr.request_session(IMMERSIVE_AR, &init))
        .await
        .map_err(|e| session_error(&e))?
        .unchecked_into();
    let session = WebXrSession::new(session);
    if let Err(err) = JsFuture::from(engine.set_xr_session(&session.session)).await {
        let err = session_error(&err);
        tracing::warn!(error = %err, "engine refused xr session");
        if let Err(end_err) = session.end_now().await {
            tracing::debug!(error = %end_err, "session end after bind failure");
        }
        return Err(err);
    }
    Ok(session)
}

fn session_init(features: &SessionFeatures, overlay_root: Option<&web_sys::Element>) -> Result<JsValue, JsValue> {
    let init = Object::new();
    let list = |names: &[&str]| names.iter().map(|n| JsValue::from_str(n)).collect::<Array>();
    Reflect::set(&init, &"requiredFeatures".into(), &list(&features.required))?;
    Reflect::set(&init, &"optionalFeatures".into(), &list(&features.optional))?;
    if let Some(root) = overlay_root {
        let overlay = Object::new();
        Reflect::set(&overlay, &"root".into(), root)?;
        Reflect::set(&init, &"domOverlay".into(), &overlay)?;
    }
    Ok(init.into())
}

type Listener = Closure<dyn FnMut(JsValue)>;

pub struct WebXrSession {
    session: XrSession,
    link: SharedLink,
    sources: Rc<RefCell<SourceRegistry<JsValue>>>,
    listeners: Vec<(&'static str, Listener)>,
}

impl WebXrSession {
    fn new(session: XrSession) -> Self {
        let link: SharedLink = Rc::default();
        let sources: Rc<RefCell<SourceRegistry<JsValue>>> = Rc::default();

        let on_select: Listener = {
            let link = Rc::clone(&link);
            let sources = Rc::clone(&sources);
            Closure::new(move |event: JsValue| {
                let source = event.unchecked_into::<XrInputSourceEvent>().input_source();
                let id = sources.borrow_mut().id_for(source, |a, b| Object::is(a, b));
                link.borrow_mut().state.push_select(id);
            })
        };
        let on_end: Listener = {
            let link = Rc::clone(&link);
            Closure::new(move |_event: JsValue| link.borrow_mut().state.mark_ended())
        };

        let listeners = vec![("select", on_select), ("end", on_end)];
        for (kind, listener) in &listeners {
            session.add_event_listener(kind, listener.as_ref().unchecked_ref());
        }
        Self { session, link, sources, listeners }
    }

    /// Frame-loop handle onto this session's state.
    pub fn link(&self) -> SharedLink {
        Rc::clone(&self.link)
    }

    fn end_now(&self) -> PendingEnd {
        let promise = self.session.end();
        let link = Rc::clone(&self.link);
        Box::pin(async move {
            let result = JsFuture::from(promise).await;
            link.borrow_mut().state.mark_ended();
            result.map(|_| ()).map_err(|e| session_error(&e))
        })
    }
}

impl Drop for WebXrSession {
    fn drop(&mut self) {
        for (kind, listener) in &self.listeners {
            self.session.remove_event_listener(kind, listener.as_ref().unchecked_ref());
        }
    }
}

#[async_trait(?Send)]
impl ArSession for WebXrSession {
    async fn request_reference_space(&mut self, kind: ReferenceSpaceKind) -> Result<(), SessionError> {
        let space = JsFuture::from(self.session.request_reference_space(kind.as_str()))
            .await
            .map_err(|e| session_error(&e))?;
        let mut link = self.link.borrow_mut();
        match kind {
            ReferenceSpaceKind::Local => link.local_space = Some(space),
            ReferenceSpaceKind::Viewer => link.viewer_space = Some(space),
        }
        Ok(())
    }

    async fn request_hit_test_source(&mut self, space: ReferenceSpaceKind) -> Result<(), SessionError> {
        let origin = self.link.borrow().space(space).cloned().ok_or_else(|| {
            SessionError::new("InvalidStateError", format!("{} reference space not acquired", space.as_str()))
        })?;
        let options = Object::new();
        Reflect::set(&options, &"space".into(), &origin).map_err(|e| session_error(&e))?;
        let source = JsFuture::from(self.session.request_hit_test_source(&options))
            .await
            .map_err(|e| session_error(&e))?;
        self.link.borrow_mut().hit_test_source = Some(source);
        Ok(())
    }

    fn hit_test_results(&mut self) -> Vec<Transform> {
        self.link.borrow().state.hits().to_vec()
    }

    fn take_events(&mut self) -> Vec<SessionEvent> {
        self.link.borrow_mut().state.take_events()
    }

    fn pulse_haptics(&mut self, input_source: Option<InputSourceId>, intensity: f32, duration_ms: u32) -> bool {
        if let Some(id) = input_source {
            if let Some(source) = self.sources.borrow().get(id) {
                return pulse_input_source(source, intensity, duration_ms);
            }
        }
        let all = Array::from(&self.session.input_sources());
        all.iter().fold(false, |any, source| pulse_input_source(&source, intensity, duration_ms) || any)
    }

    fn end(&mut self) -> PendingEnd {
        self.end_now()
    }
}
