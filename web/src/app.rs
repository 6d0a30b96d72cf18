//! Browser host: owns the [`ViewerSession`], wires DOM events to it, and runs
//! the frame loop.
//!
//! LIFECYCLE
//! =========
//! `run` builds the engine and session, registers page-lifetime listeners,
//! starts the animation loop, then spawns the load task. Async steps borrow
//! the session only between awaits; nothing holds a `RefCell` borrow across
//! a suspension point.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use js_sys::{Function, Object, Promise, Reflect};
use wasm_bindgen::JsCast;
use wasm_bindgen::convert::FromWasmAbi;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{JsFuture, spawn_local};
use web_sys::{Document, Element, HtmlButtonElement, HtmlCanvasElement, HtmlElement, Window};

use viewer::ViewerSession;
use viewer::ViewerError;
use viewer::ar::{ArAction, acquire_session};
use viewer::asset::LaunchParams;
use viewer::config::ViewerConfig;
use viewer::platform::{LoadProgress, PendingEnd, Platform, RenderSurface, SessionFeatures};
use viewer::presenter::ViewModel;
use viewer::session::{LoadState, NoticeKind, SessionMode, import_with_timeout, resolve_source};
use viewer::share::ShareMode;

use crate::bindings::{Engine, XrFrame, exception_parts};
use crate::dom::{DomOp, DomPatch, NOTICE_MILLIS, Target, ids, notice_class, patch};
use crate::input::{OrbitDrag, Shortcut, shortcut_for_key, wheel_zoom_factor};
use crate::net::{FetchProbe, RestStore};
use crate::page::{CONFIG_ELEMENT_ID, page_config};
use crate::platform::BrowserPlatform;
use crate::xr::capture_frame;

/// Longest step fed to the core when the tab was in the background.
const MAX_FRAME_SECS: f64 = 0.1;

pub struct App {
    session: RefCell<ViewerSession>,
    platform: BrowserPlatform,
    surface: RefCell<Box<dyn RenderSurface>>,
    store: RestStore,
    probe: FetchProbe,
    window: Window,
    document: Document,
    canvas: HtmlCanvasElement,
    drag: Cell<OrbitDrag>,
    last_frame: Cell<Option<f64>>,
    last_view: RefCell<Option<ViewModel>>,
}

/// Build everything and start loading.
///
/// # Errors
///
/// Fails when the page lacks a window, document, canvas, or the engine cannot
/// start. Configuration errors are shown on the page instead.
pub fn run() -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let document = window.document().ok_or_else(|| JsValue::from_str("no document"))?;
    let origin = window.location().origin()?;
    let params = LaunchParams::from_query(&window.location().search()?);

    let raw_config = document.get_element_by_id(CONFIG_ELEMENT_ID).and_then(|el| el.text_content());
    let (config, config_error) = match page_config(raw_config.as_deref(), &origin) {
        Ok(config) => (config, None),
        Err(err) => (ViewerConfig { base_url: origin, ..ViewerConfig::default() }, Some(err)),
    };
    tracing::info!(model = ?params.model_id, auto_start = params.auto_start_ar, "viewer starting");

    let canvas: HtmlCanvasElement = document
        .get_element_by_id(ids::CANVAS)
        .ok_or_else(|| JsValue::from_str("viewer canvas missing"))?
        .dyn_into()?;
    let engine = Rc::new(Engine::new(&canvas)?);
    let overlay_root = document.body().map(Element::from);
    let platform = BrowserPlatform::new(engine, overlay_root);
    let surface = platform.create_render_surface().map_err(|e| JsValue::from_str(&e.to_string()))?;

    let store = RestStore::new(config.store.clone());
    let mut session = ViewerSession::new(config, params);
    if let Some(err) = config_error {
        session.fail(err);
    }

    let app = Rc::new(App {
        session: RefCell::new(session),
        platform,
        surface: RefCell::new(surface),
        store,
        probe: FetchProbe,
        window,
        document,
        canvas,
        drag: Cell::new(OrbitDrag::default()),
        last_frame: Cell::new(None),
        last_view: RefCell::new(None),
    });

    app.resize();
    wire_controls(&app)?;
    wire_canvas(&app)?;
    start_frame_loop(&app);
    app.render_ui();

    if matches!(app.session.borrow().load_state(), LoadState::Loading { .. }) {
        spawn_local(load(Rc::clone(&app)));
    }
    Ok(())
}

// =============================================================
// Async flows
// =============================================================

async fn load(app: Rc<App>) {
    let (config, params) = {
        let session = app.session.borrow();
        (session.config().clone(), session.params().clone())
    };

    let source = match resolve_source(&app.store, &app.probe, &config, &params).await {
        Ok(resolved) => {
            app.session.borrow_mut().source_resolved(&resolved);
            resolved.source
        }
        Err(err) => {
            app.session.borrow_mut().fail(err);
            app.render_ui();
            return;
        }
    };
    app.render_ui();

    let progress = |update: LoadProgress| {
        app.session.borrow_mut().set_progress(update);
        app.render_ui();
    };
    let imported = import_with_timeout(&app.platform, &source, config.load_timeout(), &progress).await;
    app.session.borrow_mut().finish_load(imported.map_err(ViewerError::from));

    let ready = *app.session.borrow().load_state() == LoadState::Ready;
    if ready {
        app.apply_page_meta();
        let supported = app.platform.is_ar_supported().await;
        app.session.borrow_mut().set_ar_supported(supported);
    }
    app.render_ui();

    let auto_start = app.session.borrow_mut().take_auto_start();
    if auto_start {
        start_ar(app).await;
    }
}

async fn start_ar(app: Rc<App>) {
    let begun = app.session.borrow_mut().begin_ar();
    if let Err(err) = begun {
        tracing::info!(code = err.error_code(), "AR start refused");
        app.render_ui();
        return;
    }
    app.render_ui();

    let acquired = acquire_session(&app.platform, &SessionFeatures::default()).await;
    let completed = app.session.borrow_mut().complete_ar(acquired);
    match completed {
        Ok(Some(late)) => finish_end(late).await,
        Ok(None) => tracing::info!("AR session active"),
        Err(err) => tracing::warn!(code = err.error_code(), error = %err, "AR session failed"),
    }
    app.render_ui();
}

async fn finish_end(pending: PendingEnd) {
    if let Err(err) = pending.await {
        tracing::warn!(error = %err, "AR session end failed");
    }
}

async fn copy_link(app: Rc<App>) {
    let url = app.session.borrow().share_payload().url;
    let Some(clipboard) = app.window.navigator().clipboard() else {
        app.session.borrow_mut().notify(NoticeKind::Error, "Clipboard is not available");
        app.render_ui();
        return;
    };
    match JsFuture::from(clipboard.write_text(&url)).await {
        Ok(_) => app.session.borrow_mut().link_copied(),
        Err(err) => {
            tracing::warn!(error = ?exception_parts(&err), "clipboard write failed");
            app.session.borrow_mut().notify(NoticeKind::Error, "Could not copy link");
        }
    }
    app.render_ui();
}

/// Native share sheet when available, clipboard otherwise.
async fn share(app: Rc<App>) {
    let navigator = app.window.navigator();
    let share_fn = Reflect::get(&navigator, &"share".into()).unwrap_or(JsValue::UNDEFINED);
    let Some(share_fn) = share_fn.dyn_ref::<Function>() else {
        return copy_link(app).await;
    };
    let payload = app.session.borrow().share_payload();
    let data = Object::new();
    for (key, value) in [("title", &payload.title), ("text", &payload.text), ("url", &payload.url)] {
        if let Err(err) = Reflect::set(&data, &key.into(), &JsValue::from_str(value)) {
            tracing::warn!(error = ?exception_parts(&err), "share payload build failed");
            return;
        }
    }
    let promise = match share_fn.call1(&navigator, &data) {
        Ok(value) => value.unchecked_into::<Promise>(),
        Err(err) => {
            tracing::warn!(error = ?exception_parts(&err), "share failed");
            return;
        }
    };
    if let Err(err) = JsFuture::from(promise).await {
        tracing::debug!(error = ?exception_parts(&err), "share cancelled");
    }
}

// =============================================================
// App
// =============================================================

impl App {
    fn exit_ar(&self) {
        let pending = self.session.borrow_mut().exit_ar();
        if let Some(pending) = pending {
            spawn_local(finish_end(pending));
        }
        self.render_ui();
    }

    fn on_frame(&self, time: f64, frame: &JsValue) {
        let dt = self.last_frame.replace(Some(time)).map_or(0.0, |last| ((time - last) / 1000.0).clamp(0.0, MAX_FRAME_SECS));

        if !frame.is_null() && !frame.is_undefined() {
            if let Some(link) = self.platform.active_link() {
                capture_frame(&link, frame.unchecked_ref::<XrFrame>());
            }
        }

        #[allow(clippy::cast_possible_truncation)]
        let actions = self.session.borrow_mut().tick(dt as f32);
        for action in &actions {
            match action {
                ArAction::Placed { count, .. } => tracing::debug!(count, "model placed"),
                ArAction::SessionEnded => tracing::info!("AR session ended by platform"),
                _ => {}
            }
        }

        {
            let session = self.session.borrow();
            let scene = session.scene();
            self.surface.borrow_mut().present(&scene.graph, &scene.camera);
        }
        if !actions.is_empty() {
            self.render_ui();
        }
    }

    fn resize(&self) {
        let width = self.window.inner_width().ok().and_then(|w| w.as_f64()).unwrap_or(1.0);
        let height = self.window.inner_height().ok().and_then(|h| h.as_f64()).unwrap_or(1.0);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let (w, h) = (width.max(1.0) as u32, height.max(1.0) as u32);
        self.surface.borrow_mut().resize(w, h);
        #[allow(clippy::cast_possible_truncation)]
        self.session.borrow_mut().scene_mut().camera.lens.set_viewport(width as f32, height as f32);
    }

    /// Apply the current view model if it changed, then show queued notices.
    fn render_ui(&self) {
        let (vm, notices) = {
            let mut session = self.session.borrow_mut();
            (session.view_model(), session.take_notices())
        };
        let changed = self.last_view.borrow().as_ref() != Some(&vm);
        if changed {
            for update in patch(&vm) {
                self.apply(&update);
            }
            *self.last_view.borrow_mut() = Some(vm);
        }
        for notice in notices {
            self.show_notice(notice_class(notice.kind), &notice.text);
        }
    }

    fn apply(&self, update: &DomPatch) {
        let element = match update.target {
            Target::Id(id) => self.document.get_element_by_id(id),
            Target::Body => self.document.body().map(Element::from),
        };
        let Some(element) = element else {
            return;
        };
        let result = match &update.op {
            DomOp::Show(on) => element.toggle_attribute_with_force("hidden", !on).map(|_| ()),
            DomOp::Text(text) => {
                element.set_text_content(Some(text));
                Ok(())
            }
            DomOp::Enabled(on) => {
                if let Some(button) = element.dyn_ref::<HtmlButtonElement>() {
                    button.set_disabled(!on);
                }
                Ok(())
            }
            DomOp::Src(src) => element.set_attribute("src", src),
            DomOp::Class { name, on } => element.class_list().toggle_with_force(name, *on).map(|_| ()),
            DomOp::Tags(tags) => self.fill_tags(&element, tags),
        };
        if let Err(err) = result {
            tracing::debug!(error = ?exception_parts(&err), target = ?update.target, "dom update failed");
        }
    }

    fn fill_tags(&self, container: &Element, tags: &[String]) -> Result<(), JsValue> {
        container.set_inner_html("");
        for tag in tags {
            let chip = self.document.create_element("span")?;
            chip.set_class_name("tag");
            chip.set_text_content(Some(tag));
            container.append_child(&chip)?;
        }
        Ok(())
    }

    fn show_notice(&self, class: &str, text: &str) {
        let Some(container) = self.document.get_element_by_id(ids::NOTICES) else {
            return;
        };
        let Ok(note) = self.document.create_element("div") else {
            return;
        };
        note.set_class_name(class);
        note.set_text_content(Some(text));
        if container.append_child(&note).is_err() {
            return;
        }
        gloo_timers::callback::Timeout::new(NOTICE_MILLIS, move || note.remove()).forget();
    }

    fn download_qr(&self) {
        let (href, filename) = {
            let session = self.session.borrow();
            (session.share_target().qr_image_url.clone(), session.qr_download_filename())
        };
        if let Err(err) = self.download(&href, &filename) {
            tracing::warn!(error = ?exception_parts(&err), "qr download failed");
        }
    }

    fn take_screenshot(&self) {
        if !self.session.borrow().can_screenshot() {
            return;
        }
        let filename = self.session.borrow().screenshot_filename();
        let saved = self.platform.engine().screenshot().and_then(|href| self.download(&href, &filename));
        if let Err(err) = &saved {
            tracing::warn!(error = ?exception_parts(err), "screenshot failed");
        }
        self.session.borrow_mut().screenshot_taken(saved.is_ok());
        self.render_ui();
    }

    /// Offer `href` as a file download through a transient link.
    fn download(&self, href: &str, filename: &str) -> Result<(), JsValue> {
        let link = self.document.create_element("a")?;
        link.set_attribute("href", href)?;
        link.set_attribute("download", filename)?;
        if let Some(link) = link.dyn_ref::<HtmlElement>() {
            link.click();
        }
        Ok(())
    }

    fn toggle_fullscreen(&self) {
        let wanted = self.session.borrow_mut().toggle_fullscreen();
        let result = if wanted {
            self.document.document_element().map_or(Ok(()), |root| root.request_fullscreen())
        } else {
            self.document.exit_fullscreen();
            Ok(())
        };
        if let Err(err) = result {
            tracing::warn!(error = ?exception_parts(&err), "fullscreen request failed");
            self.session.borrow_mut().set_fullscreen(false);
        }
        self.render_ui();
    }

    fn exit_fullscreen(&self) {
        let was_on = self.session.borrow_mut().exit_fullscreen();
        if was_on {
            self.document.exit_fullscreen();
            self.render_ui();
        }
    }

    /// Write the model's description and Open Graph tags into `<head>`.
    fn apply_page_meta(&self) {
        let Some(meta) = self.session.borrow().page_meta() else {
            return;
        };
        let mut result = self.set_meta("name", "description", &meta.description);
        for (property, content) in &meta.open_graph {
            result = result.and_then(|()| self.set_meta("property", property, content));
        }
        if let Err(err) = result {
            tracing::debug!(error = ?exception_parts(&err), "meta tag update failed");
        }
    }

    fn set_meta(&self, attr: &str, key: &str, content: &str) -> Result<(), JsValue> {
        let tag = match self.document.query_selector(&format!("meta[{attr}=\"{key}\"]"))? {
            Some(tag) => tag,
            None => {
                let tag = self.document.create_element("meta")?;
                tag.set_attribute(attr, key)?;
                if let Some(head) = self.document.head() {
                    head.append_child(&tag)?;
                }
                tag
            }
        };
        tag.set_attribute("content", content)
    }
}

// =============================================================
// Wiring
// =============================================================

fn listen<E: FromWasmAbi + 'static>(
    target: &web_sys::EventTarget,
    kind: &str,
    handler: impl FnMut(E) + 'static,
) -> Result<(), JsValue> {
    let closure = Closure::<dyn FnMut(E)>::new(handler);
    target.add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref())?;
    // Page-lifetime listener.
    closure.forget();
    Ok(())
}

fn on_click(app: &Rc<App>, id: &str, action: impl Fn(&Rc<App>) + 'static) -> Result<(), JsValue> {
    let Some(element) = app.document.get_element_by_id(id) else {
        tracing::debug!(id, "control missing from page");
        return Ok(());
    };
    let app = Rc::clone(app);
    listen(&element, "click", move |_: web_sys::Event| action(&app))
}

fn wire_controls(app: &Rc<App>) -> Result<(), JsValue> {
    on_click(app, ids::START_AR, |app| spawn_local(start_ar(Rc::clone(app))))?;
    on_click(app, ids::EXIT_AR, |app| app.exit_ar())?;
    on_click(app, ids::PLACE_MODEL, |app| {
        let placed = app.session.borrow_mut().place();
        if placed.is_some() {
            app.render_ui();
        }
    })?;
    on_click(app, ids::RESET_PLACEMENTS, |app| {
        let cleared = app.session.borrow_mut().reset_placements();
        if cleared.is_some() {
            app.render_ui();
        }
    })?;
    on_click(app, ids::TOGGLE_ROTATION, |app| {
        app.session.borrow_mut().toggle_rotation();
        app.render_ui();
    })?;
    on_click(app, ids::RESET_VIEW, |app| app.session.borrow_mut().reset_view())?;
    on_click(app, ids::SCREENSHOT, |app| app.take_screenshot())?;
    on_click(app, ids::FULLSCREEN, |app| app.toggle_fullscreen())?;
    on_click(app, ids::DIRECT_AR_MODE, |app| {
        app.session.borrow_mut().set_share_mode(ShareMode::Direct);
        app.render_ui();
    })?;
    on_click(app, ids::WEBPAGE_MODE, |app| {
        app.session.borrow_mut().set_share_mode(ShareMode::Webpage);
        app.render_ui();
    })?;
    on_click(app, ids::COPY_LINK, |app| spawn_local(copy_link(Rc::clone(app))))?;
    on_click(app, ids::SHARE, |app| spawn_local(share(Rc::clone(app))))?;
    on_click(app, ids::DOWNLOAD_QR, |app| app.download_qr())?;

    if let Some(image) = app.document.get_element_by_id(ids::QR_IMAGE) {
        let loaded = Rc::clone(app);
        listen(&image, "load", move |_: web_sys::Event| {
            loaded.session.borrow_mut().qr_loaded();
            loaded.render_ui();
        })?;
        let failed = Rc::clone(app);
        listen(&image, "error", move |_: web_sys::Event| {
            failed.session.borrow_mut().qr_failed();
            failed.render_ui();
        })?;
    }

    let keys = Rc::clone(app);
    listen(&app.document, "keydown", move |event: web_sys::KeyboardEvent| {
        if keys.session.borrow().mode() != SessionMode::Preview {
            return;
        }
        match shortcut_for_key(&event.key()) {
            Some(Shortcut::ToggleRotation) => {
                event.prevent_default();
                keys.session.borrow_mut().toggle_rotation();
                keys.render_ui();
            }
            Some(Shortcut::ResetView) => keys.session.borrow_mut().reset_view(),
            Some(Shortcut::Fullscreen) => keys.toggle_fullscreen(),
            Some(Shortcut::ExitFullscreen) => keys.exit_fullscreen(),
            None => {}
        }
    })?;

    // Browsers also leave fullscreen on their own (system Escape, tab switch).
    let fullscreen = Rc::clone(app);
    listen(&app.document, "fullscreenchange", move |_: web_sys::Event| {
        let on = fullscreen.document.fullscreen_element().is_some();
        fullscreen.session.borrow_mut().set_fullscreen(on);
        fullscreen.render_ui();
    })?;

    let resized = Rc::clone(app);
    listen(&app.window, "resize", move |_: web_sys::Event| resized.resize())
}

fn wire_canvas(app: &Rc<App>) -> Result<(), JsValue> {
    #[allow(clippy::cast_possible_truncation)]
    let point = |event: &web_sys::PointerEvent| (event.client_x() as f32, event.client_y() as f32);

    let down = Rc::clone(app);
    listen(&app.canvas, "pointerdown", move |event: web_sys::PointerEvent| {
        if event.button() == 0 {
            let (x, y) = point(&event);
            let mut drag = down.drag.get();
            drag.start(x, y);
            down.drag.set(drag);
        }
    })?;

    let moved = Rc::clone(app);
    listen(&app.canvas, "pointermove", move |event: web_sys::PointerEvent| {
        let mut drag = moved.drag.get();
        let (x, y) = point(&event);
        #[allow(clippy::cast_precision_loss)]
        let height = moved.canvas.client_height() as f32;
        if let Some((d_azimuth, d_polar)) = drag.move_to(x, y, height) {
            moved.session.borrow_mut().scene_mut().orbit(d_azimuth, d_polar);
        }
        moved.drag.set(drag);
    })?;

    for kind in ["pointerup", "pointercancel", "pointerleave"] {
        let up = Rc::clone(app);
        listen(&app.canvas, kind, move |_: web_sys::PointerEvent| {
            let mut drag = up.drag.get();
            drag.end();
            up.drag.set(drag);
        })?;
    }

    let wheel = Rc::clone(app);
    listen(&app.canvas, "wheel", move |event: web_sys::WheelEvent| {
        event.prevent_default();
        wheel.session.borrow_mut().scene_mut().zoom(wheel_zoom_factor(event.delta_y()));
    })
}

fn start_frame_loop(app: &Rc<App>) {
    let frame_app = Rc::clone(app);
    let callback = Closure::<dyn FnMut(f64, JsValue)>::new(move |time: f64, frame: JsValue| {
        frame_app.on_frame(time, &frame);
    });
    app.platform.engine().set_animation_loop(callback.as_ref().unchecked_ref());
    // The engine drives this for the page's lifetime.
    callback.forget();
}
