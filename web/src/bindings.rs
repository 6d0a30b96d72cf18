//! `wasm-bindgen` imports: the WebXR device API and the JS render engine.
//!
//! WebXR is bound structurally (by method name on the JS object) so only the
//! calls the viewer makes are declared. The engine lives in `js/engine.js`
//! and wraps three.js.

use js_sys::{Array, Float32Array, Function, Promise, Reflect};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::HtmlCanvasElement;

// =============================================================
// WebXR
// =============================================================

#[wasm_bindgen]
extern "C" {
    /// `navigator.xr`
    pub type XrSystem;

    #[wasm_bindgen(method, js_name = isSessionSupported)]
    pub fn is_session_supported(this: &XrSystem, mode: &str) -> Promise;

    #[wasm_bindgen(method, js_name = requestSession)]
    pub fn request_session(this: &XrSystem, mode: &str, init: &JsValue) -> Promise;

    #[derive(Clone)]
    pub type XrSession;

    #[wasm_bindgen(method, js_name = requestReferenceSpace)]
    pub fn request_reference_space(this: &XrSession, kind: &str) -> Promise;

    #[wasm_bindgen(method, js_name = requestHitTestSource)]
    pub fn request_hit_test_source(this: &XrSession, options: &JsValue) -> Promise;

    #[wasm_bindgen(method)]
    pub fn end(this: &XrSession) -> Promise;

    #[wasm_bindgen(method, getter, js_name = inputSources)]
    pub fn input_sources(this: &XrSession) -> JsValue;

    #[wasm_bindgen(method, js_name = addEventListener)]
    pub fn add_event_listener(this: &XrSession, kind: &str, listener: &Function);

    #[wasm_bindgen(method, js_name = removeEventListener)]
    pub fn remove_event_listener(this: &XrSession, kind: &str, listener: &Function);

    pub type XrFrame;

    #[wasm_bindgen(method, js_name = getHitTestResults)]
    pub fn get_hit_test_results(this: &XrFrame, source: &JsValue) -> Array;

    pub type XrHitTestResult;

    #[wasm_bindgen(method, js_name = getPose)]
    pub fn get_pose(this: &XrHitTestResult, base_space: &JsValue) -> Option<XrPose>;

    pub type XrPose;

    #[wasm_bindgen(method, getter)]
    pub fn transform(this: &XrPose) -> XrRigidTransform;

    pub type XrRigidTransform;

    #[wasm_bindgen(method, getter)]
    pub fn matrix(this: &XrRigidTransform) -> Float32Array;

    pub type XrInputSourceEvent;

    #[wasm_bindgen(method, getter, js_name = inputSource)]
    pub fn input_source(this: &XrInputSourceEvent) -> JsValue;
}

/// `navigator.xr`, when the browser exposes WebXR at all.
pub fn xr_system() -> Option<XrSystem> {
    let navigator = web_sys::window()?.navigator();
    let xr = Reflect::get(&navigator, &JsValue::from_str("xr")).unwrap_or(JsValue::UNDEFINED);
    (!xr.is_undefined() && !xr.is_null()).then(|| xr.unchecked_into())
}

/// `{ name, message }` of a rejected WebXR promise.
pub fn exception_parts(err: &JsValue) -> (String, String) {
    let field = |key: &str| Reflect::get(err, &JsValue::from_str(key)).ok().and_then(|v| v.as_string());
    let name = field("name").unwrap_or_else(|| "Error".to_owned());
    let message = field("message").or_else(|| err.as_string()).unwrap_or_default();
    (name, message)
}

/// Pulse the first haptic actuator of an input source. Covers both the
/// standard `gamepad.hapticActuators` and the older `haptics` array.
pub fn pulse_input_source(source: &JsValue, intensity: f32, duration_ms: u32) -> bool {
    let get = |target: &JsValue, key: &str| {
        Reflect::get(target, &JsValue::from_str(key)).unwrap_or(JsValue::UNDEFINED)
    };
    let gamepad = get(source, "gamepad");
    let actuators = if gamepad.is_object() { get(&gamepad, "hapticActuators") } else { get(source, "haptics") };
    if !Array::is_array(&actuators) {
        return false;
    }
    let actuator = Array::from(&actuators).get(0);
    let pulse = get(&actuator, "pulse");
    let Some(pulse) = pulse.dyn_ref::<Function>() else {
        return false;
    };
    pulse
        .call2(&actuator, &JsValue::from_f64(f64::from(intensity)), &JsValue::from_f64(f64::from(duration_ms)))
        .is_ok()
}

// =============================================================
// Render engine
// =============================================================

#[wasm_bindgen(module = "/js/engine.js")]
extern "C" {
    pub type Engine;

    #[wasm_bindgen(constructor, catch)]
    pub fn new(canvas: &HtmlCanvasElement) -> Result<Engine, JsValue>;

    /// Resolves to `{ handle, min: [x, y, z], max: [x, y, z] }`.
    #[wasm_bindgen(method, js_name = importAsset)]
    pub fn import_asset(this: &Engine, url: &str, on_progress: &Function) -> Promise;

    /// Same record shape as `importAsset`, synchronously.
    #[wasm_bindgen(method, js_name = createDemoCube)]
    pub fn create_demo_cube(this: &Engine) -> JsValue;

    #[wasm_bindgen(method)]
    pub fn resize(this: &Engine, width: u32, height: u32);

    #[wasm_bindgen(method, js_name = beginSync)]
    pub fn begin_sync(this: &Engine, transparent: bool);

    #[wasm_bindgen(method, js_name = syncNode)]
    pub fn sync_node(
        this: &Engine,
        id: &str,
        kind: &str,
        handle: u32,
        params: &[f32],
        matrix: &[f32],
        visible: bool,
    );

    /// Detach every node not synced since `beginSync`.
    #[wasm_bindgen(method, js_name = endSync)]
    pub fn end_sync(this: &Engine);

    /// Draw with the given camera, or the XR camera while a session runs.
    #[wasm_bindgen(method)]
    pub fn render(this: &Engine, view: &[f32], projection: &[f32]);

    /// PNG data URL of the last drawn preview frame.
    #[wasm_bindgen(method, catch)]
    pub fn screenshot(this: &Engine) -> Result<String, JsValue>;

    /// Callback receives `(time, xrFrame | null)`.
    #[wasm_bindgen(method, js_name = setAnimationLoop)]
    pub fn set_animation_loop(this: &Engine, callback: &Function);

    #[wasm_bindgen(method, js_name = setXrSession)]
    pub fn set_xr_session(this: &Engine, session: &XrSession) -> Promise;
}
