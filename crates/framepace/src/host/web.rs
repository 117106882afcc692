//! Browser host.
//!
//! Capability detection mirrors what a page script would do: look the
//! primitive up on `window` and check that it is callable. Frames and timers go
//! through `gloo`; `requestIdleCallback` has no `gloo` wrapper and is bound
//! directly.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use gloo_render::{request_animation_frame, AnimationFrame};
use gloo_timers::callback::Timeout;
use js_sys::Reflect;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};

use super::{
    Capabilities, FrameCallback, Host, HostError, IdleCallback, IdleDeadline, Primitive,
    TimerCallback,
};

pub struct WebHost {
    window: web_sys::Window,
    performance: web_sys::Performance,
    capabilities: Capabilities,
    /// Dropping an `AnimationFrame` cancels it, so handles live here until
    /// their callback has run.
    frames: RefCell<HashMap<u64, AnimationFrame>>,
    /// Ids whose callbacks ran; their handles are released on the next request.
    fired: Rc<RefCell<Vec<u64>>>,
    next_frame_id: Cell<u64>,
}

impl WebHost {
    pub fn new() -> Result<Self, HostError> {
        let window = web_sys::window().ok_or(HostError::Unavailable("no global window"))?;
        let performance = window
            .performance()
            .ok_or(HostError::Unavailable("window.performance"))?;

        let capabilities = Capabilities {
            animation_frame: is_function(&window, "requestAnimationFrame"),
            idle_callback: is_function(&window, "requestIdleCallback"),
        };
        log::debug!("web host capabilities: {capabilities:?}");

        Ok(Self {
            window,
            performance,
            capabilities,
            frames: RefCell::new(HashMap::new()),
            fired: Rc::new(RefCell::new(Vec::new())),
            next_frame_id: Cell::new(0),
        })
    }
}

fn is_function(window: &web_sys::Window, name: &str) -> bool {
    Reflect::get(window.as_ref(), &JsValue::from_str(name))
        .map(|value| value.is_function())
        .unwrap_or(false)
}

/// `setTimeout` takes whole milliseconds.
fn timeout_millis(delay_ms: f64) -> u32 {
    delay_ms.max(0.0).round().min(f64::from(u32::MAX)) as u32
}

impl Host for WebHost {
    fn now(&self) -> f64 {
        self.performance.now()
    }

    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn request_animation_frame(&self, callback: FrameCallback) -> Result<(), HostError> {
        if !self.capabilities.animation_frame {
            return Err(HostError::Unsupported(Primitive::AnimationFrame));
        }

        let mut frames = self.frames.borrow_mut();
        for id in self.fired.borrow_mut().drain(..) {
            frames.remove(&id);
        }

        let id = self.next_frame_id.get();
        self.next_frame_id.set(id.wrapping_add(1));

        let fired = Rc::clone(&self.fired);
        let handle = request_animation_frame(move |timestamp| {
            fired.borrow_mut().push(id);
            callback(timestamp);
        });
        frames.insert(id, handle);
        Ok(())
    }

    fn request_idle_callback(&self, callback: IdleCallback) -> Result<(), HostError> {
        if !self.capabilities.idle_callback {
            return Err(HostError::Unsupported(Primitive::IdleCallback));
        }
        let closure = Closure::once_into_js(move |deadline: web_sys::IdleDeadline| {
            callback(IdleDeadline {
                time_remaining_ms: deadline.time_remaining(),
                did_timeout: deadline.did_timeout(),
            })
        });
        self.window
            .request_idle_callback(closure.unchecked_ref())
            .map(|_| ())
            .map_err(|e| HostError::rejected(Primitive::IdleCallback, format!("{e:?}")))
    }

    fn set_timeout(&self, delay_ms: f64, callback: TimerCallback) -> Result<(), HostError> {
        Timeout::new(timeout_millis(delay_ms), callback).forget();
        Ok(())
    }
}
