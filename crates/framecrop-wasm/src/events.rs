//! JavaScript callbacks for engine events.
//!
//! Callbacks are plain JS functions registered on the editor. Events are
//! queued while an editor call runs and delivered on the next microtask,
//! once wasm-bindgen has released the editor, so a callback may call back
//! into the editor. A callback that throws is logged and otherwise ignored.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use framecrop_core::{EncodedRaster, EngineEvents};
use js_sys::Function;
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::spawn_local;

use crate::types::JsRaster;

/// An engine event waiting for delivery.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Pending {
    ImageLoad(u32, u32),
    ImageError(String),
    ExtractComplete(EncodedRaster),
    Cancel,
    Change,
}

/// Registered callbacks, all optional, plus the delivery queue.
#[derive(Default)]
pub(crate) struct JsCallbacks {
    pub(crate) on_image_load: Option<Function>,
    pub(crate) on_image_error: Option<Function>,
    pub(crate) on_extract_complete: Option<Function>,
    pub(crate) on_cancel: Option<Function>,
    pub(crate) on_change: Option<Function>,
    queue: VecDeque<Pending>,
    flush_scheduled: bool,
}

impl JsCallbacks {
    fn callback_for(&self, event: &Pending) -> Option<&Function> {
        match event {
            Pending::ImageLoad(..) => self.on_image_load.as_ref(),
            Pending::ImageError(_) => self.on_image_error.as_ref(),
            Pending::ExtractComplete(_) => self.on_extract_complete.as_ref(),
            Pending::Cancel => self.on_cancel.as_ref(),
            Pending::Change => self.on_change.as_ref(),
        }
    }

    /// Queue `event` if someone listens for it. Back-to-back changes collapse
    /// into one. Returns true when a flush must be scheduled.
    pub(crate) fn push(&mut self, event: Pending) -> bool {
        if self.callback_for(&event).is_none() {
            return false;
        }
        if event == Pending::Change && self.queue.back() == Some(&Pending::Change) {
            return false;
        }
        self.queue.push_back(event);
        if self.flush_scheduled {
            return false;
        }
        self.flush_scheduled = true;
        true
    }

    /// Next event and its current callback. Clears the flush flag once the
    /// queue is empty.
    fn pop(&mut self) -> Option<(Pending, Option<Function>)> {
        match self.queue.pop_front() {
            Some(event) => {
                let f = self.callback_for(&event).cloned();
                Some((event, f))
            }
            None => {
                self.flush_scheduled = false;
                None
            }
        }
    }

    #[cfg(test)]
    fn pending(&self) -> Vec<Pending> {
        self.queue.iter().cloned().collect()
    }
}

/// Event sink handed to the engine. The editor keeps a second handle so
/// callbacks can be swapped after construction.
#[derive(Clone, Default)]
pub(crate) struct SharedCallbacks(pub(crate) Rc<RefCell<JsCallbacks>>);

impl SharedCallbacks {
    fn enqueue(&self, event: Pending) {
        if self.0.borrow_mut().push(event) {
            let sink = self.clone();
            spawn_local(async move { sink.flush() });
        }
    }

    /// Deliver queued events. The borrow is dropped before each call, so a
    /// callback may re-register callbacks or trigger further events.
    fn flush(&self) {
        loop {
            let next = self.0.borrow_mut().pop();
            let Some((event, f)) = next else {
                return;
            };
            if let Some(f) = f {
                dispatch(&f, event);
            }
        }
    }
}

fn dispatch(f: &Function, event: Pending) {
    let (name, result) = match event {
        Pending::ImageLoad(width, height) => (
            "onImageLoad",
            f.call2(&JsValue::NULL, &JsValue::from(width), &JsValue::from(height)),
        ),
        Pending::ImageError(message) => (
            "onImageError",
            f.call1(&JsValue::NULL, &JsValue::from_str(&message)),
        ),
        Pending::ExtractComplete(raster) => (
            "onExtractComplete",
            f.call1(&JsValue::NULL, &JsValue::from(JsRaster::from(raster))),
        ),
        Pending::Cancel => ("onCancel", f.call0(&JsValue::NULL)),
        Pending::Change => ("onChange", f.call0(&JsValue::NULL)),
    };
    if let Err(err) = result {
        log::warn!("{name} callback threw: {err:?}");
    }
}

impl EngineEvents for SharedCallbacks {
    fn on_image_load(&mut self, width: u32, height: u32) {
        self.enqueue(Pending::ImageLoad(width, height));
    }

    fn on_image_error(&mut self, message: &str) {
        self.enqueue(Pending::ImageError(message.to_string()));
    }

    fn on_extract_complete(&mut self, raster: &EncodedRaster) {
        self.enqueue(Pending::ExtractComplete(raster.clone()));
    }

    fn on_cancel(&mut self) {
        self.enqueue(Pending::Cancel);
    }

    fn on_change(&mut self) {
        self.enqueue(Pending::Change);
    }
}
