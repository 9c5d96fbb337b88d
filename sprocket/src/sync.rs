//! Blocking call/wait helpers for test code.
//!
//! Page queries are asynchronous: the engine answers through a callback on
//! a later loop iteration. Tests want straight-line code, so each wrapper
//! here submits the asynchronous operation and spins a local event loop
//! until the callback fires or a bounded wait lapses. A lapsed wait
//! degrades to the result type's default value. There is no distinct
//! timeout signal; callers check for the default or lean on the test
//! framework's own failure reporting.

pub mod latch;
pub mod page;

pub use latch::{Callback, CallbackLatch, DEFAULT_WAIT};
pub use page::{
    PageOps, Point, Rect, ScriptValue, WorldId, base_url_sync, element_center_sync,
    element_rect_sync, evaluate_script_in_world_sync, evaluate_script_sync, find_text_sync,
    html_sync, load_sync, plain_text_sync,
};
