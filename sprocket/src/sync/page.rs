//! Synchronous wrappers over asynchronous page queries.

use serde_json::Value;

use crate::host::LocalLoop;
use crate::sync::latch::{Callback, CallbackLatch};
use crate::trace::warn;

/// Result of a script evaluation, as the engine reports it.
pub type ScriptValue = Value;

/// Isolated script execution context within a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WorldId(pub u32);

/// A point in page coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

/// An axis-aligned rectangle in page coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

/// Asynchronous page operations the engine exposes.
///
/// Every operation completes through its callback on a later iteration of
/// the thread's event loop; none complete inline.
pub trait PageOps {
    fn to_plain_text(&mut self, done: Callback<String>);
    fn to_html(&mut self, done: Callback<String>);
    fn find_text(&mut self, needle: &str, done: Callback<bool>);
    fn run_script(&mut self, script: &str, done: Callback<ScriptValue>);
    fn run_script_in_world(&mut self, script: &str, world: WorldId, done: Callback<ScriptValue>);
    /// Starts loading `url`; the callback reports load success.
    fn load(&mut self, url: &str, done: Callback<bool>);
}

/// Fetches the page's plain-text rendering; empty string on timeout.
pub fn plain_text_sync(page: &mut impl PageOps, local: &mut impl LocalLoop) -> String {
    let latch = CallbackLatch::new();
    page.to_plain_text(latch.callback());
    latch.wait(local).unwrap_or_else(|| {
        warn!("plain-text fetch timed out");
        String::new()
    })
}

/// Fetches the page's HTML; empty string on timeout.
pub fn html_sync(page: &mut impl PageOps, local: &mut impl LocalLoop) -> String {
    let latch = CallbackLatch::new();
    page.to_html(latch.callback());
    latch.wait(local).unwrap_or_else(|| {
        warn!("html fetch timed out");
        String::new()
    })
}

/// Looks for `needle` in the page; `false` on timeout.
pub fn find_text_sync(page: &mut impl PageOps, local: &mut impl LocalLoop, needle: &str) -> bool {
    let latch = CallbackLatch::new();
    page.find_text(needle, latch.callback());
    latch.wait(local).unwrap_or_else(|| {
        warn!("text search timed out");
        false
    })
}

/// Evaluates `script` in the page's main world; `Null` on timeout.
pub fn evaluate_script_sync(
    page: &mut impl PageOps,
    local: &mut impl LocalLoop,
    script: &str,
) -> ScriptValue {
    let latch = CallbackLatch::new();
    page.run_script(script, latch.callback());
    latch.wait(local).unwrap_or_else(|| {
        warn!("script evaluation timed out");
        Value::Null
    })
}

/// Evaluates `script` in an isolated world; `Null` on timeout.
pub fn evaluate_script_in_world_sync(
    page: &mut impl PageOps,
    local: &mut impl LocalLoop,
    script: &str,
    world: WorldId,
) -> ScriptValue {
    let latch = CallbackLatch::new();
    page.run_script_in_world(script, world, latch.callback());
    latch.wait(local).unwrap_or_else(|| {
        warn!("isolated script evaluation timed out");
        Value::Null
    })
}

/// Fetches the page's base URL; empty string on timeout.
pub fn base_url_sync(page: &mut impl PageOps, local: &mut impl LocalLoop) -> String {
    let value = evaluate_script_sync(page, local, "document.baseURI");
    value.as_str().map(str::to_owned).unwrap_or_default()
}

/// Loads `url` and waits for completion; `false` on timeout or failure.
pub fn load_sync(page: &mut impl PageOps, local: &mut impl LocalLoop, url: &str) -> bool {
    let latch = CallbackLatch::new();
    page.load(url, latch.callback());
    latch.wait(local).unwrap_or_else(|| {
        warn!("page load timed out");
        false
    })
}

/// On-screen center of the element with DOM id `id`; origin on failure.
pub fn element_center_sync(page: &mut impl PageOps, local: &mut impl LocalLoop, id: &str) -> Point {
    let script = format!(
        "(function(){{\
           var elem = document.getElementById('{id}');\
           var rect = elem.getBoundingClientRect();\
           return [(rect.left + rect.right) / 2, (rect.top + rect.bottom) / 2];\
         }})()"
    );
    let value = evaluate_script_sync(page, local, &script);
    let Some(coords) = as_number_list(&value, 2) else {
        warn!("element center lookup failed");
        return Point::default();
    };
    Point {
        x: coords[0] as i32,
        y: coords[1] as i32,
    }
}

/// Bounding rectangle of the element with DOM id `id`; empty on failure.
pub fn element_rect_sync(page: &mut impl PageOps, local: &mut impl LocalLoop, id: &str) -> Rect {
    let script = format!(
        "(function(){{\
           var elem = document.getElementById('{id}');\
           var rect = elem.getBoundingClientRect();\
           return [rect.left, rect.top, rect.right, rect.bottom];\
         }})()"
    );
    let value = evaluate_script_sync(page, local, &script);
    let Some(coords) = as_number_list(&value, 4) else {
        warn!("element geometry lookup failed");
        return Rect::default();
    };
    Rect {
        left: coords[0] as i32,
        top: coords[1] as i32,
        right: coords[2] as i32,
        bottom: coords[3] as i32,
    }
}

fn as_number_list(value: &ScriptValue, len: usize) -> Option<Vec<f64>> {
    let list = value.as_array()?;
    if list.len() != len {
        return None;
    }
    list.iter().map(Value::as_f64).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn number_list_rejects_wrong_shapes() {
        assert!(as_number_list(&json!([1.0, 2.0]), 2).is_some());
        assert!(as_number_list(&json!([1.0, 2.0, 3.0]), 2).is_none());
        assert!(as_number_list(&json!(["a", "b"]), 2).is_none());
        assert!(as_number_list(&json!(null), 2).is_none());
        assert!(as_number_list(&json!({}), 2).is_none());
    }
}
