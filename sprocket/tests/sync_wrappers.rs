//! Synchronous wrapper behavior over a scripted page.
//!
//! `TaskLoop` plays the role of the thread's local event loop: page
//! operations enqueue their completion callbacks as tasks, and the loop
//! runs them while a wrapper waits. The last test drives the real pump
//! instead, with completions delivered through the engine delegate.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use serde_json::json;
use sprocket::host::{HostQueue, LocalLoop, LoopSignal, SimHost, SliceOutcome};
use sprocket::pump::{DelayedRun, EventPump, Scheduler, SharedDelegate, WorkDelegate};
use sprocket::sync::{
    Callback, PageOps, Point, Rect, ScriptValue, WorldId, base_url_sync, element_center_sync,
    element_rect_sync, evaluate_script_in_world_sync, evaluate_script_sync, find_text_sync,
    html_sync, load_sync, plain_text_sync,
};
use sprocket::timing::{Duration, Millis};

type TaskQueue = Rc<RefCell<VecDeque<Box<dyn FnOnce()>>>>;

/// Stand-in for the thread's local event loop: drains queued tasks.
#[derive(Clone, Default)]
struct TaskLoop {
    tasks: TaskQueue,
}

impl LocalLoop for TaskLoop {
    fn run_slice(&mut self, _budget: Duration<Millis>, until: &LoopSignal) -> SliceOutcome {
        loop {
            if until.is_raised() {
                return SliceOutcome::Signaled;
            }
            let task = self.tasks.borrow_mut().pop_front();
            match task {
                Some(task) => task(),
                None => return SliceOutcome::Lapsed,
            }
        }
    }
}

/// Scripted page: completions are posted to the shared task queue, so they
/// arrive on a later loop iteration, never inline.
struct FakePage {
    tasks: TaskQueue,
    text: String,
    html: String,
    script_result: ScriptValue,
    load_ok: bool,
    /// When false, operations never complete (timeout path).
    responds: bool,
    scripts_seen: Vec<String>,
    worlds_seen: Vec<WorldId>,
}

impl FakePage {
    fn new(tasks: TaskQueue) -> Self {
        Self {
            tasks,
            text: String::new(),
            html: String::new(),
            script_result: ScriptValue::Null,
            load_ok: true,
            responds: true,
            scripts_seen: Vec::new(),
            worlds_seen: Vec::new(),
        }
    }

    fn complete<T: 'static>(&mut self, done: Callback<T>, value: T) {
        if self.responds {
            self.tasks.borrow_mut().push_back(Box::new(move || done(value)));
        }
    }
}

impl PageOps for FakePage {
    fn to_plain_text(&mut self, done: Callback<String>) {
        let text = self.text.clone();
        self.complete(done, text);
    }

    fn to_html(&mut self, done: Callback<String>) {
        let html = self.html.clone();
        self.complete(done, html);
    }

    fn find_text(&mut self, needle: &str, done: Callback<bool>) {
        let found = self.text.contains(needle);
        self.complete(done, found);
    }

    fn run_script(&mut self, script: &str, done: Callback<ScriptValue>) {
        self.scripts_seen.push(script.to_owned());
        let result = self.script_result.clone();
        self.complete(done, result);
    }

    fn run_script_in_world(&mut self, script: &str, world: WorldId, done: Callback<ScriptValue>) {
        self.worlds_seen.push(world);
        self.scripts_seen.push(script.to_owned());
        let result = self.script_result.clone();
        self.complete(done, result);
    }

    fn load(&mut self, _url: &str, done: Callback<bool>) {
        let ok = self.load_ok;
        self.complete(done, ok);
    }
}

fn page_and_loop() -> (FakePage, TaskLoop) {
    let local = TaskLoop::default();
    let page = FakePage::new(local.tasks.clone());
    (page, local)
}

#[test]
fn plain_text_round_trip() {
    let (mut page, mut local) = page_and_loop();
    page.text = "hello pump".into();
    assert_eq!(plain_text_sync(&mut page, &mut local), "hello pump");
}

#[test]
fn html_round_trip() {
    let (mut page, mut local) = page_and_loop();
    page.html = "<p>ok</p>".into();
    assert_eq!(html_sync(&mut page, &mut local), "<p>ok</p>");
}

#[test]
fn find_text_reports_hits_and_misses() {
    let (mut page, mut local) = page_and_loop();
    page.text = "needle in a haystack".into();
    assert!(find_text_sync(&mut page, &mut local, "needle"));
    assert!(!find_text_sync(&mut page, &mut local, "pitchfork"));
}

#[test]
fn script_evaluation_returns_engine_value() {
    let (mut page, mut local) = page_and_loop();
    page.script_result = json!({"answer": 42});
    let value = evaluate_script_sync(&mut page, &mut local, "computeAnswer()");
    assert_eq!(value["answer"], 42);
    assert_eq!(page.scripts_seen, vec!["computeAnswer()"]);
}

#[test]
fn isolated_world_is_forwarded() {
    let (mut page, mut local) = page_and_loop();
    page.script_result = json!(true);
    let value = evaluate_script_in_world_sync(&mut page, &mut local, "probe()", WorldId(7));
    assert_eq!(value, json!(true));
    assert_eq!(page.worlds_seen, vec![WorldId(7)]);
}

#[test]
fn base_url_comes_from_the_page() {
    let (mut page, mut local) = page_and_loop();
    page.script_result = json!("https://example.com/a/");
    assert_eq!(base_url_sync(&mut page, &mut local), "https://example.com/a/");
    assert_eq!(page.scripts_seen, vec!["document.baseURI"]);
}

#[test]
fn load_reports_success_and_failure() {
    let (mut page, mut local) = page_and_loop();
    assert!(load_sync(&mut page, &mut local, "https://example.com/"));
    page.load_ok = false;
    assert!(!load_sync(&mut page, &mut local, "https://example.com/"));
}

#[test]
fn element_center_parses_coordinates() {
    let (mut page, mut local) = page_and_loop();
    page.script_result = json!([150.0, 75.0]);
    assert_eq!(
        element_center_sync(&mut page, &mut local, "submit"),
        Point { x: 150, y: 75 }
    );
    let script = &page.scripts_seen[0];
    assert!(script.contains("getElementById('submit')"));
    assert!(script.contains("getBoundingClientRect"));
}

#[test]
fn element_center_degrades_on_malformed_result() {
    let (mut page, mut local) = page_and_loop();
    page.script_result = json!(["left", "right", "extra"]);
    assert_eq!(
        element_center_sync(&mut page, &mut local, "submit"),
        Point::default()
    );
}

#[test]
fn element_rect_parses_geometry() {
    let (mut page, mut local) = page_and_loop();
    page.script_result = json!([10.0, 20.0, 110.0, 220.0]);
    assert_eq!(
        element_rect_sync(&mut page, &mut local, "viewport"),
        Rect {
            left: 10,
            top: 20,
            right: 110,
            bottom: 220
        }
    );
}

#[test]
fn wrapper_times_out_to_default_instead_of_blocking() {
    let (mut page, mut local) = page_and_loop();
    page.responds = false;
    page.text = "never delivered".into();
    assert_eq!(plain_text_sync(&mut page, &mut local), "");
    assert!(!load_sync(&mut page, &mut local, "https://example.com/"));
    assert_eq!(
        evaluate_script_sync(&mut page, &mut local, "probe()"),
        ScriptValue::Null
    );
}

/// Page whose completions flow through the engine delegate: each operation
/// queues an engine work unit and wakes the pump.
struct EnginePage {
    host: SimHost,
    ops: TaskQueue,
    html: String,
}

impl EnginePage {
    fn submit<T: 'static>(&mut self, done: Callback<T>, value: T) {
        self.ops.borrow_mut().push_back(Box::new(move || done(value)));
        self.host.post_wakeup();
    }
}

impl PageOps for EnginePage {
    fn to_plain_text(&mut self, done: Callback<String>) {
        self.submit(done, String::new());
    }

    fn to_html(&mut self, done: Callback<String>) {
        let html = self.html.clone();
        self.submit(done, html);
    }

    fn find_text(&mut self, _needle: &str, done: Callback<bool>) {
        self.submit(done, false);
    }

    fn run_script(&mut self, _script: &str, done: Callback<ScriptValue>) {
        self.submit(done, ScriptValue::Null);
    }

    fn run_script_in_world(&mut self, _script: &str, _world: WorldId, done: Callback<ScriptValue>) {
        self.submit(done, ScriptValue::Null);
    }

    fn load(&mut self, _url: &str, done: Callback<bool>) {
        self.submit(done, true);
    }
}

/// Engine delegate draining the shared op queue one unit per poll.
struct EngineDelegate {
    ops: TaskQueue,
}

impl WorkDelegate for EngineDelegate {
    fn do_work(&mut self, _cx: &mut dyn Scheduler) -> bool {
        let op = self.ops.borrow_mut().pop_front();
        match op {
            Some(op) => {
                op();
                !self.ops.borrow().is_empty()
            }
            None => false,
        }
    }

    fn do_delayed_work(&mut self, _cx: &mut dyn Scheduler) -> DelayedRun {
        DelayedRun::idle()
    }

    fn do_idle_work(&mut self, _cx: &mut dyn Scheduler) -> bool {
        false
    }
}

#[test]
fn wrapper_pumps_the_engine_until_its_callback_lands() {
    let host = SimHost::new();
    let ops: TaskQueue = TaskQueue::default();
    let shared: SharedDelegate = Rc::new(RefCell::new(EngineDelegate { ops: ops.clone() }));
    let mut pump = EventPump::with_delegate(host.clone(), shared);
    let mut page = EnginePage {
        host,
        ops,
        html: "<title>pumped</title>".into(),
    };

    assert_eq!(html_sync(&mut page, &mut pump), "<title>pumped</title>");
    assert_eq!(pump.armed_deadline(), None);
}
