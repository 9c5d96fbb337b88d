//! One-shot latch bridging a callback to a blocking wait.

use std::cell::RefCell;
use std::rc::Rc;

use crate::host::{LocalLoop, LoopSignal, SliceOutcome};
use crate::timing::{Duration, Millis};

/// Completion callback handed to an asynchronous page operation.
pub type Callback<T> = Box<dyn FnOnce(T)>;

/// Default bounded wait for synchronous wrappers.
pub const DEFAULT_WAIT: Duration<Millis> = Duration::from_millis(20_000);

/// Poll slice; the wait re-checks completion after each slice.
const WAIT_SLICE: Duration<Millis> = Duration::from_millis(1_000);

/// Holds the result of one asynchronous operation and blocks a local loop
/// until it arrives.
///
/// The result slot is written at most once; a second write is a
/// programming error. Created per wrapper invocation and consumed by
/// [`wait`](CallbackLatch::wait).
pub struct CallbackLatch<T> {
    slot: Rc<RefCell<Option<T>>>,
    fired: LoopSignal,
}

impl<T: 'static> Default for CallbackLatch<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> CallbackLatch<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            slot: Rc::new(RefCell::new(None)),
            fired: LoopSignal::new(),
        }
    }

    /// The completion callback to hand to the asynchronous operation.
    ///
    /// Invoking it stores the result and terminates the waiting loop.
    /// The returned closure panics if the slot was already written.
    #[must_use]
    pub fn callback(&self) -> Callback<T> {
        let slot = Rc::clone(&self.slot);
        let fired = self.fired.clone();
        Box::new(move |value| {
            let mut slot = slot.borrow_mut();
            assert!(slot.is_none(), "latch result written twice");
            *slot = Some(value);
            fired.raise();
        })
    }

    /// Whether the callback has already fired.
    #[must_use]
    pub fn has_fired(&self) -> bool {
        self.fired.is_raised()
    }

    /// Blocks the local loop until the callback fires or [`DEFAULT_WAIT`]
    /// lapses; `None` on timeout.
    pub fn wait(self, local: &mut dyn LocalLoop) -> Option<T> {
        self.wait_timeout(local, DEFAULT_WAIT)
    }

    /// Blocks the local loop until the callback fires or `timeout` lapses,
    /// polling in fixed slices; `None` on timeout.
    pub fn wait_timeout(self, local: &mut dyn LocalLoop, timeout: Duration<Millis>) -> Option<T> {
        let mut elapsed = 0u64;
        while !self.fired.is_raised() && elapsed < timeout.as_u64() {
            match local.run_slice(WAIT_SLICE, &self.fired) {
                SliceOutcome::Signaled => break,
                SliceOutcome::Lapsed => elapsed += WAIT_SLICE.as_u64(),
            }
        }
        self.slot.borrow_mut().take()
    }
}
