//! Host-toolkit event services consumed by the pump.
//!
//! The pump never talks to a concrete toolkit. It sees three narrow
//! interfaces: a queue it can post zero-delay wake-ups into and arm
//! single-shot millisecond timers on ([`HostQueue`]), the events that queue
//! delivers back ([`HostEvent`]), and a nested blocking loop used by the
//! synchronous wrappers ([`LocalLoop`]). Production embeds use
//! [`NativeHost`]; tests use [`SimHost`].

use std::cell::Cell;
use std::rc::Rc;

use crate::timing::{Duration, Millis};

pub mod native;
pub mod sim;

pub use native::{HostError, NativeHost, NativeTimerId, RemoteWake};
pub use sim::{HostOp, SimHost, SimTimerId};

/// Timeout specification for blocking host waits.
#[derive(Debug, Clone, Copy)]
pub enum Timeout {
    /// Wait indefinitely.
    Infinite,
    /// Wait for at most the specified duration.
    Bounded(Duration<Millis>),
}

/// An event the host queue delivers to the pump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent<T> {
    /// A zero-delay wake-up posted via [`HostQueue::post_wakeup`].
    Wakeup,
    /// A single-shot timer armed via [`HostQueue::arm_timer`] has fired.
    Timer(T),
}

/// A host toolkit's single-threaded cooperative event queue.
///
/// Contract:
/// - Timers are single-shot. A cancelled timer never fires; implementations
///   must drop any queued fire on cancellation.
/// - Toolkit-originated events (UI work) are dispatched internally by the
///   host and never surface through [`wait_event`]; only pump-directed
///   events do.
/// - All methods are called from the thread that owns the queue.
///
/// [`wait_event`]: HostQueue::wait_event
pub trait HostQueue {
    /// Identifier for an armed timer.
    type TimerId: Copy + Eq + core::fmt::Debug;

    /// Posts a zero-delay wake-up event into the queue.
    ///
    /// The wake-up is delivered on a later queue iteration, never inline,
    /// so posting from inside a work callback is safe.
    fn post_wakeup(&mut self);

    /// Arms a single-shot timer that fires after `delay`.
    fn arm_timer(&mut self, delay: Duration<Millis>) -> Self::TimerId;

    /// Cancels an armed timer.
    fn cancel_timer(&mut self, id: Self::TimerId);

    /// Blocks until the next pump-directed event, dispatching toolkit work
    /// internally while waiting.
    ///
    /// Returns `None` only when a bounded timeout lapses with no event.
    fn wait_event(&mut self, timeout: Timeout) -> Option<HostEvent<Self::TimerId>>;
}

/// Single-use completion flag shared between a nested loop and the callback
/// that terminates it.
#[derive(Debug, Clone, Default)]
pub struct LoopSignal(Rc<Cell<bool>>);

impl LoopSignal {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests termination of the loop currently waiting on this signal.
    pub fn raise(&self) {
        self.0.set(true);
    }

    #[must_use]
    pub fn is_raised(&self) -> bool {
        self.0.get()
    }
}

/// Outcome of one [`LocalLoop::run_slice`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceOutcome {
    /// The signal was raised while the slice ran.
    Signaled,
    /// The slice budget lapsed with the signal still low.
    Lapsed,
}

/// A temporary blocking loop used to wait for a specific condition without
/// leaving the enclosing scope.
pub trait LocalLoop {
    /// Processes events until `until` is raised or the queue stays quiet
    /// for `budget`.
    fn run_slice(&mut self, budget: Duration<Millis>, until: &LoopSignal) -> SliceOutcome;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loop_signal_latches() {
        let signal = LoopSignal::new();
        assert!(!signal.is_raised());
        let other = signal.clone();
        other.raise();
        assert!(signal.is_raised());
    }
}
