//! The engine-side contract the pump polls.

use std::cell::RefCell;
use std::rc::Rc;

use crate::timing::{Micros, MonoInstant, TimeUnit};

/// Outcome of one delayed-work poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayedRun<U: TimeUnit = Micros> {
    /// Whether more work is plausibly pending.
    pub more_work: bool,
    /// Earliest remaining delayed-work deadline, or `None` when the delayed
    /// queue is empty.
    pub next_deadline: Option<MonoInstant<U>>,
}

impl<U: TimeUnit> DelayedRun<U> {
    /// No work done, nothing pending.
    #[must_use]
    pub const fn idle() -> Self {
        Self {
            more_work: false,
            next_deadline: None,
        }
    }
}

/// Scheduling surface the pump lends to delegate callbacks.
///
/// Requests made here are reentrancy-safe: they translate into host-queue
/// posts and timer operations, never into inline dispatch, so a delegate
/// may call them from inside a running work unit.
pub trait Scheduler<U: TimeUnit = Micros> {
    /// Requests a zero-delay wake-up so pending work runs on the next host
    /// loop iteration.
    fn schedule_work(&mut self);

    /// Requests that the delayed-work timer cover `deadline`; `None` means
    /// no delayed work remains. The armed deadline is always the minimum
    /// requested.
    fn schedule_delayed_work(&mut self, deadline: Option<MonoInstant<U>>);

    /// Requests termination of the innermost active pump loop.
    fn quit(&mut self);
}

/// Supplier of engine work units, polled by the pump.
///
/// Each poll returns a boolean "more work plausible"; the pump uses it to
/// decide whether to re-post a wake-up or fall through to lower-priority
/// work.
pub trait WorkDelegate<U: TimeUnit = Micros> {
    /// Performs one unit of immediate work.
    fn do_work(&mut self, cx: &mut dyn Scheduler<U>) -> bool;

    /// Performs one unit of delayed work whose deadline has passed, and
    /// reports the earliest remaining delayed deadline.
    fn do_delayed_work(&mut self, cx: &mut dyn Scheduler<U>) -> DelayedRun<U>;

    /// Performs one unit of idle work. Only polled when no immediate or
    /// delayed work is pending.
    fn do_idle_work(&mut self, cx: &mut dyn Scheduler<U>) -> bool;
}

/// Shared handle to a work delegate.
///
/// The pump binds exactly one delegate for its lifetime; the handle is
/// shared so the engine side can keep feeding the same scheduler the pump
/// polls.
pub type SharedDelegate<U = Micros> = Rc<RefCell<dyn WorkDelegate<U>>>;
