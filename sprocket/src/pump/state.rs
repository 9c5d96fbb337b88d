//! Delayed-work arming state.

use core::fmt;

use crate::host::HostQueue;
use crate::timing::{Duration, Millis, MonoInstant, Now, TimeUnit};
use crate::trace::trace;

/// Tracks the single host timer backing delayed work.
///
/// Invariant: at most one timer is armed at any time, and its deadline
/// equals the recorded pending deadline. Both fields are `Some` together or
/// `None` together.
pub struct PumpState<T, U: TimeUnit> {
    deadline: Option<MonoInstant<U>>,
    timer: Option<T>,
}

impl<T, U: TimeUnit> Default for PumpState<T, U> {
    fn default() -> Self {
        Self {
            deadline: None,
            timer: None,
        }
    }
}

impl<T, U> PumpState<T, U>
where
    T: Copy + Eq + fmt::Debug,
    U: TimeUnit + Now,
{
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Deadline of the armed timer, if any.
    #[must_use]
    pub fn armed_deadline(&self) -> Option<MonoInstant<U>> {
        self.deadline
    }

    /// Records that the armed timer fired.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not the timer this state armed; a fired timer the
    /// pump no longer owns means host cancellation is broken.
    pub(crate) fn on_timer_fired(&mut self, id: T) {
        assert!(
            self.timer == Some(id),
            "timer {id:?} fired but this pump did not arm it"
        );
        self.timer = None;
        self.deadline = None;
    }

    /// Applies a delayed-work deadline request.
    ///
    /// `None` cancels any armed timer. `Some(deadline)` arms one if none is
    /// armed, or rearms only when the new deadline is earlier than the
    /// armed one; a later request never pushes out an earlier pending
    /// deadline.
    pub(crate) fn apply<H>(&mut self, host: &mut H, requested: Option<MonoInstant<U>>)
    where
        H: HostQueue<TimerId = T>,
    {
        match requested {
            None => self.disarm(host),
            Some(deadline) => {
                if let Some(current) = self.deadline {
                    if deadline >= current {
                        return;
                    }
                }
                self.disarm(host);
                let delay = delay_to_millis(U::now(), deadline);
                let id = host.arm_timer(delay);
                trace!(delay_ms = delay.as_u64(), "delayed-work timer armed");
                self.timer = Some(id);
                self.deadline = Some(deadline);
            }
        }
        debug_assert_eq!(self.timer.is_some(), self.deadline.is_some());
    }

    fn disarm<H>(&mut self, host: &mut H)
    where
        H: HostQueue<TimerId = T>,
    {
        if let Some(id) = self.timer.take() {
            host.cancel_timer(id);
        }
        self.deadline = None;
    }
}

/// Millisecond delay until `deadline`, rounded up to whole milliseconds.
///
/// Rounding is always up: firing a delayed-work timer late is harmless,
/// firing it early runs delayed work before its deadline. A deadline in the
/// past converts to zero.
pub(crate) fn delay_to_millis<U: TimeUnit>(
    now: MonoInstant<U>,
    deadline: MonoInstant<U>,
) -> Duration<Millis> {
    let remaining = deadline.saturating_since(now);
    Duration::from_millis(remaining.as_u64().div_ceil(U::PER_MILLI))
}
