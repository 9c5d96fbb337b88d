//! Native host binding built on mio's readiness polling.
//!
//! Models the three services the pump needs with no toolkit present:
//! posted closures stand in for toolkit-originated events, a wake counter
//! backs the zero-delay wake-up, and armed timers are kept in a small
//! ordered list and converted into poll timeouts. A [`RemoteWake`] handle
//! makes wake-up posting safe from other threads (the one cross-thread
//! entry an embedding engine needs); everything else stays on the owning
//! thread.

use std::collections::VecDeque;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use mio::{Events, Poll, Token, Waker};
use thiserror::Error;

use crate::host::{HostEvent, HostQueue, Timeout};
use crate::timing::{Duration, Micros, Millis, MonoInstant, Now, TimeUnit};
use crate::trace::trace;

const WAKE: Token = Token(0);

/// Error constructing the native host.
#[derive(Debug, Error)]
pub enum HostError {
    /// Failed to create the readiness poller.
    #[error("failed to create poller: {0}")]
    Poller(io::Error),
    /// Failed to create the cross-thread waker.
    #[error("failed to create waker: {0}")]
    Waker(io::Error),
}

/// Identifier for a timer armed on a [`NativeHost`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeTimerId(u64);

struct ArmedTimer {
    id: NativeTimerId,
    due: MonoInstant<Micros>,
}

/// Native event queue for the thread that owns the pump.
pub struct NativeHost {
    poll: Poll,
    events: Events,
    waker: Arc<Waker>,
    wakeups: Arc<AtomicUsize>,
    timers: Vec<ArmedTimer>,
    tasks: VecDeque<Box<dyn FnOnce()>>,
    next_timer: u64,
}

impl NativeHost {
    /// Creates a new host queue for the calling thread.
    ///
    /// # Errors
    ///
    /// Returns an error if the OS poller or waker cannot be created.
    pub fn new() -> Result<Self, HostError> {
        let poll = Poll::new().map_err(HostError::Poller)?;
        let waker = Waker::new(poll.registry(), WAKE).map_err(HostError::Waker)?;
        Ok(Self {
            poll,
            events: Events::with_capacity(16),
            waker: Arc::new(waker),
            wakeups: Arc::new(AtomicUsize::new(0)),
            timers: Vec::new(),
            tasks: VecDeque::new(),
            next_timer: 0,
        })
    }

    /// Returns a handle that can post wake-ups from other threads.
    #[must_use]
    pub fn remote_wake(&self) -> RemoteWake {
        RemoteWake {
            wakeups: Arc::clone(&self.wakeups),
            waker: Arc::clone(&self.waker),
        }
    }

    /// Enqueues a toolkit-side task. Tasks run on the owning thread, before
    /// the next pump-directed event is surfaced.
    pub fn post_task(&mut self, task: impl FnOnce() + 'static) {
        self.tasks.push_back(Box::new(task));
    }

    fn take_due_timer(&mut self, now: MonoInstant<Micros>) -> Option<NativeTimerId> {
        let pos = self
            .timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due <= now)
            .min_by_key(|(_, t)| t.due)
            .map(|(pos, _)| pos)?;
        Some(self.timers.swap_remove(pos).id)
    }

    fn next_deadline(&self) -> Option<MonoInstant<Micros>> {
        self.timers.iter().map(|t| t.due).min()
    }
}

impl HostQueue for NativeHost {
    type TimerId = NativeTimerId;

    fn post_wakeup(&mut self) {
        self.wakeups.fetch_add(1, Ordering::Release);
    }

    fn arm_timer(&mut self, delay: Duration<Millis>) -> NativeTimerId {
        let id = NativeTimerId(self.next_timer);
        self.next_timer += 1;
        let due = Micros::now() + Duration::new(delay.as_u64() * Micros::PER_MILLI);
        self.timers.push(ArmedTimer { id, due });
        trace!(timer = id.0, delay_ms = delay.as_u64(), "timer armed");
        id
    }

    fn cancel_timer(&mut self, id: NativeTimerId) {
        self.timers.retain(|t| t.id != id);
        trace!(timer = id.0, "timer cancelled");
    }

    /// # Panics
    ///
    /// Panics if the OS poller fails; the queue is not designed to survive
    /// a broken poller.
    fn wait_event(&mut self, timeout: Timeout) -> Option<HostEvent<NativeTimerId>> {
        let wait_deadline = match timeout {
            Timeout::Infinite => None,
            Timeout::Bounded(budget) => {
                Some(Micros::now() + Duration::new(budget.as_u64() * Micros::PER_MILLI))
            }
        };
        loop {
            // Toolkit work drains before any pump event surfaces.
            while let Some(task) = self.tasks.pop_front() {
                task();
            }
            if self.wakeups.load(Ordering::Acquire) > 0 {
                self.wakeups.fetch_sub(1, Ordering::AcqRel);
                return Some(HostEvent::Wakeup);
            }
            let now = Micros::now();
            if let Some(id) = self.take_due_timer(now) {
                return Some(HostEvent::Timer(id));
            }
            if wait_deadline.is_some_and(|d| now >= d) {
                return None;
            }
            let wake_at = match (self.next_deadline(), wait_deadline) {
                (Some(t), Some(d)) => Some(t.min(d)),
                (Some(t), None) => Some(t),
                (None, Some(d)) => Some(d),
                (None, None) => None,
            };
            let poll_timeout =
                wake_at.map(|at| std::time::Duration::from_micros(at.saturating_since(now).as_u64()));
            match self.poll.poll(&mut self.events, poll_timeout) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => panic!("host poller failed: {e}"),
            }
            // The only registered readiness source is the waker; state
            // lives in the wake counter, re-checked at the top of the loop.
        }
    }
}

/// Cross-thread wake-up handle for a [`NativeHost`].
#[derive(Clone)]
pub struct RemoteWake {
    wakeups: Arc<AtomicUsize>,
    waker: Arc<Waker>,
}

impl RemoteWake {
    /// Posts a zero-delay wake-up to the owning thread's queue.
    pub fn wake(&self) {
        self.wakeups.fetch_add(1, Ordering::Release);
        // A failed syscall here only delays the wake-up until the next
        // poll timeout; the counter is already visible.
        let _ = self.waker.wake();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wakeup_is_delivered_before_timers() {
        let mut host = NativeHost::new().expect("host");
        host.arm_timer(Duration::from_millis(1_000));
        host.post_wakeup();
        let event = host.wait_event(Timeout::Bounded(Duration::from_millis(100)));
        assert_eq!(event, Some(HostEvent::Wakeup));
    }

    #[test]
    fn bounded_wait_lapses_when_quiet() {
        let mut host = NativeHost::new().expect("host");
        let event = host.wait_event(Timeout::Bounded(Duration::from_millis(10)));
        assert_eq!(event, None);
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let mut host = NativeHost::new().expect("host");
        let id = host.arm_timer(Duration::from_millis(1));
        host.cancel_timer(id);
        let event = host.wait_event(Timeout::Bounded(Duration::from_millis(20)));
        assert_eq!(event, None);
    }

    #[test]
    fn due_timer_fires_in_order() {
        let mut host = NativeHost::new().expect("host");
        let late = host.arm_timer(Duration::from_millis(30));
        let early = host.arm_timer(Duration::from_millis(1));
        let event = host.wait_event(Timeout::Bounded(Duration::from_millis(200)));
        assert_eq!(event, Some(HostEvent::Timer(early)));
        let event = host.wait_event(Timeout::Bounded(Duration::from_millis(200)));
        assert_eq!(event, Some(HostEvent::Timer(late)));
    }

    #[test]
    fn tasks_run_before_events_surface() {
        let mut host = NativeHost::new().expect("host");
        let ran = std::rc::Rc::new(std::cell::Cell::new(false));
        let flag = std::rc::Rc::clone(&ran);
        host.post_task(move || flag.set(true));
        host.post_wakeup();
        let event = host.wait_event(Timeout::Infinite);
        assert_eq!(event, Some(HostEvent::Wakeup));
        assert!(ran.get());
    }

    #[test]
    fn remote_wake_unblocks_the_owning_thread() {
        let mut host = NativeHost::new().expect("host");
        let remote = host.remote_wake();
        let handle = std::thread::spawn(move || {
            std::thread::sleep(std::time::Duration::from_millis(20));
            remote.wake();
        });
        let event = host.wait_event(Timeout::Infinite);
        assert_eq!(event, Some(HostEvent::Wakeup));
        handle.join().expect("waker thread");
    }
}
