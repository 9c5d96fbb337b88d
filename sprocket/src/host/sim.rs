//! Deterministic host queue for tests.
//!
//! Records every operation the pump performs (wake-up posts, timer arms and
//! cancellations) and replays them as events on demand. Time is virtual:
//! waiting on an armed timer jumps the sim clock to its due instant instead
//! of sleeping. Clones share state, so a test can hand the pump its host
//! and keep a handle for inspection.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::host::{HostEvent, HostQueue, Timeout};
use crate::timing::{Duration, Millis};

/// Identifier for a timer armed on a [`SimHost`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SimTimerId(u32);

/// One recorded host operation, for test assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostOp {
    /// A zero-delay wake-up was posted.
    Wakeup,
    /// A timer was armed with the given millisecond delay.
    Armed { id: SimTimerId, delay_ms: u64 },
    /// A timer was cancelled.
    Cancelled { id: SimTimerId },
}

#[derive(Default)]
struct SimState {
    /// Virtual milliseconds since the sim started.
    now_ms: u64,
    pending_wakeups: usize,
    armed: Vec<(SimTimerId, u64)>,
    tasks: VecDeque<Box<dyn FnOnce()>>,
    log: Vec<HostOp>,
    next_id: u32,
}

/// Scripted host queue; clones share the same state.
#[derive(Clone, Default)]
pub struct SimHost {
    state: Rc<RefCell<SimState>>,
}

impl SimHost {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueues a toolkit-side task, run before the next event surfaces.
    pub fn post_task(&self, task: impl FnOnce() + 'static) {
        self.state.borrow_mut().tasks.push_back(Box::new(task));
    }

    /// Number of timers currently armed.
    #[must_use]
    pub fn active_timer_count(&self) -> usize {
        self.state.borrow().armed.len()
    }

    /// Ids of the timers currently armed.
    #[must_use]
    pub fn armed_ids(&self) -> Vec<SimTimerId> {
        self.state.borrow().armed.iter().map(|(id, _)| *id).collect()
    }

    /// Wake-ups posted but not yet delivered.
    #[must_use]
    pub fn pending_wakeups(&self) -> usize {
        self.state.borrow().pending_wakeups
    }

    /// Full operation log since construction.
    #[must_use]
    pub fn log(&self) -> Vec<HostOp> {
        self.state.borrow().log.clone()
    }

    /// Millisecond delay of the most recent arm, if any timer was armed.
    #[must_use]
    pub fn last_armed_delay_ms(&self) -> Option<u64> {
        self.state.borrow().log.iter().rev().find_map(|op| match op {
            HostOp::Armed { delay_ms, .. } => Some(*delay_ms),
            _ => None,
        })
    }

    /// Current virtual time in milliseconds.
    #[must_use]
    pub fn now_ms(&self) -> u64 {
        self.state.borrow().now_ms
    }

    fn run_pending_tasks(&self) {
        loop {
            let task = self.state.borrow_mut().tasks.pop_front();
            match task {
                Some(task) => task(),
                None => break,
            }
        }
    }
}

impl HostQueue for SimHost {
    type TimerId = SimTimerId;

    fn post_wakeup(&mut self) {
        let mut state = self.state.borrow_mut();
        state.pending_wakeups += 1;
        state.log.push(HostOp::Wakeup);
    }

    fn arm_timer(&mut self, delay: Duration<Millis>) -> SimTimerId {
        let mut state = self.state.borrow_mut();
        let id = SimTimerId(state.next_id);
        state.next_id += 1;
        let due = state.now_ms + delay.as_u64();
        state.armed.push((id, due));
        state.log.push(HostOp::Armed {
            id,
            delay_ms: delay.as_u64(),
        });
        id
    }

    fn cancel_timer(&mut self, id: SimTimerId) {
        let mut state = self.state.borrow_mut();
        state.armed.retain(|(armed, _)| *armed != id);
        state.log.push(HostOp::Cancelled { id });
    }

    /// # Panics
    ///
    /// Panics on an infinite wait with nothing pending: a sim has no outside
    /// world to produce events, so that wait would block forever.
    fn wait_event(&mut self, timeout: Timeout) -> Option<HostEvent<SimTimerId>> {
        self.run_pending_tasks();
        let mut state = self.state.borrow_mut();
        if state.pending_wakeups > 0 {
            state.pending_wakeups -= 1;
            return Some(HostEvent::Wakeup);
        }
        if let Some(pos) = (0..state.armed.len()).min_by_key(|&i| state.armed[i].1) {
            let (id, due) = state.armed.swap_remove(pos);
            state.now_ms = state.now_ms.max(due);
            return Some(HostEvent::Timer(id));
        }
        match timeout {
            Timeout::Bounded(budget) => {
                state.now_ms += budget.as_u64();
                None
            }
            Timeout::Infinite => panic!("sim host would block forever: no pending events"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wakeups_deliver_before_timers() {
        let mut host = SimHost::new();
        host.arm_timer(Duration::from_millis(5));
        host.post_wakeup();
        assert_eq!(host.wait_event(Timeout::Infinite), Some(HostEvent::Wakeup));
    }

    #[test]
    fn earliest_timer_fires_first_and_advances_time() {
        let mut host = SimHost::new();
        let late = host.arm_timer(Duration::from_millis(50));
        let early = host.arm_timer(Duration::from_millis(10));
        assert_eq!(
            host.wait_event(Timeout::Infinite),
            Some(HostEvent::Timer(early))
        );
        assert_eq!(host.now_ms(), 10);
        assert_eq!(
            host.wait_event(Timeout::Infinite),
            Some(HostEvent::Timer(late))
        );
        assert_eq!(host.now_ms(), 50);
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let mut host = SimHost::new();
        let id = host.arm_timer(Duration::from_millis(1));
        host.cancel_timer(id);
        assert_eq!(
            host.wait_event(Timeout::Bounded(Duration::from_millis(5))),
            None
        );
    }

    #[test]
    fn tasks_run_before_events_surface() {
        let mut host = SimHost::new();
        let handle = host.clone();
        host.post_task(move || {
            let mut inner = handle;
            inner.post_wakeup();
        });
        assert_eq!(host.wait_event(Timeout::Infinite), Some(HostEvent::Wakeup));
    }

    #[test]
    #[should_panic(expected = "block forever")]
    fn starved_infinite_wait_panics() {
        let mut host = SimHost::new();
        let _ = host.wait_event(Timeout::Infinite);
    }
}
