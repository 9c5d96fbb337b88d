//! The pump adapter proper.

use std::rc::Rc;

use crate::host::{HostEvent, HostQueue, LocalLoop, LoopSignal, SliceOutcome, Timeout};
use crate::pump::delegate::{Scheduler, SharedDelegate};
use crate::pump::state::PumpState;
use crate::timing::{Duration, Micros, Millis, MonoInstant, Now, TimeUnit};
use crate::trace::{debug, trace};

/// The message-pump contract the engine drives.
///
/// Object-safe so the engine can hold the UI-thread pump behind a factory.
pub trait MessagePump<U: TimeUnit = Micros> {
    /// Binds `delegate` (first call) and blocks on a local loop until
    /// [`quit`](MessagePump::quit).
    fn run(&mut self, delegate: SharedDelegate<U>);

    /// Requests termination of the innermost active `run` loop.
    fn quit(&mut self);

    /// Posts a zero-delay wake-up so pending work is processed on the next
    /// host loop iteration.
    fn schedule_work(&mut self);

    /// Arms or rearms the delayed-work timer; earlier deadlines win and
    /// `None` cancels.
    fn schedule_delayed_work(&mut self, deadline: Option<MonoInstant<U>>);
}

#[derive(Debug, Default)]
struct LoopFrame {
    quit_requested: bool,
}

/// Adapter presenting a [`HostQueue`] as a [`MessagePump`].
///
/// Single-threaded: all operations run on the thread that owns the host
/// queue. The pump binds exactly one delegate for its lifetime; rebinding a
/// different one is a programming error caught by assertion, as is `quit`
/// with no active loop.
pub struct EventPump<H: HostQueue, U: TimeUnit + Now = Micros> {
    host: H,
    delegate: Option<SharedDelegate<U>>,
    state: PumpState<H::TimerId, U>,
    frames: Vec<LoopFrame>,
}

impl<H: HostQueue, U: TimeUnit + Now> EventPump<H, U> {
    /// Creates a pump with no delegate bound; the first `run` binds one.
    #[must_use]
    pub fn new(host: H) -> Self {
        Self {
            host,
            delegate: None,
            state: PumpState::new(),
            frames: Vec::new(),
        }
    }

    /// Creates a pump with the delegate injected up front.
    #[must_use]
    pub fn with_delegate(host: H, delegate: SharedDelegate<U>) -> Self {
        let mut pump = Self::new(host);
        pump.bind(delegate);
        pump
    }

    /// The underlying host queue.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Mutable access to the host queue, for embedders that feed it
    /// toolkit-side work.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Deadline of the armed delayed-work timer, if any.
    #[must_use]
    pub fn armed_deadline(&self) -> Option<MonoInstant<U>> {
        self.state.armed_deadline()
    }

    /// Binds the delegate, or checks it matches the one already bound.
    ///
    /// # Panics
    ///
    /// Panics if a different delegate is already bound: the pump serves a
    /// single delegate for its lifetime.
    fn bind(&mut self, delegate: SharedDelegate<U>) {
        match &self.delegate {
            None => self.delegate = Some(delegate),
            Some(bound) => assert!(
                Rc::ptr_eq(bound, &delegate),
                "pump already bound to a different delegate"
            ),
        }
    }

    /// Runs the pump loop until `quit`.
    ///
    /// Blocks on the host queue, dispatching wake-ups and timer fires into
    /// the work-processing cycle. May be re-entered; each entry pushes a
    /// logically nested frame and `quit` terminates the innermost one.
    ///
    /// # Panics
    ///
    /// Panics if `delegate` differs from the delegate already bound.
    pub fn run(&mut self, delegate: SharedDelegate<U>) {
        self.bind(delegate);
        self.frames.push(LoopFrame::default());
        let depth = self.frames.len();
        debug!(depth, "pump loop entered");
        loop {
            if self.frames[depth - 1].quit_requested {
                break;
            }
            let event = self
                .host
                .wait_event(Timeout::Infinite)
                .expect("infinite host wait returned without an event");
            self.dispatch(event);
            if self.frames[depth - 1].quit_requested {
                break;
            }
        }
        assert_eq!(
            self.frames.len(),
            depth,
            "nested pump loops must unwind innermost-first"
        );
        self.frames.pop();
        debug!(depth, "pump loop exited");
    }

    /// Requests termination of the innermost active `run` loop.
    ///
    /// # Panics
    ///
    /// Panics if no loop is active.
    pub fn quit(&mut self) {
        self.frames
            .last_mut()
            .expect("quit requires an active run loop")
            .quit_requested = true;
    }

    /// Posts a zero-delay wake-up into the host queue.
    pub fn schedule_work(&mut self) {
        self.host.post_wakeup();
    }

    /// Arms or rearms the delayed-work timer; earlier deadlines win and
    /// `None` cancels.
    pub fn schedule_delayed_work(&mut self, deadline: Option<MonoInstant<U>>) {
        self.state.apply(&mut self.host, deadline);
    }

    /// Feeds one host event into the pump.
    ///
    /// For embedders whose native loop is driven externally; `run` uses
    /// this internally.
    ///
    /// # Panics
    ///
    /// Panics on a timer event the pump did not arm, or if no delegate is
    /// bound.
    pub fn dispatch(&mut self, event: HostEvent<H::TimerId>) {
        match event {
            HostEvent::Wakeup => {
                trace!("wake-up received");
                self.run_work_cycle();
            }
            HostEvent::Timer(id) => {
                trace!("delayed-work timer fired");
                self.state.on_timer_fired(id);
                self.run_work_cycle();
            }
        }
    }

    /// One pass of the work-processing cycle.
    ///
    /// The order is load-bearing: immediate work, then delayed work, then
    /// idle work only if neither reported more. The delayed-work timer is
    /// (re)armed only once no further immediate work exists, so it cannot
    /// fire redundantly mid-burst.
    fn run_work_cycle(&mut self) {
        let delegate = self.delegate.clone().expect("pump delegate not bound");
        let mut delegate = delegate.borrow_mut();
        let mut cx = CycleCx {
            host: &mut self.host,
            state: &mut self.state,
            frames: &mut self.frames,
        };

        let mut more_work = delegate.do_work(&mut cx);

        let delayed = delegate.do_delayed_work(&mut cx);
        more_work |= delayed.more_work;

        if more_work {
            cx.schedule_work();
            return;
        }

        if delegate.do_idle_work(&mut cx) {
            cx.schedule_work();
            return;
        }

        cx.schedule_delayed_work(delayed.next_deadline);
    }
}

/// Borrowed scheduling view handed to delegate callbacks for the duration
/// of one work unit.
struct CycleCx<'a, H: HostQueue, U: TimeUnit + Now> {
    host: &'a mut H,
    state: &'a mut PumpState<H::TimerId, U>,
    frames: &'a mut Vec<LoopFrame>,
}

impl<H: HostQueue, U: TimeUnit + Now> Scheduler<U> for CycleCx<'_, H, U> {
    fn schedule_work(&mut self) {
        self.host.post_wakeup();
    }

    fn schedule_delayed_work(&mut self, deadline: Option<MonoInstant<U>>) {
        self.state.apply(self.host, deadline);
    }

    fn quit(&mut self) {
        self.frames
            .last_mut()
            .expect("quit requires an active run loop")
            .quit_requested = true;
    }
}

impl<H: HostQueue, U: TimeUnit + Now> MessagePump<U> for EventPump<H, U> {
    fn run(&mut self, delegate: SharedDelegate<U>) {
        EventPump::run(self, delegate);
    }

    fn quit(&mut self) {
        EventPump::quit(self);
    }

    fn schedule_work(&mut self) {
        EventPump::schedule_work(self);
    }

    fn schedule_delayed_work(&mut self, deadline: Option<MonoInstant<U>>) {
        EventPump::schedule_delayed_work(self, deadline);
    }
}

impl<H: HostQueue, U: TimeUnit + Now> LocalLoop for EventPump<H, U> {
    fn run_slice(&mut self, budget: Duration<Millis>, until: &LoopSignal) -> SliceOutcome {
        loop {
            if until.is_raised() {
                return SliceOutcome::Signaled;
            }
            match self.host.wait_event(Timeout::Bounded(budget)) {
                Some(event) => self.dispatch(event),
                None => return SliceOutcome::Lapsed,
            }
        }
    }
}
