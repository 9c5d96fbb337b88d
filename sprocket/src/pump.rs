//! Event-pump adapter.
//!
//! Presents a host toolkit's cooperative event queue as an implementation of
//! an engine's message-pump contract, so engine work items interleave with
//! toolkit UI events on one thread.
//!
//! # Architecture
//!
//! ```text
//!  engine scheduler                    host toolkit queue
//!  ───────────────                     ──────────────────
//!  WorkDelegate  ◄── polls ──  EventPump  ── posts ──►  wake-up events
//!     do_work                      │      ── arms  ──►  single-shot timers
//!     do_delayed_work              │
//!     do_idle_work                 └── waits on ◄──────  HostEvent stream
//! ```
//!
//! The pump never runs work inline: "work is pending" always becomes a
//! zero-delay wake-up posted into the host queue, processed on a later
//! iteration. Delayed work becomes a single host timer, armed for the
//! earliest requested deadline.

mod delegate;
mod event_pump;
mod state;

pub use delegate::{DelayedRun, Scheduler, SharedDelegate, WorkDelegate};
pub use event_pump::{EventPump, MessagePump};
pub use state::PumpState;
