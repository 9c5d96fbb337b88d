//! Cooperative event-pump adapter.
//!
//! `sprocket` lets an embedded engine's work scheduler run inside a host UI
//! toolkit's own event loop, on one thread, without a second thread or a
//! busy-wait. The engine supplies work through a polled delegate; the pump
//! translates "work is pending" into host-queue primitives (zero-delay
//! wake-up events and single-shot timers) so engine work interleaves with
//! toolkit-originated UI events.
//!
//! - `pump`: the adapter proper: delegate contract, pump state, work cycle.
//! - `host`: host-queue and nested-loop interfaces plus the mio-backed
//!   native binding and a deterministic sim host for tests.
//! - `lifecycle`: main-parts hooks the engine invokes at fixed points in
//!   process startup/shutdown.
//! - `sync`: blocking call/wait helpers that turn asynchronous page queries
//!   into synchronous calls for test code.
//! - `timing`: typed time units shared by all of the above.

pub mod host;
pub mod lifecycle;
pub mod pump;
pub mod sync;
pub mod timing;

pub(crate) mod trace;

pub use trace::init_tracing;
