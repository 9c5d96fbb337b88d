//! Main-parts lifecycle hooks.
//!
//! The host engine invokes a fixed, ordered sequence of extension points
//! during process startup and shutdown. Each hook has a one-line contract:
//!
//! - pre-early-initialization: install the event-pump factory, before the
//!   engine's main loop is constructed.
//! - pre-create-threads: allow blocking I/O on the calling thread and
//!   install the display/screen provider, before any window exists.
//! - service-connection-started: register this process with the
//!   launch-time/process-id reporting service, if enabled.
//! - post-main-loop-run: destroy the long-lived browsing context, before
//!   the owning process host tears down.

pub mod context;
pub mod coordinator;
pub mod parts;
pub mod screen;

pub use context::{BrowsingContext, LoopToken, MainLoopPresence};
pub use coordinator::{CoordinatorConfig, JsonLineConnector, ProcessRegistration, ServiceConnector};
pub use parts::{
    HostMainParts, MainParts, PumpFactory, PumpRegistry, StartupServices, ThreadPolicy,
    run_shutdown, run_startup,
};
pub use screen::{DisplayBounds, HostScreen, ScreenProvider, ScreenRegistry};
