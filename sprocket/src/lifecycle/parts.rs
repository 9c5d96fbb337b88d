//! Lifecycle hook contract and the host's implementation of it.

use crate::lifecycle::context::BrowsingContext;
use crate::lifecycle::coordinator::{CoordinatorConfig, ProcessRegistration, ServiceConnector};
use crate::lifecycle::screen::{ScreenProvider, ScreenRegistry};
use crate::pump::MessagePump;
use crate::trace::debug;

/// Factory producing the UI-thread message pump.
pub type PumpFactory = Box<dyn Fn() -> Box<dyn MessagePump>>;

/// Engine-side slot the engine consults when constructing its main loop.
#[derive(Default)]
pub struct PumpRegistry {
    factory: Option<PumpFactory>,
}

impl PumpRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs the UI-thread pump factory.
    ///
    /// # Panics
    ///
    /// Panics if a factory is already installed: the factory must be set
    /// exactly once, before the main loop is constructed.
    pub fn install_ui_pump_factory(&mut self, factory: PumpFactory) {
        assert!(
            self.factory.is_none(),
            "UI pump factory installed twice"
        );
        self.factory = Some(factory);
    }

    #[must_use]
    pub fn has_ui_pump_factory(&self) -> bool {
        self.factory.is_some()
    }

    /// Creates the UI-thread pump.
    ///
    /// # Panics
    ///
    /// Panics if no factory was installed.
    #[must_use]
    pub fn create_ui_pump(&self) -> Box<dyn MessagePump> {
        let factory = self
            .factory
            .as_ref()
            .expect("no UI pump factory installed");
        factory()
    }
}

/// Per-thread policy toggles granted during startup.
#[derive(Debug, Default)]
pub struct ThreadPolicy {
    blocking_allowed: bool,
}

impl ThreadPolicy {
    /// Permits blocking I/O on the calling thread.
    pub fn allow_blocking(&mut self) {
        self.blocking_allowed = true;
    }

    #[must_use]
    pub fn blocking_allowed(&self) -> bool {
        self.blocking_allowed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum StartupPhase {
    Created,
    EarlyInit,
    ThreadsReady,
}

/// Engine facilities handed to the startup hooks.
pub struct StartupServices {
    pub pumps: PumpRegistry,
    pub policy: ThreadPolicy,
    pub screens: ScreenRegistry,
    phase: StartupPhase,
}

impl Default for StartupServices {
    fn default() -> Self {
        Self::new()
    }
}

impl StartupServices {
    #[must_use]
    pub fn new() -> Self {
        Self {
            pumps: PumpRegistry::new(),
            policy: ThreadPolicy::default(),
            screens: ScreenRegistry::new(),
            phase: StartupPhase::Created,
        }
    }
}

/// Lifecycle hooks invoked by the engine at fixed points in startup and
/// shutdown. All hooks default to no-ops.
pub trait MainParts {
    /// Before any other initialization; the engine's main loop does not
    /// exist yet.
    fn pre_early_initialization(&mut self, _pumps: &mut PumpRegistry) {}

    /// Before worker threads are spawned and before any window exists.
    fn pre_create_threads(&mut self, _policy: &mut ThreadPolicy, _screens: &mut ScreenRegistry) {}

    /// Once the inter-process coordination layer is up.
    fn service_connection_started(&mut self, _connection: &mut dyn ServiceConnector) {}

    /// After the main loop exits, before final teardown.
    fn post_main_loop_run(&mut self) {}
}

/// Runs the startup hooks in their fixed order.
///
/// # Panics
///
/// Panics if called twice for the same services: the sequence runs once
/// per process.
pub fn run_startup(parts: &mut dyn MainParts, services: &mut StartupServices) {
    assert_eq!(
        services.phase,
        StartupPhase::Created,
        "startup hooks already ran"
    );
    parts.pre_early_initialization(&mut services.pumps);
    services.phase = StartupPhase::EarlyInit;
    parts.pre_create_threads(&mut services.policy, &mut services.screens);
    services.phase = StartupPhase::ThreadsReady;
    debug!("startup hooks complete");
}

/// Runs the shutdown hook, after the main loop has exited.
pub fn run_shutdown(parts: &mut dyn MainParts) {
    parts.post_main_loop_run();
    debug!("shutdown hooks complete");
}

/// The host's lifecycle hooks: pump factory, blocking I/O grant, screen
/// provider, coordinator registration, and context teardown.
pub struct HostMainParts {
    pump_factory: Option<PumpFactory>,
    screen: Option<Box<dyn ScreenProvider>>,
    coordinator: CoordinatorConfig,
    context: Option<BrowsingContext>,
    registration: Option<ProcessRegistration>,
}

impl HostMainParts {
    #[must_use]
    pub fn new(
        pump_factory: PumpFactory,
        screen: Box<dyn ScreenProvider>,
        coordinator: CoordinatorConfig,
        context: BrowsingContext,
    ) -> Self {
        Self {
            pump_factory: Some(pump_factory),
            screen: Some(screen),
            coordinator,
            context: Some(context),
            registration: None,
        }
    }

    /// Registration reported to the coordinator, once
    /// [`service_connection_started`](MainParts::service_connection_started)
    /// has run with the coordinator enabled.
    #[must_use]
    pub fn registration(&self) -> Option<&ProcessRegistration> {
        self.registration.as_ref()
    }
}

impl MainParts for HostMainParts {
    fn pre_early_initialization(&mut self, pumps: &mut PumpRegistry) {
        let factory = self
            .pump_factory
            .take()
            .expect("pump factory already handed off");
        pumps.install_ui_pump_factory(factory);
    }

    fn pre_create_threads(&mut self, policy: &mut ThreadPolicy, screens: &mut ScreenRegistry) {
        policy.allow_blocking();
        let screen = self
            .screen
            .take()
            .expect("screen provider already handed off");
        screens.install(screen);
    }

    fn service_connection_started(&mut self, connection: &mut dyn ServiceConnector) {
        if !self.coordinator.enabled {
            debug!("coordinator disabled; skipping registration");
            return;
        }
        connection.start_service(&self.coordinator.service_name);
        let registration = ProcessRegistration::for_current_process();
        connection.register_process(&registration);
        self.registration = Some(registration);
    }

    fn post_main_loop_run(&mut self) {
        // The context's teardown needs the loop token to still be live, so
        // this must run before the owning process host tears down.
        if let Some(context) = self.context.take() {
            context.destroy();
        }
    }
}
