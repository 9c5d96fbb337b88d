//! Registration with the inter-process coordination service.
//!
//! Once the coordination layer is up, the host registers this process with
//! a launch-time/process-id reporting service. Registration is best-effort
//! and config-gated; a disabled coordinator makes the whole hook a no-op.

use std::io::Write;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::trace::warn;

/// Configuration for the process coordination service.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Whether registration happens at all.
    pub enabled: bool,
    /// Service identity to start before registering.
    pub service_name: String,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            service_name: "sprocket-host".into(),
        }
    }
}

/// Identity record reported for the current process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessRegistration {
    pub pid: u32,
    pub launch_time_unix_ms: u64,
    /// Distinguishes re-launches that reuse a pid.
    pub nonce: u32,
}

impl ProcessRegistration {
    #[must_use]
    pub fn for_current_process() -> Self {
        let launch_time_unix_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Self {
            pid: std::process::id(),
            launch_time_unix_ms,
            nonce: rand::random(),
        }
    }
}

/// Connection to the coordination layer.
pub trait ServiceConnector {
    /// Starts the named service.
    fn start_service(&mut self, name: &str);

    /// Reports this process to the registry service.
    fn register_process(&mut self, registration: &ProcessRegistration);
}

#[derive(Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum WireEvent<'a> {
    StartService {
        name: &'a str,
    },
    RegisterProcess {
        #[serde(flatten)]
        registration: &'a ProcessRegistration,
    },
}

/// Connector writing newline-delimited JSON events, for hosts whose
/// coordination transport is a pipe or log stream.
pub struct JsonLineConnector<W: Write> {
    sink: W,
}

impl<W: Write> JsonLineConnector<W> {
    #[must_use]
    pub fn new(sink: W) -> Self {
        Self { sink }
    }

    /// Consumes the connector, returning the sink.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.sink
    }

    fn emit(&mut self, event: &WireEvent<'_>) {
        let line = match serde_json::to_string(event) {
            Ok(line) => line,
            // These records are plain data; serialization cannot fail.
            Err(_) => return,
        };
        if writeln!(self.sink, "{line}").is_err() {
            warn!("coordination sink write failed");
        }
    }
}

impl<W: Write> ServiceConnector for JsonLineConnector<W> {
    fn start_service(&mut self, name: &str) {
        self.emit(&WireEvent::StartService { name });
    }

    fn register_process(&mut self, registration: &ProcessRegistration) {
        self.emit(&WireEvent::RegisterProcess { registration });
    }
}
