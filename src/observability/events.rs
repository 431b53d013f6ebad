//! Observable lifecycle and request events

use std::fmt;

use super::logger::Severity;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    /// Process startup begins
    BootStart,
    /// Configuration resolved
    ConfigLoaded,
    /// Schema and dataset loaded into the record store
    StoreLoaded,
    /// Startup failed
    BootFailed,
    /// Ready for requests on stdin
    Serving,
    /// Input closed, process exiting
    ShutdownComplete,

    // Requests
    /// Operation call received
    OperationReceived,
    /// Operation completed successfully
    OperationCompleted,
    /// Operation returned a failure response
    OperationFailed,
    /// Summary view read
    ViewRead,
    /// Transport-level request rejected (bad JSON, unknown method)
    RequestRejected,

    // Query engine
    /// Criterion on an undeclared field dropped
    CriterionIgnored,
}

impl Event {
    /// Returns the event name as written to the log
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::BootStart => "BOOT_START",
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::StoreLoaded => "STORE_LOADED",
            Event::BootFailed => "BOOT_FAILED",
            Event::Serving => "SERVING",
            Event::ShutdownComplete => "SHUTDOWN_COMPLETE",
            Event::OperationReceived => "OPERATION_RECEIVED",
            Event::OperationCompleted => "OPERATION_COMPLETED",
            Event::OperationFailed => "OPERATION_FAILED",
            Event::ViewRead => "VIEW_READ",
            Event::RequestRejected => "REQUEST_REJECTED",
            Event::CriterionIgnored => "CRITERION_IGNORED",
        }
    }

    /// Default severity for this event
    pub fn severity(&self) -> Severity {
        match self {
            Event::BootFailed => Severity::Error,
            Event::OperationFailed | Event::RequestRejected | Event::CriterionIgnored => {
                Severity::Warn
            }
            Event::OperationReceived | Event::ViewRead => Severity::Trace,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
