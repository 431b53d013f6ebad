//! Observability: structured logging, typed events, counters
//!
//! # Principles
//!
//! 1. Observability is read-only and never changes a response
//! 2. No background threads
//! 3. Deterministic output (sorted keys)
//! 4. Everything goes to stderr
//!
//! # Usage
//!
//! ```ignore
//! use orgquery::observability::{log_event_with_fields, Event, ObservationScope};
//!
//! log_event_with_fields(Event::StoreLoaded, &[("records", "42")]);
//!
//! let scope = ObservationScope::new("OPERATION");
//! // ... do work ...
//! scope.complete();
//! ```

mod events;
mod logger;
mod metrics;
mod scope;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};
pub use scope::ObservationScope;

/// Log a typed event at its default severity
pub fn log_event(event: Event) {
    Logger::log(event.severity(), event.as_str(), &[]);
}

/// Log a typed event with fields at its default severity
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}
