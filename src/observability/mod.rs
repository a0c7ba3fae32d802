//! Observability subsystem for heliosdb
//!
//! Provides:
//! - Structured logging via `tracing`
//! - Typed event names for lifecycle transitions
//! - Monotonic counters for the apply pipeline
//!
//! # Principles
//!
//! 1. Observability is read-only
//! 2. No side effects on apply decisions
//! 3. No background threads
//!
//! # Usage
//!
//! ```ignore
//! use heliosdb::observability::{Event, MetricsRegistry};
//!
//! tracing::info!(event = %Event::ReplayComplete, records = 42, "replay finished");
//!
//! let metrics = MetricsRegistry::new();
//! metrics.increment_commits();
//! ```

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::init as init_logging;
pub use metrics::{MetricsRegistry, MetricsSnapshot};
