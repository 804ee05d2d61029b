//! Observability subsystem for dictgate
//!
//! This module provides:
//! - Structured logging through `tracing` (plain or JSON lines)
//! - Typed lifecycle events
//! - Begin/complete observation scopes
//! - Validation counters
//!
//! # Principles
//!
//! 1. Observability is read-only
//! 2. No side effects on validation results
//! 3. Logging failures never abort a run

mod events;
mod metrics;
mod scope;

pub use events::Event;
pub use metrics::{MetricsSnapshot, ValidationMetrics};
pub use scope::ObservationScope;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Installs the global subscriber.
///
/// `RUST_LOG` takes precedence over `level` when set. Returns false when a
/// subscriber was already installed, which is harmless.
pub fn init_logging(level: &str, json: bool) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
            .is_ok()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_twice_is_harmless() {
        init_logging("debug", false);
        assert!(!init_logging("info", true));
    }
}
