//! ObservationScope for automatic begin/complete logging
//!
//! - Logs `{name}_BEGIN` on creation
//! - Logs `{name}_COMPLETE` when completed
//! - Logs `{name}_CANCELLED` when cancelled
//! - Logs `{name}_INCOMPLETE` on drop without completion

use std::time::Instant;

use tracing::{error, info, warn};

/// A scope that logs begin and complete events around a unit of work
///
/// ```ignore
/// let scope = ObservationScope::with_fields("FILE_CHECK", vec![("file", "donor.txt".to_string())]);
/// // ... do work ...
/// scope.complete();
/// ```
pub struct ObservationScope {
    name: &'static str,
    fields: Vec<(&'static str, String)>,
    started: Instant,
    completed: bool,
}

impl ObservationScope {
    /// Create a new observation scope, logging `{name}_BEGIN` immediately
    pub fn new(name: &'static str) -> Self {
        Self::with_fields(name, Vec::new())
    }

    /// Create a scope carrying context fields on every line it logs
    pub fn with_fields(name: &'static str, fields: Vec<(&'static str, String)>) -> Self {
        info!(event = %format!("{}_BEGIN", name), fields = %render(&fields));
        Self {
            name,
            fields,
            started: Instant::now(),
            completed: false,
        }
    }

    /// Mark the scope as successfully completed
    pub fn complete(mut self) {
        self.completed = true;
        info!(
            event = %format!("{}_COMPLETE", self.name),
            fields = %render(&self.fields),
            elapsed_ms = self.elapsed_ms(),
        );
    }

    /// Mark the scope as failed with a reason
    pub fn fail(mut self, reason: &str) {
        self.completed = true;
        error!(
            event = %format!("{}_FAILED", self.name),
            fields = %render(&self.fields),
            elapsed_ms = self.elapsed_ms(),
            reason,
        );
    }

    /// Mark the scope as cancelled on request, which is not a failure
    pub fn cancel(mut self) {
        self.completed = true;
        info!(
            event = %format!("{}_CANCELLED", self.name),
            fields = %render(&self.fields),
            elapsed_ms = self.elapsed_ms(),
        );
    }

    /// Check if the scope has been completed
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Milliseconds since the scope began
    pub fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }
}

impl Drop for ObservationScope {
    fn drop(&mut self) {
        if !self.completed {
            warn!(
                event = %format!("{}_INCOMPLETE", self.name),
                fields = %render(&self.fields),
                reason = "scope dropped without completion",
            );
        }
    }
}

fn render(fields: &[(&'static str, String)]) -> String {
    fields
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_lifecycle() {
        let scope = ObservationScope::new("TEST");
        assert!(!scope.is_completed());
        scope.complete();
    }

    #[test]
    fn test_scope_fail() {
        let scope = ObservationScope::with_fields("TEST", vec![("file", "donor.txt".to_string())]);
        scope.fail("something went wrong");
    }

    #[test]
    fn test_scope_cancel() {
        let scope = ObservationScope::with_fields("TEST", vec![("project", "PROJ-A".to_string())]);
        scope.cancel();
    }

    #[test]
    fn test_scope_drop_without_complete() {
        let scope = ObservationScope::new("TEST");
        drop(scope);
    }

    #[test]
    fn test_render_fields() {
        let rendered = render(&[("a", "1".to_string()), ("b", "x".to_string())]);
        assert_eq!(rendered, "a=1 b=x");
    }
}
