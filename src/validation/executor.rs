//! Bounded validation executor
//!
//! At most `max_concurrent` validations run at once, each on a blocking
//! worker of the tokio runtime. A submission either starts at once or is
//! rejected: there is no queue. Running validations are tracked by project
//! key so they can be cancelled.
//!
//! Job lifecycle on the worker:
//! 1. `on_started`
//! 2. the validation executes
//! 3. the job is sealed: from here on `cancel` returns false
//! 4. exactly one of `on_completion`, `on_cancelled`, `on_failure`
//! 5. the tracking entry is removed, then the worker permit is released

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::runtime::Handle;
use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::observability::{Event, MetricsSnapshot, ValidationMetrics};

use super::errors::{ExecutorError, ValidationFailure};
use super::listener::ValidationListener;
use super::validation::{Validation, ValidationOutcome};

#[derive(Debug)]
struct JobHandle {
    run_id: Uuid,
    token: CancellationToken,
    /// Set once the outcome is decided
    sealed: bool,
}

type JobMap = Arc<Mutex<HashMap<String, JobHandle>>>;

fn lock(jobs: &Mutex<HashMap<String, JobHandle>>) -> MutexGuard<'_, HashMap<String, JobHandle>> {
    jobs.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Removes the tracking entry before the permit is released
struct JobGuard {
    jobs: JobMap,
    project_key: String,
    run_id: Uuid,
    _permit: OwnedSemaphorePermit,
}

impl Drop for JobGuard {
    fn drop(&mut self) {
        let mut jobs = lock(&self.jobs);
        if jobs.get(&self.project_key).map(|h| h.run_id) == Some(self.run_id) {
            jobs.remove(&self.project_key);
        }
    }
}

/// How a job ended
enum Verdict {
    Completed(ValidationOutcome),
    Cancelled,
    Failed(ValidationFailure),
}

/// Runs validations on a fixed number of workers
#[derive(Debug)]
pub struct ValidationExecutor {
    max_concurrent: usize,
    permits: Arc<Semaphore>,
    jobs: JobMap,
    metrics: Arc<ValidationMetrics>,
    runtime: Handle,
}

impl ValidationExecutor {
    /// Creates an executor on the current tokio runtime
    pub fn new(max_concurrent: usize) -> Result<Self, ExecutorError> {
        let runtime = Handle::try_current().map_err(|_| ExecutorError::NoRuntime)?;
        Ok(Self::with_handle(max_concurrent, runtime))
    }

    /// Creates an executor spawning onto `runtime`. A zero limit is raised to 1.
    pub fn with_handle(max_concurrent: usize, runtime: Handle) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            max_concurrent,
            permits: Arc::new(Semaphore::new(max_concurrent)),
            jobs: Arc::new(Mutex::new(HashMap::new())),
            metrics: Arc::new(ValidationMetrics::new()),
            runtime,
        }
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Starts `validation` on a free worker, or rejects it
    pub fn execute(
        &self,
        mut validation: Validation,
        listener: Arc<dyn ValidationListener>,
    ) -> Result<JoinHandle<()>, ExecutorError> {
        let project_key = validation.id().to_string();
        let run_id = validation.run_id();

        let permit = match Arc::clone(&self.permits).try_acquire_owned() {
            Ok(permit) => permit,
            Err(TryAcquireError::Closed) => return Err(ExecutorError::ShutDown),
            Err(TryAcquireError::NoPermits) => {
                self.metrics.increment_rejected();
                warn!(
                    event = Event::ValidationRejected.as_str(),
                    project = %project_key,
                    limit = self.max_concurrent,
                    "no free worker"
                );
                return Err(ExecutorError::Rejected {
                    limit: self.max_concurrent,
                });
            }
        };

        let token = CancellationToken::new();
        let active = {
            let mut jobs = lock(&self.jobs);
            if jobs.contains_key(&project_key) {
                return Err(ExecutorError::AlreadyRunning(project_key));
            }
            jobs.insert(
                project_key.clone(),
                JobHandle {
                    run_id,
                    token: token.clone(),
                    sealed: false,
                },
            );
            jobs.len()
        };

        self.metrics.increment_submitted();
        info!(
            event = Event::ValidationSubmitted.as_str(),
            project = %project_key,
            run_id = %run_id,
            active,
            limit = self.max_concurrent,
            "Executing job(s)"
        );

        let guard = JobGuard {
            jobs: Arc::clone(&self.jobs),
            project_key: project_key.clone(),
            run_id,
            _permit: permit,
        };
        let jobs = Arc::clone(&self.jobs);
        let metrics = Arc::clone(&self.metrics);

        Ok(self.runtime.spawn_blocking(move || {
            let _guard = guard;

            notify(&project_key, "on_started", || listener.on_started(&project_key));
            info!(event = Event::ValidationStarted.as_str(), project = %project_key, run_id = %run_id);

            let result = panic::catch_unwind(AssertUnwindSafe(|| validation.execute(&token)))
                .unwrap_or_else(|payload| Err(ValidationFailure::Panicked(panic_message(payload))));

            let cancelled = seal(&jobs, &project_key, run_id);
            let verdict = match result {
                _ if cancelled => Verdict::Cancelled,
                Err(ValidationFailure::Cancelled) => Verdict::Cancelled,
                Ok(outcome) => Verdict::Completed(outcome),
                Err(failure) => Verdict::Failed(failure),
            };

            match verdict {
                Verdict::Completed(outcome) => {
                    metrics.increment_completed();
                    metrics.add_rows_scanned(outcome.rows_scanned);
                    metrics.add_errors_reported(outcome.error_count());
                    info!(
                        event = Event::ValidationCompleted.as_str(),
                        project = %project_key,
                        run_id = %run_id,
                        valid = outcome.is_valid(),
                        errors = outcome.error_count(),
                        rows = outcome.rows_scanned,
                    );
                    notify(&project_key, "on_completion", || listener.on_completion(outcome));
                }
                Verdict::Cancelled => {
                    metrics.increment_cancelled();
                    info!(event = Event::ValidationCancelled.as_str(), project = %project_key, run_id = %run_id);
                    notify(&project_key, "on_cancelled", || listener.on_cancelled(&project_key));
                }
                Verdict::Failed(failure) => {
                    metrics.increment_failed();
                    error!(
                        event = Event::ValidationFailed.as_str(),
                        project = %project_key,
                        run_id = %run_id,
                        error = %failure,
                    );
                    notify(&project_key, "on_failure", || listener.on_failure(&project_key, &failure));
                }
            }
        }))
    }

    /// Requests cooperative cancellation of a running validation.
    ///
    /// Returns false for unknown or already finished validations.
    pub fn cancel(&self, project_key: &str) -> bool {
        let jobs = lock(&self.jobs);
        match jobs.get(project_key) {
            Some(handle) if !handle.sealed => {
                handle.token.cancel();
                info!(project = %project_key, run_id = %handle.run_id, "cancellation requested");
                true
            }
            _ => false,
        }
    }

    /// Validations currently tracked
    pub fn active_count(&self) -> usize {
        lock(&self.jobs).len()
    }

    pub fn is_running(&self, project_key: &str) -> bool {
        lock(&self.jobs).contains_key(project_key)
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Refuses new work and interrupts every running validation
    pub fn shutdown(&self) {
        self.permits.close();
        let jobs = lock(&self.jobs);
        for handle in jobs.values() {
            handle.token.cancel();
        }
        info!(event = Event::ExecutorShutdown.as_str(), interrupted = jobs.len());
    }

    pub fn is_shut_down(&self) -> bool {
        self.permits.is_closed()
    }
}

/// Marks the job finished and reports whether it was cancelled
fn seal(jobs: &Mutex<HashMap<String, JobHandle>>, project_key: &str, run_id: Uuid) -> bool {
    let mut jobs = lock(jobs);
    match jobs.get_mut(project_key) {
        Some(handle) if handle.run_id == run_id => {
            handle.sealed = true;
            handle.token.is_cancelled()
        }
        _ => false,
    }
}

/// Runs a listener callback, containing its panics
fn notify(project_key: &str, callback: &'static str, f: impl FnOnce()) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(f)) {
        error!(
            project = %project_key,
            callback,
            panic = %panic_message(payload),
            "listener panicked"
        );
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::testing::{blocking_validation, Gate, RecordingListener};
    use std::time::Duration;

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_rejects_when_full() {
        let executor = ValidationExecutor::new(1).unwrap();
        let gate = Gate::new();
        let listener = Arc::new(RecordingListener::default());

        let first = executor
            .execute(blocking_validation("PROJ-A", &gate), listener.clone())
            .unwrap();
        let err = executor
            .execute(blocking_validation("PROJ-B", &gate), listener.clone())
            .unwrap_err();
        assert_eq!(err, ExecutorError::Rejected { limit: 1 });

        gate.open();
        first.await.unwrap();
        assert_eq!(executor.active_count(), 0);
        assert_eq!(listener.events(), vec!["started:PROJ-A", "completed:PROJ-A"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_cancel_running_job() {
        let executor = ValidationExecutor::new(1).unwrap();
        let gate = Gate::new();
        let listener = Arc::new(RecordingListener::default());

        let job = executor
            .execute(blocking_validation("PROJ-A", &gate), listener.clone())
            .unwrap();
        gate.wait_entered(Duration::from_secs(5));

        assert!(executor.cancel("PROJ-A"));
        gate.open();
        job.await.unwrap();

        assert_eq!(listener.events(), vec!["started:PROJ-A", "cancelled:PROJ-A"]);
        assert!(!executor.cancel("PROJ-A"));
        assert!(!executor.cancel("PROJ-UNKNOWN"));
        assert_eq!(executor.metrics().cancelled, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_shutdown_refuses_new_work() {
        let executor = ValidationExecutor::new(2).unwrap();
        executor.shutdown();
        let gate = Gate::new();
        let err = executor
            .execute(blocking_validation("PROJ-A", &gate), Arc::new(crate::validation::NoopListener))
            .unwrap_err();
        assert_eq!(err, ExecutorError::ShutDown);
        assert!(executor.is_shut_down());
    }

    #[test]
    fn test_new_without_runtime() {
        assert_eq!(ValidationExecutor::new(1).unwrap_err(), ExecutorError::NoRuntime);
    }
}
