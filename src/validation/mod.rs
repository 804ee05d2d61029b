//! Validation orchestration and execution
//!
//! - `ValidationContext`: per-project plan, store handle and report
//! - `Validator`: one stage; the default stages are the structural first
//!   pass, the row-based primary pass and the relational pass
//! - `Validation`: runs the stages in order, skipping the rest once the
//!   report holds an error
//! - `ValidationExecutor`: bounded, queue-less, cancellable execution of
//!   validations across projects

mod context;
mod errors;
mod executor;
mod first_pass;
mod listener;
mod primary;
mod relational;
#[allow(clippy::module_inception)]
mod validation;
mod validator;

pub use context::ValidationContext;
pub use errors::{ExecutorError, ValidationFailure};
pub use executor::ValidationExecutor;
pub use first_pass::FirstPassValidator;
pub use listener::{NoopListener, ValidationListener};
pub use primary::PrimaryValidator;
pub use relational::RelationalValidator;
pub use validation::{Validation, ValidationOutcome, ValidationState};
pub use validator::{default_validators, Validator};

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::{Arc, Condvar, Mutex};
    use std::time::Duration;

    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::dictionary::{ActiveDictionary, CodeLists, Dictionary, Field, FileSchema};
    use crate::planner::DataTypeSelection;
    use crate::store::MemoryFileStore;

    #[derive(Default)]
    struct GateState {
        open: bool,
        entered: bool,
    }

    /// Holds validators until opened
    #[derive(Clone, Default)]
    pub struct Gate(Arc<(Mutex<GateState>, Condvar)>);

    impl Gate {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn open(&self) {
            let (state, signal) = &*self.0;
            state.lock().unwrap().open = true;
            signal.notify_all();
        }

        fn pass(&self) {
            let (state, signal) = &*self.0;
            let mut guard = state.lock().unwrap();
            guard.entered = true;
            signal.notify_all();
            while !guard.open {
                guard = signal.wait(guard).unwrap();
            }
        }

        pub fn wait_entered(&self, timeout: Duration) {
            let (state, signal) = &*self.0;
            let guard = state.lock().unwrap();
            let _ = signal.wait_timeout_while(guard, timeout, |s| !s.entered).unwrap();
        }
    }

    struct GateValidator(Gate);

    impl Validator for GateValidator {
        fn name(&self) -> &'static str {
            "gate"
        }

        fn validate(&self, _: &mut ValidationContext, _: &CancellationToken) -> Result<(), ValidationFailure> {
            self.0.pass();
            Ok(())
        }
    }

    /// A validation whose only validator waits on `gate`
    pub fn blocking_validation(project_key: &str, gate: &Gate) -> Validation {
        let dictionary = Dictionary::new("1.0")
            .with_file(FileSchema::new("donor", r"^donor\.txt$").with_field(Field::text("donor_id")));
        let active = ActiveDictionary::new(dictionary, CodeLists::new()).unwrap();
        let store = MemoryFileStore::new().with_file("donor.txt", "donor_id\nD1\n");
        let context =
            ValidationContext::new(project_key, &active, &DataTypeSelection::All, Arc::new(store)).unwrap();
        Validation::with_validators(context, vec![Box::new(GateValidator(gate.clone()))])
    }

    /// Records callbacks as `<kind>:<project>`
    #[derive(Default)]
    pub struct RecordingListener(Mutex<Vec<String>>);

    impl RecordingListener {
        pub fn events(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }
    }

    impl ValidationListener for RecordingListener {
        fn on_started(&self, project_key: &str) {
            self.0.lock().unwrap().push(format!("started:{}", project_key));
        }

        fn on_completion(&self, outcome: ValidationOutcome) {
            self.0.lock().unwrap().push(format!("completed:{}", outcome.project_key));
        }

        fn on_cancelled(&self, project_key: &str) {
            self.0.lock().unwrap().push(format!("cancelled:{}", project_key));
        }

        fn on_failure(&self, project_key: &str, _: &ValidationFailure) {
            self.0.lock().unwrap().push(format!("failed:{}", project_key));
        }
    }
}
