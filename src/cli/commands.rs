//! CLI command implementations
//!
//! `validate` pushes one validation per project through the executor. A
//! rejected submission waits for the next finished validation and is then
//! retried, so at most `max_concurrent_validations` run at any time.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::runtime::{Builder, Handle};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::dictionary::{ActiveDictionary, DictionaryLoader};
use crate::observability::{init_logging, Event};
use crate::planner::{ExplainPlan, Planner};
use crate::report::ReportContext;
use crate::store::{LocalFileStore, SubmissionFileStore};
use crate::validation::{
    ExecutorError, Validation, ValidationContext, ValidationExecutor, ValidationFailure, ValidationListener,
    ValidationOutcome,
};

use super::args::Command;
use super::config::Config;
use super::errors::{CliError, CliResult};

/// Dispatch a parsed command
pub fn run_command(command: Command) -> CliResult<()> {
    match command {
        Command::Validate { config, projects } => validate(&config, &projects),
        Command::Plan { config, project } => plan(&config, &project),
        Command::CheckDictionary { config } => check_dictionary(&config),
    }
}

fn load(config_path: &Path) -> CliResult<(Config, ActiveDictionary)> {
    let config = Config::load(config_path)?;
    init_logging(&config.log_level, config.log_json);
    let active = DictionaryLoader::load(&config.dictionary_path, &config.codelists_path)?;
    Ok((config, active))
}

/// Validate every project and write its reports
pub fn validate(config_path: &Path, projects: &[String]) -> CliResult<()> {
    let (config, active) = load(config_path)?;
    let runtime = Builder::new_multi_thread().enable_all().build()?;

    let summaries = run_validations(&config, &active, projects, runtime.handle())?;
    for summary in &summaries {
        println!("{}", summary);
    }

    let invalid = summaries.iter().filter(|s| !s.status.is_valid()).count();
    if invalid > 0 {
        return Err(CliError::submission_invalid(invalid, summaries.len()));
    }
    Ok(())
}

/// Print the plan of one project as JSON
pub fn plan(config_path: &Path, project_key: &str) -> CliResult<()> {
    let (config, active) = load(config_path)?;
    let store = LocalFileStore::new(config.project_dir(project_key));
    let files = store.file_names().map_err(ValidationFailure::from)?;

    match Planner::new(&active.dictionary, &active.codelists).plan(project_key, &config.selection(), &files) {
        Ok(plan) => {
            println!("{}", ExplainPlan::from_plan(&plan).to_json()?);
            Ok(())
        }
        Err(err) => {
            println!("{}", ExplainPlan::from_error(&err).to_json()?);
            Err(err.into())
        }
    }
}

/// Load the dictionary and code lists and report what was found
pub fn check_dictionary(config_path: &Path) -> CliResult<()> {
    let (_, active) = load(config_path)?;
    println!(
        "dictionary {} OK: {} file schema(s), {} code list(s)",
        active.dictionary.version,
        active.dictionary.files.len(),
        active.codelists.len()
    );
    Ok(())
}

/// Final status of one project
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectStatus {
    Valid,
    Invalid { errors: u64, files: usize },
    Cancelled,
    Failed(String),
}

impl ProjectStatus {
    pub fn is_valid(&self) -> bool {
        matches!(self, ProjectStatus::Valid)
    }
}

#[derive(Debug, Clone)]
pub struct ProjectSummary {
    pub project_key: String,
    pub status: ProjectStatus,
    pub rows_scanned: u64,
    pub report_dir: Option<PathBuf>,
}

impl fmt::Display for ProjectSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<24} ", self.project_key)?;
        match &self.status {
            ProjectStatus::Valid => write!(f, "VALID ({} rows)", self.rows_scanned),
            ProjectStatus::Invalid { errors, files } => {
                write!(f, "INVALID ({} error(s) in {} file(s))", errors, files)
            }
            ProjectStatus::Cancelled => write!(f, "CANCELLED"),
            ProjectStatus::Failed(reason) => write!(f, "FAILED: {}", reason),
        }
    }
}

enum JobMessage {
    Completed(ValidationOutcome),
    Cancelled(String),
    Failed(String, String),
}

impl JobMessage {
    fn project_key(&self) -> &str {
        match self {
            JobMessage::Completed(outcome) => &outcome.project_key,
            JobMessage::Cancelled(key) | JobMessage::Failed(key, _) => key,
        }
    }
}

/// Forwards terminal callbacks to the submitting thread
struct ChannelListener(UnboundedSender<JobMessage>);

impl ChannelListener {
    fn send(&self, message: JobMessage) {
        let _ = self.0.send(message);
    }
}

impl ValidationListener for ChannelListener {
    fn on_completion(&self, outcome: ValidationOutcome) {
        self.send(JobMessage::Completed(outcome));
    }

    fn on_cancelled(&self, project_key: &str) {
        self.send(JobMessage::Cancelled(project_key.to_string()));
    }

    fn on_failure(&self, project_key: &str, failure: &ValidationFailure) {
        self.send(JobMessage::Failed(project_key.to_string(), failure.to_string()));
    }
}

fn build_validation(
    config: &Config,
    active: &ActiveDictionary,
    project_key: &str,
) -> Result<Validation, ValidationFailure> {
    let store = Arc::new(LocalFileStore::new(config.project_dir(project_key)));
    let context = ValidationContext::new(project_key, active, &config.selection(), store)?
        .with_conventions(config.conventions())
        .with_max_errors_per_file(config.max_errors_per_file);
    Ok(Validation::new(context))
}

/// Runs one validation per distinct project on `runtime`, in argument order
pub fn run_validations(
    config: &Config,
    active: &ActiveDictionary,
    projects: &[String],
    runtime: &Handle,
) -> CliResult<Vec<ProjectSummary>> {
    let executor = ValidationExecutor::with_handle(config.max_concurrent_validations, runtime.clone());
    let (tx, mut rx) = mpsc::unbounded_channel();
    let listener: Arc<dyn ValidationListener> = Arc::new(ChannelListener(tx));

    let mut running: HashMap<String, JoinHandle<()>> = HashMap::new();
    let mut summaries = Vec::new();
    let mut seen = HashSet::new();

    for project_key in projects {
        if !seen.insert(project_key.as_str()) {
            continue;
        }
        loop {
            let validation = match build_validation(config, active, project_key) {
                Ok(validation) => validation,
                Err(failure) => {
                    warn!(project = %project_key, error = %failure, "validation not started");
                    summaries.push(ProjectSummary {
                        project_key: project_key.clone(),
                        status: ProjectStatus::Failed(failure.to_string()),
                        rows_scanned: 0,
                        report_dir: None,
                    });
                    break;
                }
            };

            match executor.execute(validation, Arc::clone(&listener)) {
                Ok(job) => {
                    running.insert(project_key.clone(), job);
                    break;
                }
                Err(ExecutorError::Rejected { .. }) => {
                    summaries.push(next_finished(config, &mut rx, &mut running, runtime)?);
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    while !running.is_empty() {
        summaries.push(next_finished(config, &mut rx, &mut running, runtime)?);
    }
    executor.shutdown();

    let metrics = executor.metrics();
    info!(
        submitted = metrics.submitted,
        rejected = metrics.rejected,
        completed = metrics.completed,
        failed = metrics.failed,
        rows = metrics.rows_scanned,
        "all validations finished"
    );
    Ok(summaries)
}

/// Waits for one validation to finish and its worker to be released
fn next_finished(
    config: &Config,
    rx: &mut UnboundedReceiver<JobMessage>,
    running: &mut HashMap<String, JoinHandle<()>>,
    runtime: &Handle,
) -> CliResult<ProjectSummary> {
    let message = rx
        .blocking_recv()
        .ok_or_else(|| CliError::io_error("validation listener disconnected"))?;

    if let Some(job) = running.remove(message.project_key()) {
        runtime
            .block_on(job)
            .map_err(|e| CliError::io_error(format!("validation worker failed: {}", e)))?;
    }

    match message {
        JobMessage::Completed(outcome) => {
            let report_dir = write_reports(config, &outcome)?;
            let status = if outcome.is_valid() {
                ProjectStatus::Valid
            } else {
                ProjectStatus::Invalid {
                    errors: outcome.error_count(),
                    files: outcome.report.files().filter(|(_, f)| !f.is_valid()).count(),
                }
            };
            Ok(ProjectSummary {
                project_key: outcome.project_key,
                status,
                rows_scanned: outcome.rows_scanned,
                report_dir: Some(report_dir),
            })
        }
        JobMessage::Cancelled(project_key) => Ok(ProjectSummary {
            project_key,
            status: ProjectStatus::Cancelled,
            rows_scanned: 0,
            report_dir: None,
        }),
        JobMessage::Failed(project_key, reason) => Ok(ProjectSummary {
            project_key,
            status: ProjectStatus::Failed(reason),
            rows_scanned: 0,
            report_dir: None,
        }),
    }
}

/// Writes `<output_dir>/<project>/`: error lines, summaries, the outcome and
/// optionally the invalid line numbers
fn write_reports(config: &Config, outcome: &ValidationOutcome) -> CliResult<PathBuf> {
    let dir = config.report_dir(&outcome.project_key);
    fs::create_dir_all(&dir)?;

    let mut written = outcome.report.write_json_lines(&dir)?;
    written.extend(outcome.report.write_summaries(&dir)?);

    let outcome_path = dir.join("outcome.json");
    fs::write(&outcome_path, serde_json::to_string_pretty(outcome)?)?;
    written.push(outcome_path);

    if config.report_line_numbers {
        let path = dir.join("invalid_lines.txt");
        outcome.report.report_line_numbers(&path)?;
        written.push(path);
    }

    info!(
        event = Event::ReportWritten.as_str(),
        project = %outcome.project_key,
        dir = %dir.display(),
        files = written.len(),
    );
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::{CodeList, CodeLists, Dictionary, Field, FileSchema, Restriction};
    use tempfile::TempDir;

    fn active() -> ActiveDictionary {
        let dictionary = Dictionary::new("1.0").with_file(
            FileSchema::new("donor", r"^donor\.txt$")
                .with_field(Field::text("donor_id").with_restriction(Restriction::required()))
                .with_field(Field::text("donor_sex").with_restriction(Restriction::codelist("sex")))
                .with_unique_key(["donor_id"]),
        );
        let mut codelists = CodeLists::new();
        codelists
            .register(CodeList::new("sex").with_term("1", "male").with_term("2", "female"))
            .unwrap();
        ActiveDictionary::new(dictionary, codelists).unwrap()
    }

    fn setup(projects: &[(&str, &str)], max_concurrent: usize, line_numbers: bool) -> (TempDir, Config) {
        let root = TempDir::new().unwrap();
        for (project, donor) in projects {
            let dir = root.path().join("submissions").join(project);
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join("donor.txt"), donor).unwrap();
        }
        let config = Config::from_json(
            &serde_json::json!({
                "dictionary_path": "unused.json",
                "codelists_path": "unused.json",
                "submission_dir": root.path().join("submissions"),
                "output_dir": root.path().join("out"),
                "max_concurrent_validations": max_concurrent,
                "report_line_numbers": line_numbers,
            })
            .to_string(),
        )
        .unwrap();
        (root, config)
    }

    #[test]
    fn test_validations_beyond_limit_are_retried() {
        let (_root, config) = setup(
            &[
                ("PROJ-A", "donor_id\tdonor_sex\nD1\tmale\n"),
                ("PROJ-B", "donor_id\tdonor_sex\nD1\tmale\nD1\tX\n"),
                ("PROJ-C", "donor_id\tdonor_sex\nD9\t2\n"),
            ],
            1,
            true,
        );
        let runtime = Builder::new_multi_thread().worker_threads(2).enable_all().build().unwrap();
        let projects: Vec<String> = ["PROJ-A", "PROJ-B", "PROJ-C", "PROJ-A"].iter().map(|s| s.to_string()).collect();

        let mut summaries = run_validations(&config, &active(), &projects, runtime.handle()).unwrap();
        summaries.sort_by(|a, b| a.project_key.cmp(&b.project_key));

        let statuses: Vec<_> = summaries.iter().map(|s| (s.project_key.as_str(), s.status.clone())).collect();
        assert_eq!(
            statuses,
            vec![
                ("PROJ-A", ProjectStatus::Valid),
                ("PROJ-B", ProjectStatus::Invalid { errors: 3, files: 1 }),
                ("PROJ-C", ProjectStatus::Valid),
            ]
        );

        let report_dir = config.report_dir("PROJ-B");
        let errors = fs::read_to_string(report_dir.join("donor.txt.errors.json")).unwrap();
        assert_eq!(errors.lines().count(), 3);
        let lines = fs::read_to_string(report_dir.join("invalid_lines.txt")).unwrap();
        assert_eq!(lines, "donor.txt\t2\ndonor.txt\t3\n");
        assert!(config.report_dir("PROJ-A").join("outcome.json").exists());
    }

    #[test]
    fn test_missing_project_directory_fails_that_project_only() {
        let (_root, config) = setup(&[("PROJ-A", "donor_id\tdonor_sex\nD1\t1\n")], 2, false);
        let runtime = Builder::new_multi_thread().worker_threads(2).enable_all().build().unwrap();
        let projects = vec!["PROJ-A".to_string(), "PROJ-MISSING".to_string()];

        let summaries = run_validations(&config, &active(), &projects, runtime.handle()).unwrap();
        let missing = summaries.iter().find(|s| s.project_key == "PROJ-MISSING").unwrap();
        assert!(matches!(missing.status, ProjectStatus::Failed(_)));
        let ok = summaries.iter().find(|s| s.project_key == "PROJ-A").unwrap();
        assert_eq!(ok.status, ProjectStatus::Valid);
        // header and one data row, read by both the first pass and the primary pass
        assert_eq!(ok.rows_scanned, 4);
    }

    #[test]
    fn test_summary_display() {
        let summary = ProjectSummary {
            project_key: "PROJ-B".to_string(),
            status: ProjectStatus::Invalid { errors: 3, files: 1 },
            rows_scanned: 3,
            report_dir: None,
        };
        assert!(summary.to_string().ends_with("INVALID (3 error(s) in 1 file(s))"));
    }
}
