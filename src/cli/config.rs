//! Configuration file
//!
//! A single JSON object. Paths are taken as given, relative paths resolve
//! against the working directory.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::observability::Event;
use crate::planner::DataTypeSelection;
use crate::report::DEFAULT_MAX_ERRORS_PER_FILE;
use crate::restriction::ValueConventions;

use super::errors::{CliError, CliResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Dictionary JSON file (required)
    pub dictionary_path: PathBuf,

    /// Code list JSON file (required)
    pub codelists_path: PathBuf,

    /// Directory holding one sub-directory per project (required)
    pub submission_dir: PathBuf,

    /// Where reports are written (default "./validation")
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Validations allowed to run at once (default 1)
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_validations: usize,

    /// File schemas to validate; all when absent
    #[serde(default)]
    pub data_types: Option<Vec<String>>,

    #[serde(default = "default_forbidden_values")]
    pub forbidden_values: Vec<String>,

    #[serde(default = "default_missing_codes")]
    pub missing_codes: Vec<String>,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_json: bool,

    /// Detailed errors kept per file, the rest are only counted
    #[serde(default = "default_max_errors_per_file")]
    pub max_errors_per_file: usize,

    /// Also write the invalid line numbers of every file
    #[serde(default)]
    pub report_line_numbers: bool,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./validation")
}
fn default_max_concurrent() -> usize {
    1
}
fn default_forbidden_values() -> Vec<String> {
    ValueConventions::default().forbidden_values
}
fn default_missing_codes() -> Vec<String> {
    ValueConventions::default().missing_codes
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_max_errors_per_file() -> usize {
    DEFAULT_MAX_ERRORS_PER_FILE
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;
        let config = Self::from_json(&content)?;

        info!(
            event = Event::ConfigLoaded.as_str(),
            path = %path.display(),
            max_concurrent = config.max_concurrent_validations,
        );
        Ok(config)
    }

    /// Parse and validate configuration JSON
    pub fn from_json(content: &str) -> CliResult<Self> {
        let config: Config = serde_json::from_str(content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> CliResult<()> {
        if self.max_concurrent_validations == 0 {
            return Err(CliError::config_error("max_concurrent_validations must be > 0"));
        }

        if self.max_errors_per_file == 0 {
            return Err(CliError::config_error("max_errors_per_file must be > 0"));
        }

        if let Some(data_types) = &self.data_types {
            if data_types.is_empty() {
                return Err(CliError::config_error(
                    "data_types must name at least one file schema when present",
                ));
            }
        }

        if let Some(code) = self.missing_codes.iter().find(|c| self.forbidden_values.contains(c)) {
            return Err(CliError::config_error(format!(
                "'{}' cannot be both a missing code and a forbidden value",
                code
            )));
        }

        Ok(())
    }

    pub fn selection(&self) -> DataTypeSelection {
        match &self.data_types {
            Some(names) => DataTypeSelection::only(names.iter().cloned()),
            None => DataTypeSelection::All,
        }
    }

    pub fn conventions(&self) -> ValueConventions {
        ValueConventions {
            missing_codes: self.missing_codes.clone(),
            forbidden_values: self.forbidden_values.clone(),
        }
    }

    /// Submission directory of one project
    pub fn project_dir(&self, project_key: &str) -> PathBuf {
        self.submission_dir.join(project_key)
    }

    /// Report directory of one project
    pub fn report_dir(&self, project_key: &str) -> PathBuf {
        self.output_dir.join(project_key)
    }
}
