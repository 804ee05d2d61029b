//! Report accumulation
//!
//! `ReportContext` is the sink validators write into. `SubmissionReport` is
//! the in-memory implementation: errors grouped per file, capped per file,
//! plus summaries and the line numbers of invalid rows.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::error::{ErrorType, ValidationError};
use super::summary::FieldSummary;

/// Default cap on stored errors per file
pub const DEFAULT_MAX_ERRORS_PER_FILE: usize = 10_000;

/// Sink for errors and summaries produced during a validation
pub trait ReportContext: Send {
    /// Records an error
    fn report_error(&mut self, error: ValidationError);

    /// Records the summary of a field
    fn report_summary(&mut self, file_name: &str, summary: FieldSummary);

    /// Whether any error was recorded, including dropped ones
    fn has_errors(&self) -> bool;

    /// Total number of errors recorded, including dropped ones
    fn error_count(&self) -> u64;

    /// Errors recorded for one file, including dropped ones
    fn file_error_count(&self, file_name: &str) -> u64;

    /// Writes the line numbers of every row that carried an error to `path`,
    /// one `<file>\t<line>` pair per line, in file then line order.
    fn report_line_numbers(&self, path: &Path) -> io::Result<()>;
}

/// Everything reported about one file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileReport {
    pub errors: Vec<ValidationError>,
    /// Errors not stored because of the per-file cap
    pub truncated: u64,
    pub summaries: Vec<FieldSummary>,
    #[serde(skip)]
    invalid_lines: BTreeSet<u64>,
}

impl FileReport {
    /// Total errors seen, stored or not
    pub fn error_count(&self) -> u64 {
        self.errors.len() as u64 + self.truncated
    }

    pub fn is_valid(&self) -> bool {
        self.error_count() == 0
    }

    pub fn invalid_lines(&self) -> impl Iterator<Item = u64> + '_ {
        self.invalid_lines.iter().copied()
    }
}

/// In-memory report for one validation
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionReport {
    files: BTreeMap<String, FileReport>,
    max_errors_per_file: usize,
}

impl Default for SubmissionReport {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ERRORS_PER_FILE)
    }
}

impl SubmissionReport {
    pub fn new(max_errors_per_file: usize) -> Self {
        Self {
            files: BTreeMap::new(),
            max_errors_per_file,
        }
    }

    pub fn max_errors_per_file(&self) -> usize {
        self.max_errors_per_file
    }

    pub fn file(&self, file_name: &str) -> Option<&FileReport> {
        self.files.get(file_name)
    }

    /// Files with anything reported, in name order
    pub fn files(&self) -> impl Iterator<Item = (&str, &FileReport)> {
        self.files.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Every stored error, files in name order, errors in report order
    pub fn errors(&self) -> impl Iterator<Item = &ValidationError> {
        self.files.values().flat_map(|f| f.errors.iter())
    }

    /// Stored errors of one type
    pub fn errors_of(&self, error_type: ErrorType) -> Vec<&ValidationError> {
        self.errors().filter(|e| e.error_type == error_type).collect()
    }

    /// One page of a file's stored errors. Pages are 0-based.
    pub fn error_page(&self, file_name: &str, page: usize, page_size: usize) -> &[ValidationError] {
        let errors = match self.files.get(file_name) {
            Some(file) => file.errors.as_slice(),
            None => return &[],
        };
        if page >= ceil_div(errors.len(), page_size) {
            return &[];
        }
        let start = page * page_size;
        let end = (start + page_size).min(errors.len());
        &errors[start..end]
    }

    /// Number of pages needed for a file's stored errors
    pub fn page_count(&self, file_name: &str, page_size: usize) -> usize {
        self.files
            .get(file_name)
            .map(|f| ceil_div(f.errors.len(), page_size))
            .unwrap_or(0)
    }

    /// Writes `<dir>/<file>.errors.json` for each file with errors, one JSON
    /// object per line. Returns the paths written.
    pub fn write_json_lines(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        fs::create_dir_all(dir)?;
        let mut written = Vec::new();

        for (file_name, report) in &self.files {
            if report.errors.is_empty() {
                continue;
            }
            let path = dir.join(format!("{}.errors.json", file_name));
            let mut writer = BufWriter::new(File::create(&path)?);
            for error in &report.errors {
                serde_json::to_writer(&mut writer, error)?;
                writer.write_all(b"\n")?;
            }
            writer.flush()?;
            written.push(path);
        }

        Ok(written)
    }

    /// Writes `<dir>/<file>.summary.json` for each file with summaries
    pub fn write_summaries(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        fs::create_dir_all(dir)?;
        let mut written = Vec::new();

        for (file_name, report) in &self.files {
            if report.summaries.is_empty() {
                continue;
            }
            let path = dir.join(format!("{}.summary.json", file_name));
            let writer = BufWriter::new(File::create(&path)?);
            serde_json::to_writer_pretty(writer, &report.summaries)?;
            written.push(path);
        }

        Ok(written)
    }
}

impl ReportContext for SubmissionReport {
    fn report_error(&mut self, error: ValidationError) {
        let file = self.files.entry(error.file_name.clone()).or_default();
        if let Some(line) = error.line_number {
            file.invalid_lines.insert(line);
        }
        if file.errors.len() < self.max_errors_per_file {
            file.errors.push(error);
        } else {
            file.truncated += 1;
        }
    }

    fn report_summary(&mut self, file_name: &str, summary: FieldSummary) {
        self.files
            .entry(file_name.to_string())
            .or_default()
            .summaries
            .push(summary);
    }

    fn has_errors(&self) -> bool {
        self.files.values().any(|f| !f.is_valid())
    }

    fn error_count(&self) -> u64 {
        self.files.values().map(FileReport::error_count).sum()
    }

    fn file_error_count(&self, file_name: &str) -> u64 {
        self.files.get(file_name).map(FileReport::error_count).unwrap_or(0)
    }

    fn report_line_numbers(&self, path: &Path) -> io::Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        for (file_name, report) in &self.files {
            for line in report.invalid_lines() {
                writeln!(writer, "{}\t{}", file_name, line)?;
            }
        }
        writer.flush()
    }
}

/// Floor division, 0 when the divisor is 0
pub fn floor_div(dividend: usize, divisor: usize) -> usize {
    if divisor == 0 {
        0
    } else {
        dividend / divisor
    }
}

/// Ceiling division, 0 when the divisor is 0
pub fn ceil_div(dividend: usize, divisor: usize) -> usize {
    if divisor == 0 {
        0
    } else {
        dividend / divisor + usize::from(dividend % divisor != 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn error(file: &str, line: u64) -> ValidationError {
        ValidationError::new(file, ErrorType::CodelistError)
            .with_field("sex")
            .at_line(line)
            .with_value("3")
    }

    #[test]
    fn test_errors_grouped_by_file() {
        let mut report = SubmissionReport::default();
        report.report_error(error("specimen.txt", 2));
        report.report_error(error("donor.txt", 4));
        report.report_error(error("donor.txt", 3));

        assert!(report.has_errors());
        assert_eq!(report.error_count(), 3);
        let files: Vec<_> = report.errors().map(|e| e.file_name.as_str()).collect();
        assert_eq!(files, vec!["donor.txt", "donor.txt", "specimen.txt"]);
        let lines: Vec<_> = report.file("donor.txt").unwrap().invalid_lines().collect();
        assert_eq!(lines, vec![3, 4]);
    }

    #[test]
    fn test_cap_counts_dropped_errors() {
        let mut report = SubmissionReport::new(2);
        for line in 2..7 {
            report.report_error(error("donor.txt", line));
        }
        let file = report.file("donor.txt").unwrap();
        assert_eq!(file.errors.len(), 2);
        assert_eq!(file.truncated, 3);
        assert_eq!(report.file_error_count("donor.txt"), 5);
    }

    #[test]
    fn test_division_helpers() {
        assert_eq!(floor_div(7, 2), 3);
        assert_eq!(ceil_div(7, 2), 4);
        assert_eq!(ceil_div(6, 2), 3);
        assert_eq!(floor_div(7, 0), 0);
        assert_eq!(ceil_div(7, 0), 0);
        assert_eq!(ceil_div(0, 5), 0);
    }

    #[test]
    fn test_error_pages() {
        let mut report = SubmissionReport::default();
        for line in 2..7 {
            report.report_error(error("donor.txt", line));
        }
        assert_eq!(report.page_count("donor.txt", 2), 3);
        assert_eq!(report.error_page("donor.txt", 2, 2).len(), 1);
        assert!(report.error_page("donor.txt", 3, 2).is_empty());
        assert!(report.error_page("donor.txt", 0, 0).is_empty());
        assert!(report.error_page("missing.txt", 0, 2).is_empty());
    }

    #[test]
    fn test_write_outputs() {
        let dir = tempdir().unwrap();
        let mut report = SubmissionReport::default();
        report.report_error(error("donor.txt", 2));
        report.report_error(error("donor.txt", 5));

        let written = report.write_json_lines(dir.path()).unwrap();
        assert_eq!(written.len(), 1);
        let content = fs::read_to_string(&written[0]).unwrap();
        assert_eq!(content.lines().count(), 2);
        let first: ValidationError = serde_json::from_str(content.lines().next().unwrap()).unwrap();
        assert_eq!(first.line_number, Some(2));

        let lines_path = dir.path().join("lines.tsv");
        report.report_line_numbers(&lines_path).unwrap();
        assert_eq!(fs::read_to_string(lines_path).unwrap(), "donor.txt\t2\ndonor.txt\t5\n");
    }
}
