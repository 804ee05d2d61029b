//! File-level checkers
//!
//! Run in a fixed order before any row is read: codec, file name collision,
//! header, then the presence of related files. The first three are fail-fast.

use std::collections::BTreeSet;
use std::io::{BufRead, BufReader};

use serde_json::Value;

use crate::planner::{FileFlowPlanner, ReferenceKind};
use crate::report::{ErrorParameterKey, ErrorType, ValidationError};
use crate::store::{verify_stream, Compression, StreamIntegrity, SubmissionFileStore};

use super::chain::Checker;
use super::errors::{CheckError, CheckResult};

/// The file under check
#[derive(Clone, Copy)]
pub struct FileTarget<'a> {
    pub flow: &'a FileFlowPlanner,
    pub store: &'a dyn SubmissionFileStore,
}

impl FileTarget<'_> {
    pub fn file_name(&self) -> &str {
        self.flow.file_name()
    }
}

pub trait FileChecker: Checker {
    fn self_check(&mut self, target: &FileTarget<'_>) -> CheckResult<Vec<ValidationError>>;
}

/// Default file checkers in execution order
pub fn file_checkers() -> Vec<Box<dyn FileChecker>> {
    vec![
        Box::new(CompressionChecker),
        Box::new(FileCollisionChecker),
        Box::new(HeaderChecker),
        Box::new(ReferenceChecker),
    ]
}

/// Extension must match content, and the archive must decode as one stream
pub struct CompressionChecker;

impl Checker for CompressionChecker {
    fn name(&self) -> &'static str {
        "compression"
    }

    fn is_fail_fast(&self) -> bool {
        true
    }
}

impl FileChecker for CompressionChecker {
    fn self_check(&mut self, target: &FileTarget<'_>) -> CheckResult<Vec<ValidationError>> {
        let file_name = target.file_name();
        let expected = Compression::from_extension(file_name);
        let actual = target.store.detect_compression(file_name)?;

        if expected != actual {
            return Ok(vec![ValidationError::new(file_name, ErrorType::CompressionCodecError)
                .with_value(actual.as_str())
                .with_param(ErrorParameterKey::Expected, expected.as_str())
                .with_param(ErrorParameterKey::Value, actual.as_str())]);
        }

        match verify_stream(target.store.open_for_read(file_name)?, actual) {
            StreamIntegrity::Intact => Ok(Vec::new()),
            StreamIntegrity::Concatenated => Ok(vec![ValidationError::new(
                file_name,
                ErrorType::UnsupportedCompressedFile,
            )
            .with_value("concatenated archive")
            .with_param(ErrorParameterKey::Expected, actual.as_str())]),
            StreamIntegrity::Corrupt(e) => Ok(vec![ValidationError::new(
                file_name,
                ErrorType::UnsupportedCompressedFile,
            )
            .with_value(e.to_string())
            .with_param(ErrorParameterKey::Expected, actual.as_str())]),
        }
    }
}

/// At most one file may match a schema's pattern
pub struct FileCollisionChecker;

impl Checker for FileCollisionChecker {
    fn name(&self) -> &'static str {
        "file_collision"
    }

    fn is_fail_fast(&self) -> bool {
        true
    }
}

impl FileChecker for FileCollisionChecker {
    fn self_check(&mut self, target: &FileTarget<'_>) -> CheckResult<Vec<ValidationError>> {
        let flow = target.flow;
        if !flow.has_collision() {
            return Ok(Vec::new());
        }
        Ok(vec![ValidationError::new(flow.file_name(), ErrorType::TooManyFilesError)
            .with_value(flow.files.join(", "))
            .with_param(ErrorParameterKey::Schema, flow.schema_name.as_str())
            .with_param(ErrorParameterKey::Files, Value::from(flow.files.clone()))])
    }
}

/// First line must list the schema's fields, in order, once each
pub struct HeaderChecker;

impl HeaderChecker {
    fn read_header(target: &FileTarget<'_>) -> CheckResult<Option<Vec<String>>> {
        let file_name = target.file_name();
        let mut reader = BufReader::new(target.store.open_decompressed(file_name)?);
        let mut line = Vec::new();
        let read = reader
            .read_until(b'\n', &mut line)
            .map_err(|e| CheckError::io(file_name, e))?;
        if read == 0 {
            return Ok(None);
        }
        if line.last() == Some(&b'\n') {
            line.pop();
        }
        Ok(Some(
            String::from_utf8_lossy(&line)
                .split('\t')
                .map(str::to_string)
                .collect(),
        ))
    }
}

impl Checker for HeaderChecker {
    fn name(&self) -> &'static str {
        "header"
    }

    fn is_fail_fast(&self) -> bool {
        true
    }
}

impl FileChecker for HeaderChecker {
    fn self_check(&mut self, target: &FileTarget<'_>) -> CheckResult<Vec<ValidationError>> {
        let file_name = target.file_name();
        let expected = &target.flow.field_names;

        let Some(actual) = Self::read_header(target)? else {
            return Ok(vec![ValidationError::new(file_name, ErrorType::FileHeaderError)
                .with_param(ErrorParameterKey::Expected, Value::from(expected.clone()))
                .with_param(ErrorParameterKey::Value, Value::Array(Vec::new()))]);
        };

        let mut seen = BTreeSet::new();
        let duplicates: BTreeSet<&String> = actual.iter().filter(|c| !seen.insert(*c)).collect();
        if !duplicates.is_empty() {
            let duplicates: Vec<String> = duplicates.into_iter().cloned().collect();
            return Ok(vec![ValidationError::new(file_name, ErrorType::DuplicateHeaderError)
                .with_fields(duplicates.iter().cloned())
                .with_value(duplicates.join(", "))
                .with_param(ErrorParameterKey::Fields, Value::from(duplicates))]);
        }

        if &actual != expected {
            return Ok(vec![ValidationError::new(file_name, ErrorType::FileHeaderError)
                .with_value(actual.join("\t"))
                .with_param(ErrorParameterKey::Expected, Value::from(expected.clone()))
                .with_param(ErrorParameterKey::Value, Value::from(actual))]);
        }

        Ok(Vec::new())
    }
}

/// Files this one relates to, or that relate back to it, must be present
pub struct ReferenceChecker;

impl Checker for ReferenceChecker {
    fn name(&self) -> &'static str {
        "reference"
    }
}

impl FileChecker for ReferenceChecker {
    fn self_check(&mut self, target: &FileTarget<'_>) -> CheckResult<Vec<ValidationError>> {
        Ok(target
            .flow
            .missing_references
            .iter()
            .map(|reference| {
                let error_type = match reference.kind {
                    ReferenceKind::RelationTarget => ErrorType::RelationFileError,
                    ReferenceKind::ReverseRelation => ErrorType::ReverseRelationFileError,
                };
                ValidationError::new(target.file_name(), error_type)
                    .with_fields(reference.fields.iter().cloned())
                    .with_value(reference.schema.as_str())
                    .with_param(ErrorParameterKey::Schema, reference.schema.as_str())
            })
            .collect())
    }
}
