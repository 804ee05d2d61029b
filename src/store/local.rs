//! # Local filesystem store

use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use super::errors::{StoreError, StoreResult};
use super::SubmissionFileStore;

/// Submission files in one flat directory
#[derive(Debug)]
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn full_path(&self, name: &str) -> StoreResult<PathBuf> {
        if name.is_empty() || name.contains('/') || name.contains('\\') || name == ".." {
            return Err(StoreError::InvalidName(name.to_string()));
        }
        Ok(self.root.join(name))
    }
}

impl SubmissionFileStore for LocalFileStore {
    fn file_names(&self) -> StoreResult<Vec<String>> {
        let entries = fs::read_dir(&self.root).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StoreError::DirectoryNotFound(self.root.display().to_string())
            } else {
                StoreError::io(self.root.display().to_string(), e)
            }
        })?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io(self.root.display().to_string(), e))?;
            let is_file = entry
                .file_type()
                .map_err(|e| StoreError::io(self.root.display().to_string(), e))?
                .is_file();
            if is_file {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    fn open_for_read(&self, name: &str) -> StoreResult<Box<dyn Read + Send>> {
        let path = self.full_path(name)?;
        let file = File::open(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StoreError::FileNotFound(name.to_string())
            } else {
                StoreError::io(name, e)
            }
        })?;
        Ok(Box::new(file))
    }
}
