//! # In-memory store

use std::collections::BTreeMap;
use std::io::{Cursor, Read};
use std::sync::Arc;

use super::errors::{StoreError, StoreResult};
use super::SubmissionFileStore;

/// Submission held entirely in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryFileStore {
    files: BTreeMap<String, Arc<[u8]>>,
}

impl MemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        self.insert(name, content);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, content: impl Into<Vec<u8>>) {
        self.files.insert(name.into(), Arc::from(content.into()));
    }
}

impl SubmissionFileStore for MemoryFileStore {
    fn file_names(&self) -> StoreResult<Vec<String>> {
        Ok(self.files.keys().cloned().collect())
    }

    fn open_for_read(&self, name: &str) -> StoreResult<Box<dyn Read + Send>> {
        let content = self
            .files
            .get(name)
            .ok_or_else(|| StoreError::FileNotFound(name.to_string()))?;
        Ok(Box::new(Cursor::new(Arc::clone(content))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_back() {
        let store = MemoryFileStore::new().with_file("donor.txt", "donor_id\nD1\n");
        let mut content = String::new();
        store
            .open_for_read("donor.txt")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "donor_id\nD1\n");
        assert!(store.open_for_read("specimen.txt").is_err());
    }
}
