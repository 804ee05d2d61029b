//! # Submission file store
//!
//! Read-only access to the files of one submission: listing by pattern,
//! opening raw or decompressed streams and codec detection.

mod codec;
mod errors;
mod local;
mod memory;

pub use codec::{verify_stream, Compression, StreamIntegrity};
pub use errors::{StoreError, StoreResult};
pub use local::LocalFileStore;
pub use memory::MemoryFileStore;

#[cfg(test)]
pub(crate) use codec::testing;

use std::fmt;
use std::io::Read;

use regex::Regex;

/// Backend trait for submission files
pub trait SubmissionFileStore: Send + Sync + fmt::Debug {
    /// Every file name in the submission, sorted
    fn file_names(&self) -> StoreResult<Vec<String>>;

    /// Opens the raw bytes of a file
    fn open_for_read(&self, name: &str) -> StoreResult<Box<dyn Read + Send>>;

    /// File names matching any of the patterns, sorted
    fn list_files(&self, patterns: &[Regex]) -> StoreResult<Vec<String>> {
        Ok(self
            .file_names()?
            .into_iter()
            .filter(|name| patterns.iter().any(|p| p.is_match(name)))
            .collect())
    }

    /// Codec in use, from the file's magic bytes
    fn detect_compression(&self, name: &str) -> StoreResult<Compression> {
        let mut head = Vec::with_capacity(3);
        self.open_for_read(name)?
            .take(3)
            .read_to_end(&mut head)
            .map_err(|e| StoreError::io(name, e))?;
        Ok(Compression::sniff(&head))
    }

    /// Opens a file through the decoder matching its content
    fn open_decompressed(&self, name: &str) -> StoreResult<Box<dyn Read + Send>> {
        let compression = self.detect_compression(name)?;
        Ok(compression.decoder(self.open_for_read(name)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_files_by_pattern() {
        let store = MemoryFileStore::new()
            .with_file("donor.txt", b"a\n".to_vec())
            .with_file("specimen.txt", b"a\n".to_vec())
            .with_file("notes.md", b"a\n".to_vec());
        let patterns = vec![Regex::new(r"^donor\.txt$").unwrap(), Regex::new(r"^specimen").unwrap()];

        assert_eq!(store.list_files(&patterns).unwrap(), vec!["donor.txt", "specimen.txt"]);
    }

    #[test]
    fn test_open_decompressed_uses_content() {
        let store = MemoryFileStore::new().with_file("donor.txt.gz", testing::gzip(b"donor_id\n"));
        assert_eq!(store.detect_compression("donor.txt.gz").unwrap(), Compression::Gzip);

        let mut content = String::new();
        store
            .open_decompressed("donor.txt.gz")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "donor_id\n");
    }
}
