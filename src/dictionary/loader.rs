//! Dictionary loader
//!
//! Reads the dictionary and its code lists from JSON files at startup.
//! Unreadable or malformed files are FATAL, authoring violations are REJECT.
//! A loaded pair is immutable and shared behind `Arc` for the rest of the run.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use tracing::info;

use super::codelist::{CodeList, CodeLists};
use super::errors::{DictionaryError, DictionaryResult};
use super::types::Dictionary;
use super::validator::DictionaryValidator;
use crate::observability::Event;

/// A validated dictionary together with the code lists it references
#[derive(Debug, Clone)]
pub struct ActiveDictionary {
    pub dictionary: Arc<Dictionary>,
    pub codelists: Arc<CodeLists>,
}

impl ActiveDictionary {
    /// Validates an in-memory pair
    pub fn new(dictionary: Dictionary, codelists: CodeLists) -> DictionaryResult<Self> {
        DictionaryValidator::new(&dictionary, &codelists).validate()?;
        Ok(Self {
            dictionary: Arc::new(dictionary),
            codelists: Arc::new(codelists),
        })
    }
}

/// Loads dictionaries and code lists from disk
pub struct DictionaryLoader;

impl DictionaryLoader {
    /// Loads and validates a dictionary file and its code list file.
    pub fn load(dictionary_path: &Path, codelists_path: &Path) -> DictionaryResult<ActiveDictionary> {
        let dictionary = Self::load_dictionary(dictionary_path)?;
        let codelists = Self::load_codelists(codelists_path)?;
        let active = ActiveDictionary::new(dictionary, codelists)?;

        info!(
            event = Event::DictionaryLoaded.as_str(),
            version = %active.dictionary.version,
            schemas = active.dictionary.files.len(),
            codelists = active.codelists.len(),
            "dictionary loaded"
        );

        Ok(active)
    }

    /// Parses a dictionary file without authoring checks
    pub fn load_dictionary(path: &Path) -> DictionaryResult<Dictionary> {
        let content = read(path)?;
        Self::dictionary_from_str(&content)
            .map_err(|e| DictionaryError::malformed(path.display().to_string(), e.message().to_string()))
    }

    /// Parses a code list file: a JSON array of code lists
    pub fn load_codelists(path: &Path) -> DictionaryResult<CodeLists> {
        let content = read(path)?;
        let lists: Vec<CodeList> = serde_json::from_str(&content).map_err(|e| {
            DictionaryError::malformed(path.display().to_string(), format!("Invalid JSON: {}", e))
        })?;
        CodeLists::from_lists(lists)
    }

    /// Parses a dictionary from a JSON string
    pub fn dictionary_from_str(content: &str) -> DictionaryResult<Dictionary> {
        serde_json::from_str(content)
            .map_err(|e| DictionaryError::malformed("<in-memory>", format!("Invalid JSON: {}", e)))
    }
}

fn read(path: &Path) -> DictionaryResult<String> {
    fs::read_to_string(path)
        .map_err(|e| DictionaryError::io(path.display().to_string(), e.to_string()))
}
