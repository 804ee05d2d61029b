//! Code lists
//!
//! A code list maps short codes to human readable values. A cell satisfies a
//! code list restriction when it equals either a code or a value of a term.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use super::errors::{DictionaryError, DictionaryResult};

/// One code/value pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    pub code: String,
    pub value: String,
}

impl Term {
    pub fn new(code: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            value: value.into(),
        }
    }
}

/// Named list of terms
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeList {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub terms: Vec<Term>,
}

impl CodeList {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: None,
            terms: Vec::new(),
        }
    }

    /// Append a term
    pub fn with_term(mut self, code: impl Into<String>, value: impl Into<String>) -> Self {
        self.terms.push(Term::new(code, value));
        self
    }

    /// Every accepted cell value: all codes followed by all values
    pub fn accepted_values(&self) -> HashSet<String> {
        self.terms
            .iter()
            .flat_map(|t| [t.code.clone(), t.value.clone()])
            .collect()
    }

    /// Linear membership test, callers on hot paths use `accepted_values`
    pub fn contains(&self, candidate: &str) -> bool {
        self.terms
            .iter()
            .any(|t| t.code == candidate || t.value == candidate)
    }

    /// Checks that codes and values are unique and do not shadow each other.
    ///
    /// A term whose code equals its own value is allowed.
    pub fn validate(&self) -> DictionaryResult<()> {
        let mut codes = HashSet::new();
        let mut values = HashSet::new();

        for term in &self.terms {
            if !codes.insert(term.code.as_str()) {
                return Err(DictionaryError::invalid_codelist(
                    &self.name,
                    format!("duplicate code '{}'", term.code),
                ));
            }
            if !values.insert(term.value.as_str()) {
                return Err(DictionaryError::invalid_codelist(
                    &self.name,
                    format!("duplicate value '{}'", term.value),
                ));
            }
        }

        for term in &self.terms {
            if term.code != term.value && codes.contains(term.value.as_str()) {
                return Err(DictionaryError::invalid_codelist(
                    &self.name,
                    format!("value '{}' collides with another term's code", term.value),
                ));
            }
        }

        Ok(())
    }
}

/// All code lists of a dictionary, indexed by name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeLists {
    lists: BTreeMap<String, CodeList>,
}

impl CodeLists {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a code list, rejecting duplicate names
    pub fn register(&mut self, list: CodeList) -> DictionaryResult<()> {
        list.validate()?;
        if self.lists.contains_key(&list.name) {
            return Err(DictionaryError::invalid_codelist(
                &list.name,
                "declared more than once",
            ));
        }
        self.lists.insert(list.name.clone(), list);
        Ok(())
    }

    /// Builds the collection from a list, validating each entry
    pub fn from_lists(lists: Vec<CodeList>) -> DictionaryResult<Self> {
        let mut collection = Self::new();
        for list in lists {
            collection.register(list)?;
        }
        Ok(collection)
    }

    pub fn get(&self, name: &str) -> Option<&CodeList> {
        self.lists.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lists.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CodeList> {
        self.lists.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::DictionaryErrorCode;

    fn sex() -> CodeList {
        CodeList::new("sex").with_term("1", "male").with_term("2", "female")
    }

    #[test]
    fn test_codes_and_values_accepted() {
        let list = sex();
        assert!(list.contains("1"));
        assert!(list.contains("female"));
        assert!(!list.contains("3"));
        assert!(!list.contains("Male"));

        let accepted = list.accepted_values();
        assert_eq!(accepted.len(), 4);
    }

    #[test]
    fn test_duplicate_code_rejected() {
        let list = sex().with_term("1", "unknown");
        let err = list.validate().unwrap_err();
        assert_eq!(err.code(), DictionaryErrorCode::DictInvalidCodelist);
    }

    #[test]
    fn test_value_shadowing_code_rejected() {
        let list = CodeList::new("odd").with_term("1", "2").with_term("2", "two");
        assert!(list.validate().is_err());
    }

    #[test]
    fn test_identity_term_allowed() {
        let list = CodeList::new("yes_no").with_term("yes", "yes").with_term("no", "no");
        assert!(list.validate().is_ok());
    }

    #[test]
    fn test_duplicate_list_name_rejected() {
        let mut lists = CodeLists::new();
        lists.register(sex()).unwrap();
        assert!(lists.register(sex()).is_err());
        assert_eq!(lists.len(), 1);
    }
}
