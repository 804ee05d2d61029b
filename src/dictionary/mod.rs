//! Dictionary subsystem
//!
//! The dictionary is the versioned, declarative description of a submission:
//! file schemas, their fields and restrictions, relations between files and
//! the code lists restrictions refer to.
//!
//! # Design Principles
//!
//! - Loaded once, immutable for the whole run
//! - Authoring errors are detected before any submission file is read
//! - Restrictions form a closed set of variants

mod codelist;
mod errors;
mod loader;
mod types;
mod validator;

pub use codelist::{CodeList, CodeLists, Term};
pub use errors::{DictionaryError, DictionaryErrorCode, DictionaryResult, Severity};
pub use loader::{ActiveDictionary, DictionaryLoader};
pub use types::{
    Dictionary, Field, FileSchema, Relation, Restriction, RestrictionKind, SummaryType, ValueType,
};
pub use validator::DictionaryValidator;
