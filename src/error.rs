//! Error types for clrconv
//!
//! Only failures that stop a whole run are errors. Problems with single
//! constructs are reported as diagnostics and never unwind the walk.

use crate::ast::Language;
use thiserror::Error;

/// Main error type for clrconv
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("Malformed input: {count} parse error(s), first at line {line}: {message}")]
    MalformedInput {
        count: usize,
        line: usize,
        message: String,
    },

    #[error("Cannot convert from {source_language} to {target}")]
    InvalidLanguagePair {
        source_language: Language,
        target: Language,
    },

    #[error("Symbol model still has {0} unresolved forward reference(s)")]
    PendingForwardRefs(usize),

    #[error("Library catalog error: {0}")]
    Catalog(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConvertError>;
