// Copyright (c) Chris Gunn.
// Licensed under the MIT license.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("query error: '{op}' called before 'on'")]
    InvalidQueryState { op: &'static str },

    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("{name}: unsupported value: {reason}")]
    UnsupportedValue { name: String, reason: String },

    #[error("{name}: yaml parse error: {reason}")]
    Parse { name: String, reason: String },

    #[error("yaml emit error: {0}")]
    Emit(String),

    #[error("failed to access {}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid token name '{0}'")]
    InvalidTokenName(String),

    #[error("token '{0}' is defined more than once")]
    DuplicateToken(String),

    #[error("value of token '{key}' contains placeholder of token '{other}'")]
    OverlappingTokens { key: String, other: String },

    #[error("{output}: unresolved placeholders: {}", names.join(", "))]
    UnresolvedPlaceholders { output: String, names: Vec<String> },

    #[error("invalid service descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("worker stopped before rendering '{0}'")]
    WorkerFailed(String),
}

pub type Result<T> = std::result::Result<T, Error>;
