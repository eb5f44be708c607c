use std::fmt;

use crate::model::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum LinkageError {
    /// Caller passed an argument the operation cannot honor (empty block spec, bad ratio, ...).
    InvalidArgument(String),
    /// A named column is not part of the dataset schema.
    MissingColumn { column: String },
    /// A row does not have the schema's width.
    SchemaMismatch { row: usize, expected: usize, found: usize },
    /// A row's identifier field is null.
    MissingId { row: usize },
    /// Two rows share an identifier.
    DuplicateId { id: Value, row: usize },
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (no passes, bad threshold, duplicate feature, etc.).
    ConfigValidation(String),
    /// External record source (CSV reader, SQLite) failed.
    Source(String),
    /// IO error (file read, etc.).
    Io(String),
}

impl fmt::Display for LinkageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            Self::MissingColumn { column } => write!(f, "missing column '{column}'"),
            Self::SchemaMismatch { row, expected, found } => {
                write!(f, "row {row}: expected {expected} field(s), found {found}")
            }
            Self::MissingId { row } => write!(f, "row {row}: record id is null"),
            Self::DuplicateId { id, row } => write!(f, "row {row}: duplicate record id {id}"),
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::Source(msg) => write!(f, "record source error: {msg}"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for LinkageError {}

impl From<std::io::Error> for LinkageError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}
