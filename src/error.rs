//! Error taxonomy for the enrichment pipeline
//!
//! Run-fatal errors (structural, validation) abort before any database work
//! starts. Catalog and write errors are scoped to a single database and are
//! collected by the orchestrator as [`PerDatabaseError`] values.

use crate::core::database::Database;
use crate::core::orchestrator::{OutputTarget, PipelineStage};
use serde::Serialize;
use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Coarse cause category the presentation layer uses to pick a remedy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    MalformedInput,
    EmptyInput,
    MissingData,
    SchemaMismatch,
    Permission,
    DiskFull,
    InvalidPath,
    Cancelled,
    Io,
}

/// Input text could not be read as samples of identifiers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StructuralError {
    #[error("no sample header found (lines must start with '>')")]
    NoHeaders,

    #[error("line {line}: identifier '{identifier}' appears before any sample header")]
    IdentifierBeforeHeader { line: usize, identifier: String },

    #[error("line {line}: sample header has no name")]
    EmptyHeader { line: usize },

    #[error("input is {size} bytes, above the {limit} byte limit")]
    TooLarge { size: usize, limit: usize },
}

impl StructuralError {
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::MalformedInput
    }
}

/// Why a sample ended up with no identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptySampleCause {
    /// The header was followed directly by another header or end of input.
    NoIdentifiers,
    /// Every identifier in the sample failed the format check.
    AllMalformed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationErrorKind {
    EmptyInput,
    EmptySample,
    NoValidIdentifiers,
    MalformedIdentifier,
}

/// Parsed records violate a sample or identifier invariant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("input contains no identifiers")]
    EmptyInput,

    #[error("sample '{sample}' has no valid identifiers")]
    EmptySample {
        sample: String,
        cause: EmptySampleCause,
    },

    #[error("none of the {total} identifiers match the expected format")]
    NoValidIdentifiers { total: usize },

    #[error("malformed identifier '{identifier}' in sample '{sample}'")]
    MalformedIdentifier { sample: String, identifier: String },
}

impl ValidationError {
    pub fn kind(&self) -> ValidationErrorKind {
        match self {
            ValidationError::EmptyInput => ValidationErrorKind::EmptyInput,
            ValidationError::EmptySample { .. } => ValidationErrorKind::EmptySample,
            ValidationError::NoValidIdentifiers { .. } => ValidationErrorKind::NoValidIdentifiers,
            ValidationError::MalformedIdentifier { .. } => ValidationErrorKind::MalformedIdentifier,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            ValidationError::EmptyInput | ValidationError::EmptySample { .. } => {
                ErrorCategory::EmptyInput
            }
            ValidationError::NoValidIdentifiers { .. }
            | ValidationError::MalformedIdentifier { .. } => ErrorCategory::MalformedInput,
        }
    }
}

/// The two error kinds that abort a whole run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error(transparent)]
    Structural(#[from] StructuralError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl InputError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            InputError::Structural(e) => e.category(),
            InputError::Validation(e) => e.category(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogErrorKind {
    MissingSource,
    SchemaMismatch,
    Malformed,
}

/// A reference table could not be loaded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("{database} reference table not found at {}", .path.display())]
    MissingSource { database: Database, path: PathBuf },

    #[error(
        "{database} reference table {} is missing column(s): {}",
        .path.display(),
        .missing.join(", ")
    )]
    SchemaMismatch {
        database: Database,
        path: PathBuf,
        missing: Vec<String>,
    },

    #[error("{database} reference table {} is unreadable{}: {message}",
        .path.display(),
        .line.map(|l| format!(" at line {}", l)).unwrap_or_default()
    )]
    Malformed {
        database: Database,
        path: PathBuf,
        line: Option<u64>,
        message: String,
    },
}

impl CatalogError {
    pub fn kind(&self) -> CatalogErrorKind {
        match self {
            CatalogError::MissingSource { .. } => CatalogErrorKind::MissingSource,
            CatalogError::SchemaMismatch { .. } => CatalogErrorKind::SchemaMismatch,
            CatalogError::Malformed { .. } => CatalogErrorKind::Malformed,
        }
    }

    pub fn database(&self) -> Database {
        match self {
            CatalogError::MissingSource { database, .. }
            | CatalogError::SchemaMismatch { database, .. }
            | CatalogError::Malformed { database, .. } => *database,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            CatalogError::MissingSource { .. } => ErrorCategory::MissingData,
            CatalogError::SchemaMismatch { .. } | CatalogError::Malformed { .. } => {
                ErrorCategory::SchemaMismatch
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteErrorKind {
    PermissionDenied,
    DiskFull,
    PathInvalid,
    Other,
}

impl fmt::Display for WriteErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            WriteErrorKind::PermissionDenied => "permission denied",
            WriteErrorKind::DiskFull => "disk full",
            WriteErrorKind::PathInvalid => "invalid path",
            WriteErrorKind::Other => "I/O failure",
        };
        f.write_str(label)
    }
}

// Linux errno values
const ENOTDIR: i32 = 20;
const EISDIR: i32 = 21;
const ENOSPC: i32 = 28;
const ENAMETOOLONG: i32 = 36;
const EDQUOT: i32 = 122;

/// A result file could not be written.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot write {}: {kind} ({message})", .path.display())]
pub struct WriteError {
    pub kind: WriteErrorKind,
    pub path: PathBuf,
    pub message: String,
}

impl WriteError {
    pub fn new(kind: WriteErrorKind, path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
            message: message.into(),
        }
    }

    /// Classify an OS-level failure.
    pub fn from_io(path: impl Into<PathBuf>, err: &io::Error) -> Self {
        let kind = match (err.kind(), err.raw_os_error()) {
            (io::ErrorKind::PermissionDenied, _) => WriteErrorKind::PermissionDenied,
            (_, Some(ENOSPC)) | (_, Some(EDQUOT)) => WriteErrorKind::DiskFull,
            (_, Some(ENOTDIR)) | (_, Some(EISDIR)) | (_, Some(ENAMETOOLONG)) => {
                WriteErrorKind::PathInvalid
            }
            (io::ErrorKind::NotFound, _)
            | (io::ErrorKind::InvalidInput, _)
            | (io::ErrorKind::AlreadyExists, _) => WriteErrorKind::PathInvalid,
            _ => WriteErrorKind::Other,
        };
        Self::new(kind, path, err.to_string())
    }

    pub fn from_csv(path: impl Into<PathBuf>, err: csv::Error) -> Self {
        let path = path.into();
        match err.into_kind() {
            csv::ErrorKind::Io(io_err) => Self::from_io(path, &io_err),
            other => Self::new(WriteErrorKind::Other, path, format!("{:?}", other)),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self.kind {
            WriteErrorKind::PermissionDenied => ErrorCategory::Permission,
            WriteErrorKind::DiskFull => ErrorCategory::DiskFull,
            WriteErrorKind::PathInvalid => ErrorCategory::InvalidPath,
            WriteErrorKind::Other => ErrorCategory::Io,
        }
    }
}

/// Underlying reason a single database pipeline failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FailureCause {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Write(#[from] WriteError),

    #[error("run cancelled before this step started")]
    Cancelled,
}

impl FailureCause {
    pub fn category(&self) -> ErrorCategory {
        match self {
            FailureCause::Catalog(e) => e.category(),
            FailureCause::Write(e) => e.category(),
            FailureCause::Cancelled => ErrorCategory::Cancelled,
        }
    }
}

/// Records which output and which pipeline stage failed, and why.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{target} failed at {stage} stage: {cause}")]
pub struct PerDatabaseError {
    pub target: OutputTarget,
    pub stage: PipelineStage,
    pub cause: FailureCause,
}

impl PerDatabaseError {
    pub fn new(target: OutputTarget, stage: PipelineStage, cause: impl Into<FailureCause>) -> Self {
        Self {
            target,
            stage,
            cause: cause.into(),
        }
    }

    pub fn database(&self) -> Option<Database> {
        match self.target {
            OutputTarget::Database(db) => Some(db),
            OutputTarget::Combined => None,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        self.cause.category()
    }
}

/// Crate-level error for callers that do not need the fine-grained taxonomy.
#[derive(Error, Debug)]
pub enum BioremError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Write(#[from] WriteError),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for BioremError {
    fn from(err: serde_json::Error) -> Self {
        BioremError::Serialization(err.to_string())
    }
}

impl From<StructuralError> for BioremError {
    fn from(err: StructuralError) -> Self {
        BioremError::Input(err.into())
    }
}

impl From<ValidationError> for BioremError {
    fn from(err: ValidationError) -> Self {
        BioremError::Input(err.into())
    }
}

pub type Result<T> = std::result::Result<T, BioremError>;
