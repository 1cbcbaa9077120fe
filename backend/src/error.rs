//! Error types for the curation pipeline.
//!
//! - [`SourceError`] - Reading a raw snapshot failed
//! - [`StorageError`] - Truncating or writing a curated table failed
//! - [`ConfigError`] - Invalid environment configuration
//! - [`PipelineError`] - Top-level run failure, carrying the failing table
//!
//! Per-record anomalies (malformed numbers, impossible dates, a price that
//! cannot be derived because quantity is zero) never appear here: they are
//! resolved to null or a sentinel where they occur.

use serde::Serialize;
use thiserror::Error;

use crate::models::Table;

// =============================================================================
// Source Errors
// =============================================================================

/// Errors while reading a raw snapshot.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Failed to read the extract file.
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The extract could not be decoded into records.
    #[error("Invalid CSV in {path}: {message}")]
    Format { path: String, message: String },

    /// The snapshot has no header line.
    #[error("Extract {0} is empty")]
    EmptyFile(String),
}

impl SourceError {
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn format(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Format {
            path: path.into(),
            message: message.into(),
        }
    }
}

// =============================================================================
// Storage Errors
// =============================================================================

/// Errors from the destination store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem failure.
    #[error("Storage IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Records could not be serialized or read back.
    #[error("Storage format error: {0}")]
    Csv(#[from] csv::Error),

    /// The store refused the operation.
    #[error("Store unavailable for {table}: {message}")]
    Unavailable { table: String, message: String },

    /// A write arrived without a preceding truncate.
    #[error("Table {0} was written without being truncated first")]
    NotTruncated(String),
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors while building [`crate::config::Config`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A variable holds a value that cannot be interpreted.
    #[error("Invalid value for {name}: '{value}'")]
    InvalidValue { name: String, value: String },
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// How bad a run failure is for the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// The run aborted; re-triggering it after fixing the input is enough.
    Error,
    /// The destination is unusable; re-triggering will fail the same way.
    Fatal,
}

/// Failure of a single table that aborts the run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The raw snapshot could not be read.
    #[error("{table}: {source}")]
    Source {
        table: Table,
        #[source]
        source: SourceError,
    },

    /// The curated table could not be replaced.
    #[error("{table}: {source}")]
    Storage {
        table: Table,
        #[source]
        source: StorageError,
    },
}

impl PipelineError {
    /// The table whose processing failed.
    pub fn table(&self) -> Table {
        match self {
            PipelineError::Source { table, .. } | PipelineError::Storage { table, .. } => *table,
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            PipelineError::Source { source, .. } => match source {
                SourceError::Io { .. } => "SOURCE_IO",
                SourceError::Format { .. } | SourceError::EmptyFile(_) => "SOURCE_FORMAT",
            },
            PipelineError::Storage { source, .. } => match source {
                StorageError::Io(_) => "STORAGE_IO",
                StorageError::Csv(_) | StorageError::NotTruncated(_) => "STORAGE_FORMAT",
                StorageError::Unavailable { .. } => "STORAGE_UNAVAILABLE",
            },
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            PipelineError::Source { .. } => Severity::Error,
            PipelineError::Storage { source, .. } => match source {
                StorageError::Unavailable { .. } => Severity::Fatal,
                _ => Severity::Error,
            },
        }
    }

    /// Serializable descriptor handed to the caller of a failed run.
    pub fn descriptor(&self) -> ErrorDescriptor {
        let message = match self {
            PipelineError::Source { source, .. } => source.to_string(),
            PipelineError::Storage { source, .. } => source.to_string(),
        };
        ErrorDescriptor {
            table: self.table(),
            code: self.code(),
            severity: self.severity(),
            message,
        }
    }
}

/// What the operator sees when a run aborts.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorDescriptor {
    pub table: Table,
    pub code: &'static str,
    pub severity: Severity,
    pub message: String,
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for raw reads.
pub type SourceResult<T> = Result<T, SourceError>;

/// Result type for store operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Result type for a pipeline step.
pub type PipelineResult<T> = Result<T, PipelineError>;
