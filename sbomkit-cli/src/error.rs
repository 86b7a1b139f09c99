//! CLI-specific error types and exit code mapping

use sbomkit_cataloging::CatalogingError;
use sbomkit_core::error::{CatalogError, SbomkitError, SourceError};

/// CLI-specific error type.
///
/// Each variant carries enough context for a user-friendly message.
/// The `exit_code()` method maps errors to process exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// The scan target is not something the engine can catalog.
    #[error("unsupported source: {0}")]
    UnsupportedSource(String),

    /// The run was interrupted before completion.
    #[error("cataloging cancelled")]
    Cancelled,

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (file read, stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                        |
    /// |------|--------------------------------|
    /// | 0    | Success                        |
    /// | 1    | General / command error        |
    /// | 2    | Configuration error            |
    /// | 3    | Unsupported source             |
    /// | 4    | Cancelled                      |
    /// | 10   | IO error                       |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 2,
            Self::UnsupportedSource(_) => 3,
            Self::Cancelled => 4,
            Self::Io(_) => 10,
            Self::JsonSerialize(_) | Self::Command(_) => 1,
        }
    }
}

impl From<SbomkitError> for CliError {
    fn from(e: SbomkitError) -> Self {
        match e {
            SbomkitError::Config(e) => Self::Config(e.to_string()),
            SbomkitError::Source(SourceError::Unsupported { kind }) => Self::UnsupportedSource(kind),
            SbomkitError::Source(e @ SourceError::NotFound { .. }) => Self::Command(e.to_string()),
            SbomkitError::Cataloging(CatalogError::Validation(msg)) => Self::Config(msg),
            SbomkitError::Cataloging(CatalogError::Cancelled) => Self::Cancelled,
            SbomkitError::Cataloging(e) => Self::Command(e.to_string()),
            SbomkitError::Io(e) => Self::Io(e),
        }
    }
}

impl From<CatalogingError> for CliError {
    fn from(e: CatalogingError) -> Self {
        match e {
            CatalogingError::Io { source, .. } => Self::Io(source),
            other => SbomkitError::from(other).into(),
        }
    }
}
