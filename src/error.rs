//! Error types.
//!
//! - `CurveError`: failures of the alignment/curve engine itself
//! - `AppError`: what the binary reports, carrying a process exit code

use chrono::NaiveDate;
use thiserror::Error;

/// Result alias for engine operations.
pub type CurveResult<T> = Result<T, CurveError>;

/// Engine-level failure taxonomy.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CurveError {
    /// Malformed or missing required input.
    #[error("Invalid input: {message}")]
    InvalidInput {
        /// What was wrong.
        message: String,
    },

    /// A maturity with the same id is already registered.
    #[error("Maturity {id} already exists")]
    DuplicateMaturity {
        /// The colliding id.
        id: String,
    },

    /// Merge requested while some series have no maturity.
    #[error("Assign a maturity to every file: {}", .files.join(", "))]
    UnassignedFiles {
        /// Every offending source name.
        files: Vec<String>,
    },

    /// No merged row for the requested observation date.
    #[error("No data found for {date}")]
    DateNotFound {
        /// The requested date.
        date: NaiveDate,
    },

    /// The merge produced no rows at all.
    #[error("No data could be merged; check the file format (Date/Price columns)")]
    EmptyMergeResult,
}

impl CurveError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<CurveError> for AppError {
    fn from(err: CurveError) -> Self {
        let exit_code = match err {
            CurveError::InvalidInput { .. }
            | CurveError::DuplicateMaturity { .. }
            | CurveError::UnassignedFiles { .. } => 2,
            CurveError::DateNotFound { .. } | CurveError::EmptyMergeResult => 3,
        };
        AppError::new(exit_code, err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
