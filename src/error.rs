// 🚨 Error Taxonomy - every way a run can abort
//
// Each variant is terminal for the run. The file or table that caused the
// failure travels as data; rendering the message is left to the caller.

use std::io;
use thiserror::Error;

/// Generic diagnostic shared by the variants that don't name a file.
pub const UNEXPECTED_ERROR: &str = "An unexpected error occurred";

// ============================================================================
// SALES ERROR
// ============================================================================

#[derive(Error, Debug)]
pub enum SalesError {
    /// Wrong number of command-line arguments
    #[error("An unexpected error occurred")]
    Usage,

    #[error("{label} does not exist")]
    DefinitionFileMissing { label: String },

    /// `line` is 1-based
    #[error("{label} has an invalid format")]
    DefinitionFileMalformed { label: String, line: usize },

    #[error("Sales file names are not sequential")]
    RecordFilesNotSequential { previous: String, next: String },

    #[error("{file} has an invalid format")]
    SalesFileMalformed { file: String },

    #[error("{file} has an invalid branch code")]
    UnknownBranchCode { file: String },

    #[error("{file} has an invalid commodity code")]
    UnknownCommodityCode { file: String },

    #[error("An unexpected error occurred")]
    InvalidAmount,

    #[error("Total amount exceeded 10 digits")]
    TotalsOverflow,

    #[error("An unexpected error occurred")]
    ReportWriteFailed {
        file: String,
        #[source]
        source: io::Error,
    },

    #[error("An unexpected error occurred")]
    Unknown(#[from] io::Error),
}

impl SalesError {
    /// Stable tag for logs and assertions
    pub fn kind(&self) -> &'static str {
        match self {
            SalesError::Usage => "UsageError",
            SalesError::DefinitionFileMissing { .. } => "DefinitionFileMissing",
            SalesError::DefinitionFileMalformed { .. } => "DefinitionFileMalformed",
            SalesError::RecordFilesNotSequential { .. } => "RecordFilesNotSequential",
            SalesError::SalesFileMalformed { .. } => "SalesFileMalformed",
            SalesError::UnknownBranchCode { .. } => "UnknownBranchCode",
            SalesError::UnknownCommodityCode { .. } => "UnknownCommodityCode",
            SalesError::InvalidAmount => "InvalidAmount",
            SalesError::TotalsOverflow => "TotalsOverflow",
            SalesError::ReportWriteFailed { .. } => "ReportWriteFailed",
            SalesError::Unknown(_) => "UnknownError",
        }
    }

    /// The record or report file this error names, if any
    pub fn file(&self) -> Option<&str> {
        match self {
            SalesError::SalesFileMalformed { file }
            | SalesError::UnknownBranchCode { file }
            | SalesError::UnknownCommodityCode { file }
            | SalesError::ReportWriteFailed { file, .. } => Some(file),
            _ => None,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
