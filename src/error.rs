//! Error types surfaced by the matching core.
//!
//! Input-shape and structural errors are returned before any matching work
//! happens. Advisory conditions are never errors; see
//! [`Advisory`](crate::matching::Advisory).

use thiserror::Error;

use crate::table::TableError;

/// Errors returned by the matchers, the duplicate clusterer and the update
/// detector.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MatchError {
    /// A referenced field is not a column of the named table.
    #[error("Column does not exist: '{column}' not found in {table}")]
    ColumnDoesNotExist { column: String, table: String },

    /// Left and right field lists have different lengths.
    #[error("Filter columns do not match: {left} source field(s) but {right} target field(s)")]
    FilterColumnMismatch { left: usize, right: usize },

    /// The table used as the unmatched side has duplicate row labels.
    #[error("Index of {0} contains duplicate entries and cannot be used for fuzzy matching")]
    FuzzyMatchIndex(String),

    /// Threshold outside the 0-100 percentage range.
    #[error("Threshold must be between 0 and 100, got {0}")]
    InvalidThreshold(f64),

    /// Unknown duplicate blocking mode.
    #[error("fuzzy_type must be 'strict' or 'permissive', got '{0}'")]
    InvalidFuzzyType(String),

    /// No name fields were given to the duplicate clusterer.
    #[error("At least one name field is required")]
    NoNameFields,

    /// The duplicate label column would overwrite one of the input fields.
    #[error("Output column '{0}' is also an input field and would be overwritten")]
    OutputColumnClash(String),

    /// A target date-of-birth value could not be read as a date.
    #[error("Column '{field}' could not be converted to dates: '{value}' is not a date")]
    DateCoercion { field: String, value: String },

    /// Year group cannot be parsed or is outside Reception..Year 13.
    #[error("Invalid year group: '{0}'. Must be R/Reception or 0-13")]
    InvalidYearGroup(String),

    /// Further-education levels have no school year equivalent.
    #[error("Invalid year group: '{0}'. Cannot translate FE Levels to school year groups")]
    FeLevel(String),

    #[error(transparent)]
    Table(#[from] TableError),
}

impl MatchError {
    pub(crate) fn missing(column: &str, table: &str) -> Self {
        MatchError::ColumnDoesNotExist {
            column: column.to_string(),
            table: table.to_string(),
        }
    }
}

pub type Result<T, E = MatchError> = std::result::Result<T, E>;
