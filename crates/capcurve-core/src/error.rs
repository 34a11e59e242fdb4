// Error taxonomy for the draft-capital pipeline.
//
// Every fatal condition aborts the enclosing operation and carries enough
// structured detail (year, offending keys, columns) to diagnose it without
// re-running.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Reference data
// ---------------------------------------------------------------------------

/// A reference table (value curve, capacity table, synonym table) is
/// malformed, or is missing an entry a later lookup needs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReferenceDataError {
    #[error("{table} table is missing columns [{}]", .missing.join(", "))]
    MissingColumns {
        table: &'static str,
        missing: Vec<String>,
    },

    #[error("{table} table row {row}: `{field}` is not a number: {raw:?}")]
    NonNumeric {
        table: &'static str,
        row: usize,
        field: &'static str,
        raw: String,
    },

    #[error("value curve lists pick {pick} more than once")]
    DuplicatePick { pick: u32 },

    #[error("capacity table lists year {year} more than once")]
    DuplicateYear { year: i32 },

    #[error("pick numbers start at 1, got {pick}")]
    InvalidPick { pick: u32 },

    #[error("value for pick {pick} must be finite and non-negative, got {value}")]
    InvalidValue { pick: u32, value: f64 },

    #[error("capacity for year {year} must be at least one pick")]
    InvalidCapacity { year: i32 },

    #[error("pick {pick} has no entry in the value curve")]
    MissingPick { pick: u32 },

    #[error("year {year} has no configured pick capacity")]
    MissingYear { year: i32 },

    #[error("synonym table maps `{label}` back onto itself")]
    SynonymCycle { label: String },
}

// ---------------------------------------------------------------------------
// Board schema
// ---------------------------------------------------------------------------

/// A raw board lacks one of the required columns after name normalization.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "board for {year} is missing columns [{}]; found [{}]",
    .missing.join(", "),
    .found.join(", ")
)]
pub struct SchemaError {
    pub year: i32,
    /// Missing required columns, sorted.
    pub missing: Vec<String>,
    /// Normalized column names that were present.
    pub found: Vec<String>,
}

// ---------------------------------------------------------------------------
// Value coverage
// ---------------------------------------------------------------------------

/// One or more retained picks have no value on the curve.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "year {year}: value curve has no entry for picks {picks:?} (and {additional} more); \
     extend the value curve"
)]
pub struct ValueCoverageError {
    pub year: i32,
    /// Up to ten distinct offending picks, ascending.
    pub picks: Vec<u32>,
    /// Offending picks beyond the reported ones.
    pub additional: usize,
}

// ---------------------------------------------------------------------------
// Missing year
// ---------------------------------------------------------------------------

/// The cross-year combine asked for a year with no per-year summary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no position summary available for year {year}")]
pub struct MissingYearError {
    pub year: i32,
}

// ---------------------------------------------------------------------------
// Stage wrappers
// ---------------------------------------------------------------------------

/// Fatal outcomes of a single year's aggregation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AggregateError {
    #[error(transparent)]
    ReferenceData(#[from] ReferenceDataError),

    #[error(transparent)]
    ValueCoverage(#[from] ValueCoverageError),
}

/// Umbrella error so callers can `?` across every stage.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    #[error(transparent)]
    ReferenceData(#[from] ReferenceDataError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    ValueCoverage(#[from] ValueCoverageError),

    #[error(transparent)]
    MissingYear(#[from] MissingYearError),
}

impl From<AggregateError> for PipelineError {
    fn from(err: AggregateError) -> Self {
        match err {
            AggregateError::ReferenceData(e) => PipelineError::ReferenceData(e),
            AggregateError::ValueCoverage(e) => PipelineError::ValueCoverage(e),
        }
    }
}
