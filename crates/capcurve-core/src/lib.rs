// Positional draft-capital pipeline.
//
// raw board -> normalized board -> per-year summary -> historical table ->
// baselines -> class z-scores. Every stage is synchronous and side-effect
// free; storage lives in the caller.

pub mod aggregate;
pub mod board;
pub mod curve;
pub mod error;
pub mod history;
pub mod position;
pub mod score;
pub mod table;

pub use aggregate::{summarize_board, summarize_year, PositionYearSummary, YearSummary};
pub use board::{parse_board, parse_board_with, ProspectEntry};
pub use curve::{CapacityTable, PickValue, ReferenceData, ReferenceTables, ValueCurve, YearCapacity};
pub use error::{
    AggregateError, MissingYearError, PipelineError, ReferenceDataError, SchemaError,
    ValueCoverageError,
};
pub use history::{combine, HistoricalTable, SummarySource};
pub use position::{normalize_position, ExclusionSet, Position, PositionSynonyms};
pub use score::{
    compute_baselines, score_class, PositionBaseline, PositionScore, ScoreTable, ScoringRules,
    StrengthTier, TierThresholds,
};
pub use table::RawTable;
