// Board normalizer: turns one year's raw prospect board into typed entries.
//
// Rows whose rank does not parse are footers or legend rows and are dropped
// silently. Missing required columns is a schema error for that year.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SchemaError;
use crate::position::{Position, PositionSynonyms};
use crate::table::{cell, RawTable};

/// Columns every board must carry after header normalization.
pub const REQUIRED_COLUMNS: [&str; 4] = ["rank", "player_name", "position", "college"];

/// One ranked prospect from a board. `position` is derived from
/// `raw_position` once and never changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProspectEntry {
    pub rank: u32,
    pub player_name: String,
    pub raw_position: String,
    pub position: Position,
    pub college: String,
}

/// Coerce a rank cell. Any finite number >= 1 is kept, truncated toward zero
/// (`"12.5"` ranks as 12); non-numeric and sub-1 cells give `None`.
pub fn parse_rank(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    if let Ok(n) = raw.parse::<u32>() {
        return (n > 0).then_some(n);
    }
    let f: f64 = raw.parse().ok()?;
    if f.is_finite() && (1.0..=u32::MAX as f64).contains(&f) {
        Some(f.trunc() as u32)
    } else {
        None
    }
}

/// Parse a board with the built-in synonym table.
pub fn parse_board(year: i32, table: &RawTable) -> Result<Vec<ProspectEntry>, SchemaError> {
    parse_board_with(year, table, &PositionSynonyms::builtin())
}

/// Parse a board, canonicalizing positions with `synonyms`.
///
/// Output preserves the board's row order; sorting by rank happens in the
/// aggregator.
pub fn parse_board_with(
    year: i32,
    table: &RawTable,
    synonyms: &PositionSynonyms,
) -> Result<Vec<ProspectEntry>, SchemaError> {
    let idx = table
        .require_columns(&REQUIRED_COLUMNS)
        .map_err(|missing| SchemaError {
            year,
            missing,
            found: table.normalized_columns(),
        })?;
    let (rank_idx, name_idx, pos_idx, college_idx) = (idx[0], idx[1], idx[2], idx[3]);

    let mut entries = Vec::with_capacity(table.len());
    let mut bad_rank = 0usize;
    let mut unnamed = 0usize;

    for record in &table.records {
        let Some(rank) = parse_rank(cell(record, rank_idx)) else {
            bad_rank += 1;
            continue;
        };
        let player_name = cell(record, name_idx).trim();
        if player_name.is_empty() {
            unnamed += 1;
            continue;
        }
        let raw_position = cell(record, pos_idx).trim();
        entries.push(ProspectEntry {
            rank,
            player_name: player_name.to_string(),
            raw_position: raw_position.to_string(),
            position: synonyms.canonicalize(raw_position),
            college: cell(record, college_idx).trim().to_string(),
        });
    }

    if bad_rank > 0 || unnamed > 0 {
        debug!(
            year,
            bad_rank, unnamed, "dropped board rows without a usable rank or name"
        );
    }
    debug!(year, kept = entries.len(), "board parsed");

    Ok(entries)
}
