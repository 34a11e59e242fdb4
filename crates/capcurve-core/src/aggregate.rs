// Per-year position aggregator.
//
// Caps a parsed board to the year's drafted picks, values each retained pick
// on the curve, and rolls the values up by canonical position.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use tracing::{info, warn};

use crate::board::{parse_board_with, ProspectEntry};
use crate::curve::ReferenceData;
use crate::error::{AggregateError, PipelineError, ReferenceDataError, ValueCoverageError};
use crate::position::{Position, PositionSynonyms};
use crate::table::RawTable;

/// How many offending picks a coverage error lists before summarizing.
pub const MAX_REPORTED_PICKS: usize = 10;

// ---------------------------------------------------------------------------
// Output records
// ---------------------------------------------------------------------------

/// Draft capital spent on one position in one year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionYearSummary {
    pub year: i32,
    pub position: Position,
    pub cumulative_value: f64,
    pub player_count: usize,
    pub avg_value_per_player: f64,
}

/// One year's aggregation: the summary rows plus how many picks fed them.
#[derive(Debug, Clone, PartialEq)]
pub struct YearSummary {
    pub year: i32,
    /// Drafted picks configured for the year.
    pub capacity: usize,
    /// Board entries that survived the cutoff and were valued.
    pub picks_counted: usize,
    /// Rows in descending `cumulative_value` order.
    pub rows: Vec<PositionYearSummary>,
}

impl YearSummary {
    /// True when the board had fewer valid rows than the year's capacity.
    pub fn is_short_board(&self) -> bool {
        self.picks_counted < self.capacity
    }

    /// Sum of `cumulative_value` over every row.
    pub fn total_value(&self) -> f64 {
        self.rows.iter().map(|r| r.cumulative_value).sum()
    }

    pub fn get(&self, position: &str) -> Option<&PositionYearSummary> {
        self.rows.iter().find(|r| r.position.as_str() == position)
    }

    pub fn into_rows(self) -> Vec<PositionYearSummary> {
        self.rows
    }
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Take the first `capacity` entries by ascending rank. Ties keep board order.
pub fn apply_cutoff(entries: &[ProspectEntry], capacity: usize) -> Vec<&ProspectEntry> {
    let mut ranked: Vec<&ProspectEntry> = entries.iter().collect();
    ranked.sort_by_key(|e| e.rank);
    ranked.truncate(capacity);
    ranked
}

/// Aggregate one year's parsed board into per-position rows.
///
/// Steps:
/// 1. Sort by rank and keep the first `capacity_of(year)` entries.
/// 2. Value each kept entry at `pick = rank`. Any unvalued pick fails the
///    whole year with a [`ValueCoverageError`]; no partial sums.
/// 3. Group by canonical position: sum, count, and average.
/// 4. Order rows by descending cumulative value, ties in first-seen order.
pub fn summarize_year<R>(
    year: i32,
    entries: &[ProspectEntry],
    refs: &R,
) -> Result<YearSummary, AggregateError>
where
    R: ReferenceData + ?Sized,
{
    let capacity = refs.capacity_of(year)?;
    let kept = apply_cutoff(entries, capacity);

    // ---- value the kept picks ----
    let mut valued: Vec<(&ProspectEntry, f64)> = Vec::with_capacity(kept.len());
    let mut missing: BTreeSet<u32> = BTreeSet::new();
    for &entry in &kept {
        match refs.value_of(entry.rank) {
            Ok(value) => valued.push((entry, value)),
            Err(ReferenceDataError::MissingPick { pick }) => {
                missing.insert(pick);
            }
            Err(other) => return Err(other.into()),
        }
    }
    if !missing.is_empty() {
        let additional = missing.len().saturating_sub(MAX_REPORTED_PICKS);
        let picks = missing.into_iter().take(MAX_REPORTED_PICKS).collect();
        return Err(ValueCoverageError {
            year,
            picks,
            additional,
        }
        .into());
    }

    // ---- group by position, first-seen order ----
    let mut rows: Vec<PositionYearSummary> = Vec::new();
    let mut slot: HashMap<&Position, usize> = HashMap::new();
    for (entry, value) in &valued {
        let idx = *slot.entry(&entry.position).or_insert_with(|| {
            rows.push(PositionYearSummary {
                year,
                position: entry.position.clone(),
                cumulative_value: 0.0,
                player_count: 0,
                avg_value_per_player: 0.0,
            });
            rows.len() - 1
        });
        rows[idx].cumulative_value += value;
        rows[idx].player_count += 1;
    }
    for row in &mut rows {
        row.avg_value_per_player = row.cumulative_value / row.player_count as f64;
    }

    // Stable, so equal totals keep first-seen order.
    rows.sort_by(|a, b| {
        b.cumulative_value
            .partial_cmp(&a.cumulative_value)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let summary = YearSummary {
        year,
        capacity,
        picks_counted: valued.len(),
        rows,
    };

    if summary.is_short_board() {
        warn!(
            year,
            picks_counted = summary.picks_counted,
            capacity,
            "board has fewer valid rows than drafted picks; aggregating what is there"
        );
    }
    info!(
        year,
        positions = summary.rows.len(),
        picks = summary.picks_counted,
        "position summary computed"
    );

    Ok(summary)
}

/// Parse a raw board and aggregate it in one step.
pub fn summarize_board<R>(
    year: i32,
    board: &RawTable,
    synonyms: &PositionSynonyms,
    refs: &R,
) -> Result<YearSummary, PipelineError>
where
    R: ReferenceData + ?Sized,
{
    let entries = parse_board_with(year, board, synonyms)?;
    Ok(summarize_year(year, &entries, refs)?)
}
