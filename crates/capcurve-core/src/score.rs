// Baseline scorer: per-position historical distribution and the new class's
// standardized deviation from it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

use crate::aggregate::PositionYearSummary;
use crate::history::HistoricalTable;
use crate::position::{ExclusionSet, Position};

/// Threshold below which a standard deviation is treated as zero.
const STDEV_EPSILON: f64 = 1e-9;

// ---------------------------------------------------------------------------
// Baselines
// ---------------------------------------------------------------------------

/// Historical distribution of one position's cumulative value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionBaseline {
    pub position: Position,
    pub hist_mean: f64,
    /// Sample standard deviation; `None` with fewer than two years or no
    /// spread.
    pub hist_std: Option<f64>,
    pub hist_min: f64,
    pub hist_max: f64,
    pub n_years: usize,
}

/// Sample (N-1) standard deviation. `None` for fewer than two values or when
/// every value is identical.
pub fn sample_stdev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let first = values[0];
    if values.iter().all(|&v| v == first) {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let stdev = variance.sqrt();
    (stdev >= STDEV_EPSILON).then_some(stdev)
}

/// Group the table by position and summarize each group. Output is in
/// position-code order. Exclusions must already be applied.
pub fn compute_baselines(history: &HistoricalTable) -> Vec<PositionBaseline> {
    let mut groups: BTreeMap<&Position, Vec<f64>> = BTreeMap::new();
    for row in history.rows() {
        groups
            .entry(&row.position)
            .or_default()
            .push(row.cumulative_value);
    }

    groups
        .into_iter()
        .map(|(position, values)| {
            let n = values.len();
            let hist_mean = values.iter().sum::<f64>() / n as f64;
            let hist_min = values.iter().copied().fold(f64::INFINITY, f64::min);
            let hist_max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            PositionBaseline {
                position: position.clone(),
                hist_mean,
                hist_std: sample_stdev(&values),
                hist_min,
                hist_max,
                n_years: n,
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Z-scores
// ---------------------------------------------------------------------------

/// `(value - mean) / stdev`, or 0.0 when the deviation is undefined or
/// approximately zero. Degenerate variance means "no signal".
pub fn compute_zscore(value: f64, mean: f64, stdev: Option<f64>) -> f64 {
    match stdev {
        Some(sd) if sd >= STDEV_EPSILON => (value - mean) / sd,
        _ => 0.0,
    }
}

/// Cutoffs that classify a z-score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierThresholds {
    pub strong: f64,
    pub weak: f64,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            strong: 0.75,
            weak: -0.75,
        }
    }
}

/// How a position's class value compares with its history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrengthTier {
    /// At or above the strong cutoff.
    Strong,
    Neutral,
    /// At or below the weak cutoff.
    Weak,
}

impl StrengthTier {
    pub fn from_zscore(z: f64, thresholds: &TierThresholds) -> Self {
        if z >= thresholds.strong {
            StrengthTier::Strong
        } else if z <= thresholds.weak {
            StrengthTier::Weak
        } else {
            StrengthTier::Neutral
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StrengthTier::Strong => "strong",
            StrengthTier::Neutral => "neutral",
            StrengthTier::Weak => "weak",
        }
    }
}

/// One row of the score table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionScore {
    pub position: Position,
    /// Class cumulative value; 0 when the position was not drafted at all.
    pub y_new: f64,
    /// `None` when the position never appeared historically.
    pub hist_mean: Option<f64>,
    pub hist_std: Option<f64>,
    pub hist_min: Option<f64>,
    pub hist_max: Option<f64>,
    pub n_years: usize,
    pub z_score: f64,
    /// `y_new - hist_mean`, with a missing mean read as 0.
    pub delta_vs_mean: f64,
    pub tier: StrengthTier,
}

/// Scores ordered by descending z-score.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreTable {
    rows: Vec<PositionScore>,
}

impl ScoreTable {
    pub fn rows(&self) -> &[PositionScore] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<PositionScore> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, position: &str) -> Option<&PositionScore> {
        self.rows.iter().find(|r| r.position.as_str() == position)
    }

    /// The `n` strongest positions.
    pub fn top(&self, n: usize) -> &[PositionScore] {
        &self.rows[..n.min(self.rows.len())]
    }

    /// The `n` weakest positions, still in descending z order.
    pub fn bottom(&self, n: usize) -> &[PositionScore] {
        &self.rows[self.rows.len().saturating_sub(n)..]
    }

    pub fn count_tier(&self, tier: StrengthTier) -> usize {
        self.rows.iter().filter(|r| r.tier == tier).count()
    }
}

/// Rules applied uniformly to history and class before scoring.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoringRules {
    pub exclude: ExclusionSet,
    pub tiers: TierThresholds,
}

/// Score a class's per-position rows against precomputed baselines.
///
/// Rows are the outer union of baseline and class positions, each exactly
/// once. Class rows sharing a position are summed.
pub fn score_against_baselines(
    baselines: &[PositionBaseline],
    new_class: &[PositionYearSummary],
    tiers: &TierThresholds,
) -> ScoreTable {
    let mut union: BTreeMap<&Position, (Option<&PositionBaseline>, f64)> = BTreeMap::new();
    for baseline in baselines {
        union.entry(&baseline.position).or_insert((None, 0.0)).0 = Some(baseline);
    }
    for row in new_class {
        union.entry(&row.position).or_insert((None, 0.0)).1 += row.cumulative_value;
    }

    let mut rows: Vec<PositionScore> = union
        .into_iter()
        .map(|(position, (baseline, y_new))| {
            let (hist_mean, hist_std, hist_min, hist_max, n_years) = match baseline {
                Some(b) => (
                    Some(b.hist_mean),
                    b.hist_std,
                    Some(b.hist_min),
                    Some(b.hist_max),
                    b.n_years,
                ),
                None => (None, None, None, None, 0),
            };
            let mean = hist_mean.unwrap_or(0.0);
            let z_score = compute_zscore(y_new, mean, hist_std);
            PositionScore {
                position: position.clone(),
                y_new,
                hist_mean,
                hist_std,
                hist_min,
                hist_max,
                n_years,
                z_score,
                delta_vs_mean: y_new - mean,
                tier: StrengthTier::from_zscore(z_score, tiers),
            }
        })
        .collect();

    // Stable sort over code order keeps ties deterministic.
    rows.sort_by(|a, b| {
        b.z_score
            .partial_cmp(&a.z_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    ScoreTable { rows }
}

/// Apply the exclusion set to both sides, build baselines from history, and
/// score the class against them.
pub fn score_class(
    history: &HistoricalTable,
    new_class: &[PositionYearSummary],
    rules: &ScoringRules,
) -> ScoreTable {
    let history = history.excluding(&rules.exclude);
    let baselines = compute_baselines(&history);
    let class: Vec<PositionYearSummary> = new_class
        .iter()
        .filter(|r| !rules.exclude.contains(&r.position))
        .cloned()
        .collect();

    let table = score_against_baselines(&baselines, &class, &rules.tiers);
    info!(
        baselines = baselines.len(),
        class_positions = class.len(),
        scored = table.len(),
        "class scored against history"
    );
    table
}
