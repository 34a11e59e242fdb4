// Run report: JSON record of a scoring run plus the console summary printed
// to stdout.

use capcurve_core::{PositionScore, ScoreTable, StrengthTier, YearSummary};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::Path;

/// One line of the top/bottom views.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreLine {
    pub position: String,
    pub y_new: f64,
    pub hist_mean: Option<f64>,
    pub z_score: f64,
    pub tier: String,
}

impl From<&PositionScore> for ScoreLine {
    fn from(score: &PositionScore) -> Self {
        ScoreLine {
            position: score.position.to_string(),
            y_new: score.y_new,
            hist_mean: score.hist_mean,
            z_score: score.z_score,
            tier: score.tier.label().to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TierCounts {
    pub strong: usize,
    pub neutral: usize,
    pub weak: usize,
}

/// A year whose board ran out before its drafted-pick capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ShortBoard {
    pub year: i32,
    pub picks_counted: usize,
    pub capacity: usize,
}

impl From<&YearSummary> for ShortBoard {
    fn from(summary: &YearSummary) -> Self {
        ShortBoard {
            year: summary.year,
            picks_counted: summary.picks_counted,
            capacity: summary.capacity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub generated_at: DateTime<Utc>,
    pub class_year: i32,
    pub history_start: i32,
    pub history_end: i32,
    pub positions_scored: usize,
    pub tiers: TierCounts,
    pub top: Vec<ScoreLine>,
    pub bottom: Vec<ScoreLine>,
    pub short_boards: Vec<ShortBoard>,
}

impl RunReport {
    pub fn new(
        class_year: i32,
        history: (i32, i32),
        scores: &ScoreTable,
        top_n: usize,
        short_boards: Vec<ShortBoard>,
    ) -> Self {
        RunReport {
            generated_at: Utc::now(),
            class_year,
            history_start: history.0,
            history_end: history.1,
            positions_scored: scores.len(),
            tiers: TierCounts {
                strong: scores.count_tier(StrengthTier::Strong),
                neutral: scores.count_tier(StrengthTier::Neutral),
                weak: scores.count_tier(StrengthTier::Weak),
            },
            top: scores.top(top_n).iter().map(ScoreLine::from).collect(),
            bottom: scores.bottom(top_n).iter().map(ScoreLine::from).collect(),
            short_boards,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn write_json(&self, path: &Path) -> anyhow::Result<()> {
        use anyhow::Context;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let json = self.to_json().context("failed to serialize run report")?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }

    /// Plain-text summary for stdout.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{} class vs {}-{} history ({} positions: {} strong, {} neutral, {} weak)",
            self.class_year,
            self.history_start,
            self.history_end,
            self.positions_scored,
            self.tiers.strong,
            self.tiers.neutral,
            self.tiers.weak,
        );
        render_section(&mut out, "Strongest", &self.top);
        render_section(&mut out, "Weakest", &self.bottom);
        for short in &self.short_boards {
            let _ = writeln!(
                out,
                "note: {} board covered {} of {} picks",
                short.year, short.picks_counted, short.capacity
            );
        }
        out
    }
}

fn render_section(out: &mut String, title: &str, lines: &[ScoreLine]) {
    let _ = writeln!(out, "\n{title}:");
    let _ = writeln!(
        out,
        "  {:<6} {:>10} {:>10} {:>7}  tier",
        "pos", "class", "hist_mean", "z"
    );
    for line in lines {
        let mean = line
            .hist_mean
            .map(|m| format!("{m:.1}"))
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(
            out,
            "  {:<6} {:>10.1} {:>10} {:>+7.2}  {}",
            line.position, line.y_new, mean, line.z_score, line.tier
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use capcurve_core::{score_class, HistoricalTable, Position, PositionYearSummary, ScoringRules};

    fn row(year: i32, pos: &str, value: f64) -> PositionYearSummary {
        PositionYearSummary {
            year,
            position: Position::from_canonical(pos),
            cumulative_value: value,
            player_count: 1,
            avg_value_per_player: value,
        }
    }

    fn scores() -> ScoreTable {
        let history = HistoricalTable::from_rows(vec![
            row(2016, "QB", 100.0),
            row(2016, "WR", 100.0),
            row(2016, "RB", 50.0),
            row(2017, "QB", 200.0),
            row(2017, "WR", 120.0),
            row(2017, "RB", 70.0),
        ]);
        let class = vec![row(2026, "QB", 300.0), row(2026, "WR", 110.0), row(2026, "RB", 0.0)];
        score_class(&history, &class, &ScoringRules::default())
    }

    #[test]
    fn report_counts_tiers_and_slices_views() {
        let report = RunReport::new(2026, (2016, 2017), &scores(), 1, Vec::new());
        assert_eq!(report.positions_scored, 3);
        assert_eq!(
            report.tiers,
            TierCounts {
                strong: 1,
                neutral: 1,
                weak: 1
            }
        );
        assert_eq!(report.top.len(), 1);
        assert_eq!(report.top[0].position, "QB");
        assert_eq!(report.bottom[0].position, "RB");
        assert_eq!(report.bottom[0].tier, "weak");
    }

    #[test]
    fn json_contains_views_and_timestamp() {
        let short = vec![ShortBoard {
            year: 2017,
            picks_counted: 250,
            capacity: 253,
        }];
        let report = RunReport::new(2026, (2016, 2017), &scores(), 2, short);
        let json = report.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["class_year"], 2026);
        assert_eq!(value["top"].as_array().unwrap().len(), 2);
        assert_eq!(value["short_boards"][0]["capacity"], 253);
        assert!(value["generated_at"].is_string());
    }

    #[test]
    fn render_lists_sections_and_notes() {
        let short = vec![ShortBoard {
            year: 2017,
            picks_counted: 250,
            capacity: 253,
        }];
        let text = RunReport::new(2026, (2016, 2017), &scores(), 3, short).render();
        assert!(text.starts_with("2026 class vs 2016-2017 history (3 positions"));
        assert!(text.contains("Strongest:"));
        assert!(text.contains("Weakest:"));
        assert!(text.contains("note: 2017 board covered 250 of 253 picks"));
    }
}
