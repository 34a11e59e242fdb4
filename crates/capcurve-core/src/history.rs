// Cross-year combiner: concatenates per-year summaries over a closed year
// range into one historical table.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::ops::RangeInclusive;
use tracing::info;

use crate::aggregate::{PositionYearSummary, YearSummary};
use crate::error::MissingYearError;
use crate::position::{ExclusionSet, Position};

// ---------------------------------------------------------------------------
// Summary source seam
// ---------------------------------------------------------------------------

/// Where the combiner fetches each year's rows from. `None` means the year
/// has no summary available.
pub trait SummarySource {
    fn year_rows(&self, year: i32) -> Option<Vec<PositionYearSummary>>;
}

impl SummarySource for BTreeMap<i32, Vec<PositionYearSummary>> {
    fn year_rows(&self, year: i32) -> Option<Vec<PositionYearSummary>> {
        self.get(&year).cloned()
    }
}

impl SummarySource for HashMap<i32, Vec<PositionYearSummary>> {
    fn year_rows(&self, year: i32) -> Option<Vec<PositionYearSummary>> {
        self.get(&year).cloned()
    }
}

impl SummarySource for BTreeMap<i32, YearSummary> {
    fn year_rows(&self, year: i32) -> Option<Vec<PositionYearSummary>> {
        self.get(&year).map(|s| s.rows.clone())
    }
}

// ---------------------------------------------------------------------------
// Historical table
// ---------------------------------------------------------------------------

/// Per-year summary rows across a year range, ascending by year and, within
/// a year, in that year's descending-value order. Read-only once built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoricalTable {
    rows: Vec<PositionYearSummary>,
}

impl HistoricalTable {
    /// Wrap rows that are already in table order (e.g. read back from a
    /// combined file).
    pub fn from_rows(rows: Vec<PositionYearSummary>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[PositionYearSummary] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<PositionYearSummary> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct years present, ascending.
    pub fn years(&self) -> Vec<i32> {
        self.rows
            .iter()
            .map(|r| r.year)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Distinct positions present, in code order.
    pub fn positions(&self) -> Vec<&Position> {
        self.rows
            .iter()
            .map(|r| &r.position)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// `(year, cumulative_value)` pairs for one position, in table order.
    pub fn values_for(&self, position: &str) -> Vec<(i32, f64)> {
        self.rows
            .iter()
            .filter(|r| r.position.as_str() == position)
            .map(|r| (r.year, r.cumulative_value))
            .collect()
    }

    /// A copy without the excluded positions.
    pub fn excluding(&self, exclude: &ExclusionSet) -> HistoricalTable {
        HistoricalTable {
            rows: self
                .rows
                .iter()
                .filter(|r| !exclude.contains(&r.position))
                .cloned()
                .collect(),
        }
    }
}

/// Concatenate every year in `years` from `source`. Each row is tagged with
/// the year it was fetched for. Any absent year fails the whole combine.
pub fn combine<S>(
    years: RangeInclusive<i32>,
    source: &S,
) -> Result<HistoricalTable, MissingYearError>
where
    S: SummarySource + ?Sized,
{
    let (start, end) = (*years.start(), *years.end());
    let mut rows = Vec::new();
    for year in years {
        let year_rows = source.year_rows(year).ok_or(MissingYearError { year })?;
        rows.extend(year_rows.into_iter().map(|mut row| {
            row.year = year;
            row
        }));
    }
    info!(start, end, rows = rows.len(), "historical table combined");
    Ok(HistoricalTable { rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(year: i32, pos: &str, value: f64, count: usize) -> PositionYearSummary {
        PositionYearSummary {
            year,
            position: Position::from_canonical(pos),
            cumulative_value: value,
            player_count: count,
            avg_value_per_player: value / count as f64,
        }
    }

    fn source() -> BTreeMap<i32, Vec<PositionYearSummary>> {
        let mut m = BTreeMap::new();
        m.insert(2016, vec![row(2016, "QB", 200.0, 2), row(2016, "K", 5.0, 1)]);
        m.insert(2017, vec![row(2017, "WR", 150.0, 3), row(2017, "QB", 120.0, 1)]);
        m.insert(2018, vec![row(2018, "QB", 180.0, 2)]);
        m
    }

    #[test]
    fn combine_orders_by_year_then_year_order() {
        let table = combine(2016..=2018, &source()).unwrap();
        let keys: Vec<(i32, &str)> = table
            .rows()
            .iter()
            .map(|r| (r.year, r.position.as_str()))
            .collect();
        assert_eq!(
            keys,
            vec![(2016, "QB"), (2016, "K"), (2017, "WR"), (2017, "QB"), (2018, "QB")]
        );
        assert_eq!(table.years(), vec![2016, 2017, 2018]);
    }

    #[test]
    fn combine_fails_on_missing_year() {
        let err = combine(2015..=2018, &source()).unwrap_err();
        assert_eq!(err, MissingYearError { year: 2015 });
        let err = combine(2016..=2019, &source()).unwrap_err();
        assert_eq!(err.year, 2019);
    }

    #[test]
    fn combine_tags_rows_with_fetched_year() {
        let mut m = BTreeMap::new();
        m.insert(2020, vec![row(0, "QB", 1.0, 1)]);
        let table = combine(2020..=2020, &m).unwrap();
        assert_eq!(table.rows()[0].year, 2020);
    }

    #[test]
    fn combine_subrange_only_fetches_requested_years() {
        let table = combine(2017..=2017, &source()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.years(), vec![2017]);
    }

    #[test]
    fn values_for_and_positions() {
        let table = combine(2016..=2018, &source()).unwrap();
        assert_eq!(
            table.values_for("QB"),
            vec![(2016, 200.0), (2017, 120.0), (2018, 180.0)]
        );
        let positions: Vec<&str> = table.positions().iter().map(|p| p.as_str()).collect();
        assert_eq!(positions, vec!["K", "QB", "WR"]);
    }

    #[test]
    fn excluding_drops_specialists() {
        let table = combine(2016..=2018, &source()).unwrap();
        let filtered = table.excluding(&ExclusionSet::default());
        assert_eq!(filtered.len(), 4);
        assert!(filtered.values_for("K").is_empty());
        assert_eq!(table.len(), 5);
    }

    #[test]
    fn year_summary_map_is_a_source() {
        let mut m = BTreeMap::new();
        m.insert(
            2021,
            YearSummary {
                year: 2021,
                capacity: 3,
                picks_counted: 3,
                rows: vec![row(2021, "CB", 30.0, 3)],
            },
        );
        let table = combine(2021..=2021, &m).unwrap();
        assert_eq!(table.values_for("CB"), vec![(2021, 30.0)]);
    }
}
