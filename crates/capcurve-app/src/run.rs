// Run orchestration: drives the core pipeline over the configured files.
//
// run = summarize every historical year and the class year, combine the
// historical window, score the class, write the report. Each stage can also
// run on its own from previously written summaries.

use anyhow::Context;
use capcurve_core::{
    combine, score_class, summarize_board, HistoricalTable, PositionYearSummary, ReferenceTables,
    ScoreTable, YearSummary,
};
use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::config::Config;
use crate::report::{RunReport, ShortBoard};
use crate::tables;

/// Everything a full run produced.
#[derive(Debug)]
pub struct RunOutcome {
    pub summaries: Vec<YearSummary>,
    pub history: HistoricalTable,
    pub scores: ScoreTable,
    pub report: RunReport,
}

pub fn load_references(config: &Config) -> anyhow::Result<ReferenceTables> {
    let refs = tables::load_reference_tables(&config.values_path(), &config.capacity_path())
        .context("failed to load reference tables")?;
    info!(
        picks = refs.curve.len(),
        years = refs.capacity.len(),
        "reference tables loaded"
    );
    Ok(refs)
}

/// Aggregate one year's raw board and write its summary file.
pub fn summarize(
    config: &Config,
    refs: &ReferenceTables,
    year: i32,
) -> anyhow::Result<YearSummary> {
    let board_path = config.board_path(year);
    let table = tables::read_table(&board_path)
        .with_context(|| format!("failed to read board for {year}"))?;
    let summary = summarize_board(year, &table, &config.synonyms, refs)
        .with_context(|| format!("failed to summarize {year}"))?;

    let out = config.year_summary_path(year);
    tables::write_year_summary(&out, &summary.rows)
        .with_context(|| format!("failed to write summary for {year}"))?;
    info!(year, path = %out.display(), "year summary written");
    Ok(summary)
}

/// Read every summary file present in the window. Absent years are left out
/// so the combiner reports the first one.
fn read_window_summaries(
    config: &Config,
) -> anyhow::Result<BTreeMap<i32, Vec<PositionYearSummary>>> {
    let mut found = BTreeMap::new();
    for year in config.history.years() {
        let path = config.year_summary_path(year);
        if !path.exists() {
            warn!(year, path = %path.display(), "no summary file for year");
            continue;
        }
        let rows = tables::read_year_summary(&path, year)
            .with_context(|| format!("failed to read summary for {year}"))?;
        found.insert(year, rows);
    }
    Ok(found)
}

/// Combine the historical window from written summaries and write the
/// combined file.
pub fn combine_history(config: &Config) -> anyhow::Result<HistoricalTable> {
    let source = read_window_summaries(config)?;
    let history = combine(config.history.years(), &source).with_context(|| {
        format!(
            "failed to combine {}-{}",
            config.history.start_year, config.history.end_year
        )
    })?;

    let out = config.history_path();
    tables::write_history(&out, &history).context("failed to write historical table")?;
    info!(path = %out.display(), rows = history.len(), "historical table written");
    Ok(history)
}

/// Score the class summary against the combined history and write the score
/// table and JSON report.
pub fn score(
    config: &Config,
    history: &HistoricalTable,
    short_boards: Vec<ShortBoard>,
) -> anyhow::Result<(ScoreTable, RunReport)> {
    let class_path = config.year_summary_path(config.class_year);
    if !class_path.exists() {
        return Err(capcurve_core::MissingYearError {
            year: config.class_year,
        })
        .context("class summary not found");
    }
    let class = tables::read_year_summary(&class_path, config.class_year)
        .context("failed to read class summary")?;

    let scores = score_class(history, &class, &config.scoring_rules());
    tables::write_scores(&config.scores_path(), &scores).context("failed to write score table")?;

    let report = RunReport::new(
        config.class_year,
        (config.history.start_year, config.history.end_year),
        &scores,
        config.scoring.report_top_n,
        short_boards,
    );
    report.write_json(&config.report_path())?;
    info!(path = %config.scores_path().display(), scored = scores.len(), "scores written");
    Ok((scores, report))
}

/// Score from the combined file written by [`combine_history`].
pub fn score_from_files(config: &Config) -> anyhow::Result<(ScoreTable, RunReport)> {
    let path = config.history_path();
    let history = tables::read_history(&path).context("failed to read historical table")?;
    score(config, &history, Vec::new())
}

/// The full pipeline.
pub fn run_all(config: &Config) -> anyhow::Result<RunOutcome> {
    let refs = load_references(config)?;

    let mut summaries = Vec::new();
    for year in config.history.years().chain(std::iter::once(config.class_year)) {
        summaries.push(summarize(config, &refs, year)?);
    }
    let short_boards: Vec<ShortBoard> = summaries
        .iter()
        .filter(|s| s.is_short_board())
        .map(ShortBoard::from)
        .collect();

    let history = combine_history(config)?;
    let (scores, report) = score(config, &history, short_boards)?;

    Ok(RunOutcome {
        summaries,
        history,
        scores,
        report,
    })
}
