// CSV readers and writers for the tabular boundary: raw boards, reference
// tables, per-year summaries, the historical table, and the score table.

use capcurve_core::{
    CapacityTable, HistoricalTable, Position, PositionYearSummary, RawTable, ReferenceDataError,
    ReferenceTables, ScoreTable, ValueCurve,
};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::path::Path;
use tracing::debug;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("invalid reference table {path}: {source}")]
    Reference {
        path: String,
        source: ReferenceDataError,
    },

    #[error("invalid row {row} in {path}: {message}")]
    InvalidRow {
        path: String,
        row: usize,
        message: String,
    },
}

// ---------------------------------------------------------------------------
// Serde row structs (private)
// ---------------------------------------------------------------------------

/// Per-year summary row. No year column; the file name carries it.
#[derive(Debug, Serialize, Deserialize)]
struct SummaryRecord {
    #[serde(alias = "Position")]
    position: String,
    cumulative_value: f64,
    player_count: usize,
    avg_value_per_player: f64,
}

/// Historical table row.
#[derive(Debug, Serialize, Deserialize)]
struct HistoryRecord {
    year: i32,
    #[serde(alias = "Position")]
    position: String,
    cumulative_value: f64,
    player_count: usize,
    avg_value_per_player: f64,
}

/// Score table row. Undefined statistics serialize as empty cells.
#[derive(Debug, Serialize)]
struct ScoreRecord<'a> {
    position: &'a str,
    y_new: f64,
    hist_mean: Option<f64>,
    hist_std: Option<f64>,
    hist_min: Option<f64>,
    hist_max: Option<f64>,
    n_years: usize,
    z_score: f64,
    delta_vs_mean: f64,
    tier: &'static str,
}

fn summary_from_record(year: i32, raw: SummaryRecord) -> PositionYearSummary {
    PositionYearSummary {
        year,
        position: Position::from_canonical(raw.position.trim()),
        cumulative_value: raw.cumulative_value,
        player_count: raw.player_count,
        avg_value_per_player: raw.avg_value_per_player,
    }
}

// ---------------------------------------------------------------------------
// Raw tables
// ---------------------------------------------------------------------------

/// Choose between comma and tab from the header line: whichever occurs more,
/// comma on a tie. Boards are sometimes tab-separated files named `.csv`.
pub fn sniff_delimiter(header_line: &str) -> u8 {
    let commas = header_line.matches(',').count();
    let tabs = header_line.matches('\t').count();
    if tabs > commas {
        b'\t'
    } else {
        b','
    }
}

fn read_table_from_reader<R: Read>(rdr: R, delimiter: u8) -> Result<RawTable, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(rdr);
    let columns = reader.headers()?.iter().map(str::to_string).collect();
    let mut records = Vec::new();
    for result in reader.records() {
        let record = result?;
        records.push(record.iter().map(str::to_string).collect());
    }
    Ok(RawTable::new(columns, records))
}

/// Parse delimited text into a raw table, sniffing the delimiter.
pub fn parse_table(text: &str) -> Result<RawTable, csv::Error> {
    let text = text.trim_start_matches('\u{feff}');
    let header = text.lines().next().unwrap_or("");
    read_table_from_reader(text.as_bytes(), sniff_delimiter(header))
}

/// Read any delimited file into a raw table.
pub fn read_table(path: &Path) -> Result<RawTable, TableError> {
    let text = std::fs::read_to_string(path).map_err(|e| TableError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    let table = parse_table(&text).map_err(|e| TableError::Csv {
        path: path.display().to_string(),
        source: e,
    })?;
    debug!(path = %path.display(), rows = table.len(), "table read");
    Ok(table)
}

/// Load the value curve and capacity table.
pub fn load_reference_tables(
    values_path: &Path,
    capacity_path: &Path,
) -> Result<ReferenceTables, TableError> {
    let curve = ValueCurve::from_table(&read_table(values_path)?).map_err(|e| {
        TableError::Reference {
            path: values_path.display().to_string(),
            source: e,
        }
    })?;
    let capacity = CapacityTable::from_table(&read_table(capacity_path)?).map_err(|e| {
        TableError::Reference {
            path: capacity_path.display().to_string(),
            source: e,
        }
    })?;
    Ok(ReferenceTables::new(curve, capacity))
}

// ---------------------------------------------------------------------------
// Summaries
// ---------------------------------------------------------------------------

/// Reject summary values no aggregation could have produced.
fn check_values(
    path: &str,
    row: usize,
    cumulative_value: f64,
    avg_value_per_player: f64,
) -> Result<(), TableError> {
    for (field, value) in [
        ("cumulative_value", cumulative_value),
        ("avg_value_per_player", avg_value_per_player),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(TableError::InvalidRow {
                path: path.to_string(),
                row,
                message: format!("{field} must be finite and non-negative, got {value}"),
            });
        }
    }
    Ok(())
}

fn csv_error(path: &str, source: csv::Error) -> TableError {
    TableError::Csv {
        path: path.to_string(),
        source,
    }
}

/// `path` only labels errors. Rows are numbered from 1, header excluded.
fn read_year_summary_from_reader<R: Read>(
    rdr: R,
    year: i32,
    path: &str,
) -> Result<Vec<PositionYearSummary>, TableError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(rdr);
    let mut rows = Vec::new();
    for (i, result) in reader.deserialize::<SummaryRecord>().enumerate() {
        let raw = result.map_err(|e| csv_error(path, e))?;
        check_values(path, i + 1, raw.cumulative_value, raw.avg_value_per_player)?;
        rows.push(summary_from_record(year, raw));
    }
    Ok(rows)
}

fn read_history_from_reader<R: Read>(rdr: R, path: &str) -> Result<HistoricalTable, TableError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(rdr);
    let mut rows = Vec::new();
    for (i, result) in reader.deserialize::<HistoryRecord>().enumerate() {
        let raw = result.map_err(|e| csv_error(path, e))?;
        check_values(path, i + 1, raw.cumulative_value, raw.avg_value_per_player)?;
        rows.push(PositionYearSummary {
            year: raw.year,
            position: Position::from_canonical(raw.position.trim()),
            cumulative_value: raw.cumulative_value,
            player_count: raw.player_count,
            avg_value_per_player: raw.avg_value_per_player,
        });
    }
    Ok(HistoricalTable::from_rows(rows))
}

fn open(path: &Path) -> Result<std::fs::File, TableError> {
    std::fs::File::open(path).map_err(|e| TableError::Io {
        path: path.display().to_string(),
        source: e,
    })
}

/// Read a per-year summary file written by [`write_year_summary`].
pub fn read_year_summary(path: &Path, year: i32) -> Result<Vec<PositionYearSummary>, TableError> {
    read_year_summary_from_reader(open(path)?, year, &path.display().to_string())
}

/// Read a combined historical file written by [`write_history`].
pub fn read_history(path: &Path) -> Result<HistoricalTable, TableError> {
    read_history_from_reader(open(path)?, &path.display().to_string())
}

// ---------------------------------------------------------------------------
// Writers
// ---------------------------------------------------------------------------

fn write_year_summary_to<W: Write>(w: W, rows: &[PositionYearSummary]) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(w);
    for row in rows {
        writer.serialize(SummaryRecord {
            position: row.position.to_string(),
            cumulative_value: row.cumulative_value,
            player_count: row.player_count,
            avg_value_per_player: row.avg_value_per_player,
        })?;
    }
    writer.flush()?;
    Ok(())
}

fn write_history_to<W: Write>(w: W, history: &HistoricalTable) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(w);
    for row in history.rows() {
        writer.serialize(HistoryRecord {
            year: row.year,
            position: row.position.to_string(),
            cumulative_value: row.cumulative_value,
            player_count: row.player_count,
            avg_value_per_player: row.avg_value_per_player,
        })?;
    }
    writer.flush()?;
    Ok(())
}

fn write_scores_to<W: Write>(w: W, scores: &ScoreTable) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(w);
    for row in scores.rows() {
        writer.serialize(ScoreRecord {
            position: row.position.as_str(),
            y_new: row.y_new,
            hist_mean: row.hist_mean,
            hist_std: row.hist_std,
            hist_min: row.hist_min,
            hist_max: row.hist_max,
            n_years: row.n_years,
            z_score: row.z_score,
            delta_vs_mean: row.delta_vs_mean,
            tier: row.tier.label(),
        })?;
    }
    writer.flush()?;
    Ok(())
}

/// Create the parent directory and open `path` for writing.
fn create(path: &Path) -> Result<std::fs::File, TableError> {
    let io_err = |e| TableError::Io {
        path: path.display().to_string(),
        source: e,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    std::fs::File::create(path).map_err(io_err)
}

pub fn write_year_summary(path: &Path, rows: &[PositionYearSummary]) -> Result<(), TableError> {
    write_year_summary_to(create(path)?, rows).map_err(|e| TableError::Csv {
        path: path.display().to_string(),
        source: e,
    })
}

pub fn write_history(path: &Path, history: &HistoricalTable) -> Result<(), TableError> {
    write_history_to(create(path)?, history).map_err(|e| TableError::Csv {
        path: path.display().to_string(),
        source: e,
    })
}

pub fn write_scores(path: &Path, scores: &ScoreTable) -> Result<(), TableError> {
    write_scores_to(create(path)?, scores).map_err(|e| TableError::Csv {
        path: path.display().to_string(),
        source: e,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
