// Integration tests for the capcurve pipeline.
//
// Each test lays out a throwaway base directory (config, reference tables,
// raw boards) under the system temp dir and drives the run orchestration
// through the library crate's public API.

use std::fs;
use std::path::{Path, PathBuf};

use capcurve_app::config::{load_config_from, Config, CONFIG_FILE};
use capcurve_app::run;
use capcurve_app::tables;
use capcurve_core::{MissingYearError, PipelineError, StrengthTier};

// ===========================================================================
// Test helpers
// ===========================================================================

/// Fixture directory path (relative to the crate root, which is the cwd for
/// `cargo test`).
const FIXTURES: &str = "tests/fixtures";

const CONFIG: &str = r#"
[history]
start_year = 2016
end_year = 2018

[class]
year = 2019

[scoring]
exclude = ["K", "P", "LS"]
strong_z = 0.75
weak_z = -0.75
report_top_n = 3

[positions.synonyms]
DL = "DT"

[data]
raw_dir = "raw"
reference_dir = "reference"
processed_dir = "processed"
values_file = "values.csv"
capacity_file = "capacity.csv"
"#;

fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() < epsilon
}

/// Fresh base dir with config, reference tables, and every fixture board.
fn setup(name: &str) -> PathBuf {
    let base = std::env::temp_dir().join(format!("capcurve_it_{name}"));
    let _ = fs::remove_dir_all(&base);
    fs::create_dir_all(base.join("config")).unwrap();
    fs::create_dir_all(base.join("raw")).unwrap();
    fs::create_dir_all(base.join("reference")).unwrap();
    fs::write(base.join("config").join(CONFIG_FILE), CONFIG).unwrap();

    let fixtures = Path::new(FIXTURES);
    for file in ["values.csv", "capacity.csv"] {
        fs::copy(fixtures.join(file), base.join("reference").join(file)).unwrap();
    }
    for year in 2016..=2019 {
        let file = format!("{year}.csv");
        fs::copy(fixtures.join(&file), base.join("raw").join(&file)).unwrap();
    }
    base
}

fn config(base: &Path) -> Config {
    load_config_from(base).expect("test config should load")
}

// ===========================================================================
// Full run
// ===========================================================================

#[test]
fn full_run_writes_every_output() {
    let base = setup("full_run");
    let config = config(&base);

    let outcome = run::run_all(&config).unwrap();
    assert_eq!(outcome.summaries.len(), 4);
    assert!(outcome.summaries.iter().all(|s| !s.is_short_board()));

    for year in 2016..=2019 {
        assert!(config.year_summary_path(year).exists(), "missing {year}");
    }
    assert!(config.history_path().exists());
    assert!(config.scores_path().exists());
    assert!(config.report_path().exists());

    let _ = fs::remove_dir_all(&base);
}

#[test]
fn per_year_summaries_follow_cutoff_and_synonyms() {
    let base = setup("per_year");
    let config = config(&base);
    run::run_all(&config).unwrap();

    // 2016: rank 5 falls past the 4-pick cutoff.
    let y2016 = tables::read_year_summary(&config.year_summary_path(2016), 2016).unwrap();
    let keys: Vec<(&str, f64, usize)> = y2016
        .iter()
        .map(|r| (r.position.as_str(), r.cumulative_value, r.player_count))
        .collect();
    assert_eq!(keys, vec![("QB", 165.0, 2), ("WR", 80.0, 1), ("K", 50.0, 1)]);

    // 2017 is tab-separated and uses DL.
    let y2017 = tables::read_year_summary(&config.year_summary_path(2017), 2017).unwrap();
    let dt = y2017.iter().find(|r| r.position.as_str() == "DT").unwrap();
    assert!(approx_eq(dt.cumulative_value, 65.0, 1e-9));
    assert!(y2017.iter().all(|r| r.position.as_str() != "DL"));

    // 2018: TBD rank dropped, lowercase labels canonicalized, rank 6 cut.
    let y2018 = tables::read_year_summary(&config.year_summary_path(2018), 2018).unwrap();
    let positions: Vec<&str> = y2018.iter().map(|r| r.position.as_str()).collect();
    assert_eq!(positions, vec!["QB", "EDGE", "DT", "WR"]);
    let total: f64 = y2018.iter().map(|r| r.cumulative_value).sum();
    assert!(approx_eq(total, 295.0, 1e-9));

    let _ = fs::remove_dir_all(&base);
}

#[test]
fn history_spans_window_in_year_order() {
    let base = setup("history");
    let config = config(&base);
    let outcome = run::run_all(&config).unwrap();

    assert_eq!(outcome.history.years(), vec![2016, 2017, 2018]);
    assert_eq!(
        outcome.history.values_for("QB"),
        vec![(2016, 165.0), (2017, 80.0), (2018, 100.0)]
    );

    let back = tables::read_history(&config.history_path()).unwrap();
    assert_eq!(back, outcome.history);

    let _ = fs::remove_dir_all(&base);
}

#[test]
fn class_scores_against_history() {
    let base = setup("scores");
    let config = config(&base);
    let outcome = run::run_all(&config).unwrap();
    let scores = &outcome.scores;

    let order: Vec<&str> = scores.rows().iter().map(|r| r.position.as_str()).collect();
    assert_eq!(order, vec!["QB", "DT", "EDGE", "OT", "RB", "WR"]);
    assert!(scores.get("K").is_none());

    // QB history 165, 80, 100: mean 115, sample std sqrt(1975).
    let qb = scores.get("QB").unwrap();
    assert!(approx_eq(qb.y_new, 180.0, 1e-9));
    assert!(approx_eq(qb.hist_mean.unwrap(), 115.0, 1e-9));
    assert!(approx_eq(qb.z_score, 65.0 / 1975f64.sqrt(), 1e-9));
    assert_eq!(qb.tier, StrengthTier::Strong);

    // DT 65 both years: zero variance reads as no signal.
    let dt = scores.get("DT").unwrap();
    assert_eq!(dt.hist_std, None);
    assert_eq!(dt.z_score, 0.0);
    assert!(approx_eq(dt.delta_vs_mean, -65.0, 1e-9));

    // OT is new this class.
    let ot = scores.get("OT").unwrap();
    assert_eq!(ot.n_years, 0);
    assert_eq!(ot.hist_mean, None);
    assert!(approx_eq(ot.delta_vs_mean, 65.0, 1e-9));

    let wr = scores.get("WR").unwrap();
    assert_eq!(wr.tier, StrengthTier::Weak);

    assert_eq!(outcome.report.tiers.strong, 1);
    assert_eq!(outcome.report.tiers.weak, 1);
    assert_eq!(outcome.report.tiers.neutral, 4);

    let _ = fs::remove_dir_all(&base);
}

#[test]
fn report_json_matches_outcome() {
    let base = setup("report");
    let config = config(&base);
    run::run_all(&config).unwrap();

    let text = fs::read_to_string(config.report_path()).unwrap();
    let json: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(json["class_year"], 2019);
    assert_eq!(json["history_start"], 2016);
    assert_eq!(json["history_end"], 2018);
    assert_eq!(json["top"][0]["position"], "QB");
    assert_eq!(json["bottom"][2]["position"], "WR");
    assert_eq!(json["positions_scored"], 6);

    let csv_text = fs::read_to_string(config.scores_path()).unwrap();
    assert!(csv_text.starts_with("position,y_new,hist_mean,hist_std"));
    assert!(csv_text.contains("\nOT,65.0,,,,,0,0.0,65.0,neutral\n"));

    let _ = fs::remove_dir_all(&base);
}

#[test]
fn short_board_is_reported_not_fatal() {
    let base = setup("short_board");
    fs::write(
        base.join("reference").join("capacity.csv"),
        "year,total_picks\n2016,4\n2017,4\n2018,4\n2019,6\n",
    )
    .unwrap();
    let config = config(&base);

    let outcome = run::run_all(&config).unwrap();
    let class = outcome.summaries.last().unwrap();
    assert!(class.is_short_board());
    assert_eq!((class.picks_counted, class.capacity), (4, 6));
    assert_eq!(outcome.report.short_boards.len(), 1);
    assert_eq!(outcome.report.short_boards[0].year, 2019);

    let _ = fs::remove_dir_all(&base);
}

// ===========================================================================
// Stage-by-stage runs
// ===========================================================================

#[test]
fn stages_run_from_written_files() {
    let base = setup("stages");
    let config = config(&base);

    let refs = run::load_references(&config).unwrap();
    for year in 2016..=2019 {
        run::summarize(&config, &refs, year).unwrap();
    }
    let history = run::combine_history(&config).unwrap();
    assert_eq!(history.len(), 11);

    let (scores, report) = run::score_from_files(&config).unwrap();
    assert_eq!(scores.rows()[0].position.as_str(), "QB");
    assert_eq!(report.top.len(), 3);

    let _ = fs::remove_dir_all(&base);
}

// ===========================================================================
// Failures
// ===========================================================================

#[test]
fn combine_names_the_missing_year() {
    let base = setup("missing_year");
    let config = config(&base);
    let refs = run::load_references(&config).unwrap();
    run::summarize(&config, &refs, 2016).unwrap();
    run::summarize(&config, &refs, 2018).unwrap();

    let err = run::combine_history(&config).unwrap_err();
    let missing = err.downcast_ref::<MissingYearError>().unwrap();
    assert_eq!(missing.year, 2017);
    assert!(!config.history_path().exists());

    let _ = fs::remove_dir_all(&base);
}

#[test]
fn score_without_class_summary_fails() {
    let base = setup("missing_class");
    let config = config(&base);
    let refs = run::load_references(&config).unwrap();
    for year in 2016..=2018 {
        run::summarize(&config, &refs, year).unwrap();
    }
    let history = run::combine_history(&config).unwrap();

    let err = run::score(&config, &history, Vec::new()).unwrap_err();
    assert_eq!(
        err.downcast_ref::<MissingYearError>(),
        Some(&MissingYearError { year: 2019 })
    );

    let _ = fs::remove_dir_all(&base);
}

#[test]
fn value_gap_fails_the_year() {
    let base = setup("value_gap");
    fs::write(
        base.join("reference").join("values.csv"),
        "pick,value\n1,100\n2,80\n3,65\n",
    )
    .unwrap();
    let config = config(&base);
    let refs = run::load_references(&config).unwrap();

    let err = run::summarize(&config, &refs, 2016).unwrap_err();
    match err.downcast_ref::<PipelineError>() {
        Some(PipelineError::ValueCoverage(e)) => {
            assert_eq!(e.year, 2016);
            assert_eq!(e.picks, vec![4]);
            assert_eq!(e.additional, 0);
        }
        other => panic!("expected value coverage error, got {other:?}"),
    }
    assert!(!config.year_summary_path(2016).exists());

    let _ = fs::remove_dir_all(&base);
}

#[test]
fn board_missing_columns_fails_with_schema_error() {
    let base = setup("schema");
    fs::write(
        base.join("raw").join("2016.csv"),
        "Rank,Player Name,Pos\n1,Avery Hale,QB\n",
    )
    .unwrap();
    let config = config(&base);
    let refs = run::load_references(&config).unwrap();

    let err = run::summarize(&config, &refs, 2016).unwrap_err();
    match err.downcast_ref::<PipelineError>() {
        Some(PipelineError::Schema(e)) => {
            assert_eq!(e.year, 2016);
            assert_eq!(e.missing, vec!["college", "position"]);
        }
        other => panic!("expected schema error, got {other:?}"),
    }

    let _ = fs::remove_dir_all(&base);
}

#[test]
fn year_without_capacity_is_a_reference_error() {
    let base = setup("no_capacity");
    fs::write(
        base.join("raw").join("2015.csv"),
        "Rank,Player Name,Position,College\n1,Avery Hale,QB,Oregon\n",
    )
    .unwrap();
    let config = config(&base);
    let refs = run::load_references(&config).unwrap();

    let err = run::summarize(&config, &refs, 2015).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<PipelineError>(),
        Some(PipelineError::ReferenceData(_))
    ));

    let _ = fs::remove_dir_all(&base);
}
