// Configuration loading and parsing (config/capcurve.toml).

use capcurve_core::{ExclusionSet, PositionSynonyms, ScoringRules, TierThresholds};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name of the configuration, inside `config/` and `defaults/`.
pub const CONFIG_FILE: &str = "capcurve.toml";

/// Environment variable that pins the base directory.
pub const HOME_ENV: &str = "CAPCURVE_HOME";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    /// Directory every relative data path is resolved against.
    pub base_dir: PathBuf,
    pub history: HistoryWindow,
    pub class_year: i32,
    pub scoring: ScoringConfig,
    pub synonyms: PositionSynonyms,
    pub data_paths: DataPaths,
}

// ---------------------------------------------------------------------------
// capcurve.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire capcurve.toml file.
#[derive(Debug, Clone, Deserialize)]
struct ConfigFile {
    history: HistoryWindow,
    class: ClassSection,
    #[serde(default)]
    scoring: ScoringConfig,
    #[serde(default)]
    positions: PositionsSection,
    data: DataPaths,
}

#[derive(Debug, Clone, Deserialize)]
struct ClassSection {
    year: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct PositionsSection {
    /// Extra raw label -> canonical code entries merged over the built-ins.
    #[serde(default)]
    synonyms: BTreeMap<String, String>,
}

/// Closed range of historical draft years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct HistoryWindow {
    pub start_year: i32,
    pub end_year: i32,
}

impl HistoryWindow {
    pub fn years(&self) -> std::ops::RangeInclusive<i32> {
        self.start_year..=self.end_year
    }

    pub fn contains(&self, year: i32) -> bool {
        self.years().contains(&year)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScoringConfig {
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,
    #[serde(default = "default_strong_z")]
    pub strong_z: f64,
    #[serde(default = "default_weak_z")]
    pub weak_z: f64,
    #[serde(default = "default_report_top_n")]
    pub report_top_n: usize,
}

fn default_exclude() -> Vec<String> {
    capcurve_core::position::DEFAULT_EXCLUDED
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_strong_z() -> f64 {
    TierThresholds::default().strong
}

fn default_weak_z() -> f64 {
    TierThresholds::default().weak
}

fn default_report_top_n() -> usize {
    5
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            exclude: default_exclude(),
            strong_z: default_strong_z(),
            weak_z: default_weak_z(),
            report_top_n: default_report_top_n(),
        }
    }
}

impl ScoringConfig {
    /// The core scoring rules these settings describe, with exclusion codes
    /// canonicalized through `synonyms`.
    pub fn rules(&self, synonyms: &PositionSynonyms) -> ScoringRules {
        ScoringRules {
            exclude: ExclusionSet::with_synonyms(&self.exclude, synonyms),
            tiers: TierThresholds {
                strong: self.strong_z,
                weak: self.weak_z,
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataPaths {
    pub raw_dir: String,
    pub reference_dir: String,
    pub processed_dir: String,
    pub values_file: String,
    pub capacity_file: String,
}

// ---------------------------------------------------------------------------
// Path conventions
// ---------------------------------------------------------------------------

impl Config {
    /// Scoring rules built against the configured synonym table, so excluded
    /// codes match board positions after canonicalization.
    pub fn scoring_rules(&self) -> ScoringRules {
        self.scoring.rules(&self.synonyms)
    }

    fn resolve(&self, rel: &str) -> PathBuf {
        self.base_dir.join(rel)
    }

    pub fn values_path(&self) -> PathBuf {
        self.resolve(&self.data_paths.reference_dir)
            .join(&self.data_paths.values_file)
    }

    pub fn capacity_path(&self) -> PathBuf {
        self.resolve(&self.data_paths.reference_dir)
            .join(&self.data_paths.capacity_file)
    }

    pub fn processed_dir(&self) -> PathBuf {
        self.resolve(&self.data_paths.processed_dir)
    }

    /// Raw board for one year: `<raw_dir>/<year>.csv`.
    pub fn board_path(&self, year: i32) -> PathBuf {
        self.resolve(&self.data_paths.raw_dir)
            .join(format!("{year}.csv"))
    }

    pub fn year_summary_path(&self, year: i32) -> PathBuf {
        self.processed_dir()
            .join(format!("{year}_position_value_summary.csv"))
    }

    pub fn history_path(&self) -> PathBuf {
        self.processed_dir().join(format!(
            "position_value_summary_{}_{}.csv",
            self.history.start_year, self.history.end_year
        ))
    }

    pub fn scores_path(&self) -> PathBuf {
        self.processed_dir().join(format!(
            "{}_vs_history_position_zscores.csv",
            self.class_year
        ))
    }

    pub fn report_path(&self) -> PathBuf {
        self.processed_dir()
            .join(format!("{}_vs_history_report.json", self.class_year))
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate `config/capcurve.toml` relative to `base_dir`.
///
/// This is the lower-level loading primitive that does not auto-copy defaults.
/// Prefer `load_config()` which handles default initialization automatically.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join(CONFIG_FILE);
    let text = read_file(&path)?;
    let file: ConfigFile = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        source: e,
    })?;

    let synonyms = PositionSynonyms::builtin()
        .with_entries(&file.positions.synonyms)
        .map_err(|e| ConfigError::ValidationError {
            field: "positions.synonyms".into(),
            message: e.to_string(),
        })?;

    let config = Config {
        base_dir: base_dir.to_path_buf(),
        history: file.history,
        class_year: file.class.year,
        scoring: file.scoring,
        synonyms,
        data_paths: file.data,
    };

    validate(&config)?;

    Ok(config)
}

/// Copy `defaults/capcurve.toml` to `config/capcurve.toml` when the latter is
/// missing. Returns the written path, or `None` when nothing was copied.
/// Never overwrites.
pub fn ensure_config_file(base_dir: &Path) -> Result<Option<PathBuf>, ConfigError> {
    let target = base_dir.join("config").join(CONFIG_FILE);
    if target.exists() {
        return Ok(None);
    }
    let source = base_dir.join("defaults").join(CONFIG_FILE);
    if !source.exists() {
        return Err(ConfigError::DefaultsCopyError {
            message: format!(
                "neither {} nor {} exists; set {HOME_ENV} or run from a directory \
                 containing config/",
                target.display(),
                source.display()
            ),
        });
    }

    let copy_err = |e: std::io::Error| ConfigError::DefaultsCopyError {
        message: format!("failed to copy {} to {}: {e}", source.display(), target.display()),
    };
    std::fs::create_dir_all(base_dir.join("config")).map_err(copy_err)?;
    std::fs::copy(&source, &target).map_err(copy_err)?;
    Ok(Some(target))
}

/// Pick the base directory: `$CAPCURVE_HOME`, else the working directory if
/// it holds `config/` or `defaults/`, else the platform config directory.
pub fn resolve_base_dir() -> Result<PathBuf, ConfigError> {
    if let Some(home) = std::env::var_os(HOME_ENV) {
        return Ok(PathBuf::from(home));
    }
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    if cwd.join("config").join(CONFIG_FILE).exists() || cwd.join("defaults").exists() {
        return Ok(cwd);
    }
    match directories::ProjectDirs::from("", "", "capcurve") {
        Some(dirs) => Ok(dirs.config_dir().to_path_buf()),
        None => Ok(cwd),
    }
}

/// Convenience wrapper: resolves the base directory, copies defaults, loads.
pub fn load_config() -> Result<Config, ConfigError> {
    let base = resolve_base_dir()?;
    ensure_config_file(&base)?;
    load_config_from(&base)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    let h = &config.history;
    if h.start_year > h.end_year {
        return Err(ConfigError::ValidationError {
            field: "history.start_year".into(),
            message: format!(
                "must not be after history.end_year ({} > {})",
                h.start_year, h.end_year
            ),
        });
    }

    if h.contains(config.class_year) {
        return Err(ConfigError::ValidationError {
            field: "class.year".into(),
            message: format!(
                "{} lies inside the historical window {}..={}",
                config.class_year, h.start_year, h.end_year
            ),
        });
    }

    let s = &config.scoring;
    if !s.strong_z.is_finite() || !s.weak_z.is_finite() || s.weak_z >= s.strong_z {
        return Err(ConfigError::ValidationError {
            field: "scoring.weak_z".into(),
            message: format!(
                "must be finite and below scoring.strong_z, got weak={} strong={}",
                s.weak_z, s.strong_z
            ),
        });
    }

    if s.report_top_n == 0 {
        return Err(ConfigError::ValidationError {
            field: "scoring.report_top_n".into(),
            message: "must be > 0".into(),
        });
    }

    let d = &config.data_paths;
    let path_fields: &[(&str, &str)] = &[
        ("data.raw_dir", d.raw_dir.as_str()),
        ("data.reference_dir", d.reference_dir.as_str()),
        ("data.processed_dir", d.processed_dir.as_str()),
        ("data.values_file", d.values_file.as_str()),
        ("data.capacity_file", d.capacity_file.as_str()),
    ];
    for (name, val) in path_fields {
        if val.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                field: name.to_string(),
                message: "must not be empty".into(),
            });
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
