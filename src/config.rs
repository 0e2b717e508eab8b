use std::env;
use std::path::PathBuf;

use crate::features::DEFAULT_N_RECENT;
use crate::forest::{DEFAULT_SEED, DEFAULT_TREES, ForestParams, MAX_TEST_FRACTION};
use crate::predictor::{DEFAULT_TEST_FRACTION, PredictorConfig};
use crate::preprocess::{DEFAULT_LARGE_STAT_THRESHOLD, DEFAULT_ZERO_THRESHOLD};

pub const DEFAULT_DATA_DIR: &str = "processed";
pub const PREDICTION_LOG_FILE: &str = "predictions_log.csv";

pub const DEFAULT_LEAGUES: &[&str] = &[
    "romania-superliga-2024-2025",
    "romania-superliga-2025-2026",
    "la-liga-2024-2025",
    "la-liga-2025-2026",
    "premier-league-2024-2025",
    "premier-league-2025-2026",
    "bundesliga-2024-2025",
    "bundesliga-2025-2026",
    "france-ligue-1-2024-2025",
    "france-ligue-1-2025-2026",
    "champions-league-2024-2025",
    "champions-league-2025-2026",
    "italy-serie-a-2024-2025",
    "italy-serie-a-2025-2026",
    "netherlands-eredivisie-2024-2025",
    "netherlands-eredivisie-2025-2026",
    "liga-portugal-2024-2025",
    "liga-portugal-2025-2026",
    "jupiler-pro-league-2024-2025",
    "jupiler-pro-league-2025-2026",
];

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub data_dir: PathBuf,
    pub leagues: Vec<String>,
    pub n_recent: usize,
    pub zero_threshold: f64,
    pub large_stat_threshold: f64,
    pub n_trees: usize,
    pub seed: u64,
    pub test_fraction: f64,
    pub prediction_log: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            leagues: DEFAULT_LEAGUES.iter().map(|s| s.to_string()).collect(),
            n_recent: DEFAULT_N_RECENT,
            zero_threshold: DEFAULT_ZERO_THRESHOLD,
            large_stat_threshold: DEFAULT_LARGE_STAT_THRESHOLD,
            n_trees: DEFAULT_TREES,
            seed: DEFAULT_SEED,
            test_fraction: DEFAULT_TEST_FRACTION,
            prediction_log: PathBuf::from(DEFAULT_DATA_DIR).join(PREDICTION_LOG_FILE),
        }
    }
}

impl PipelineConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup. Blank or unparsable values fall
    /// back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let data_dir = get("FORECAST_DATA_DIR")
            .map(|v| PathBuf::from(v.trim()))
            .unwrap_or(defaults.data_dir);
        let leagues = get("FORECAST_LEAGUES")
            .map(|raw| parse_leagues(&raw))
            .filter(|list| !list.is_empty())
            .unwrap_or(defaults.leagues);
        let n_recent = get("FORECAST_N_RECENT")
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(defaults.n_recent)
            .clamp(1, 50);
        let zero_threshold = get("FORECAST_ZERO_THRESHOLD")
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite())
            .unwrap_or(defaults.zero_threshold)
            .clamp(0.0, 1.0);
        let large_stat_threshold = get("FORECAST_LARGE_STAT_THRESHOLD")
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite() && *v > 0.0)
            .unwrap_or(defaults.large_stat_threshold);
        let n_trees = get("FORECAST_TREES")
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(defaults.n_trees)
            .clamp(1, 1000);
        let seed = get("FORECAST_SEED")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(defaults.seed);
        let test_fraction = get("FORECAST_TEST_FRACTION")
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite())
            .unwrap_or(defaults.test_fraction)
            .clamp(0.05, MAX_TEST_FRACTION);
        let prediction_log = get("FORECAST_PREDICTION_LOG")
            .map(|v| PathBuf::from(v.trim()))
            .unwrap_or_else(|| data_dir.join(PREDICTION_LOG_FILE));

        Self {
            data_dir,
            leagues,
            n_recent,
            zero_threshold,
            large_stat_threshold,
            n_trees,
            seed,
            test_fraction,
            prediction_log,
        }
    }

    pub fn predictor_config(&self) -> PredictorConfig {
        PredictorConfig {
            forest: ForestParams {
                n_trees: self.n_trees,
                seed: self.seed,
                ..ForestParams::default()
            },
            test_fraction: self.test_fraction,
        }
    }

    /// Applies `--data-dir` and `--leagues` from the command line. Both the
    /// `--flag=value` and `--flag value` forms are accepted.
    pub fn apply_args(&mut self, args: &[String]) {
        if let Some(dir) = flag_value(args, "data-dir") {
            let explicit_log = self.prediction_log != self.data_dir.join(PREDICTION_LOG_FILE);
            self.data_dir = PathBuf::from(dir);
            if !explicit_log {
                self.prediction_log = self.data_dir.join(PREDICTION_LOG_FILE);
            }
        }
        if let Some(raw) = flag_value(args, "leagues") {
            let leagues = parse_leagues(&raw);
            if !leagues.is_empty() {
                self.leagues = leagues;
            }
        }
    }
}

pub fn flag_value(args: &[String], name: &str) -> Option<String> {
    let long = format!("--{name}");
    let prefix = format!("{long}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if *arg == long {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() && !next.starts_with("--") {
                return Some(next.trim().to_string());
            }
        }
    }
    None
}

pub fn has_flag(args: &[String], name: &str) -> bool {
    let long = format!("--{name}");
    args.iter().any(|arg| *arg == long)
}

pub fn parse_leagues(raw: &str) -> Vec<String> {
    raw.split([',', ';', ' '])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
