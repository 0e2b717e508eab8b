//! Per-league orchestration: raw JSON → flattened → preprocessed → features.
//!
//! Every stage is skipped when its output file already exists, so reruns only
//! fill in what is missing.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::PipelineConfig;
use crate::error::ForecastError;
use crate::features::WinRateFeatureEngineer;
use crate::preprocess::MatchPreprocessor;
use crate::raw::{self, MatchRecord};
use crate::standings::StandingsProcessor;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaguePaths {
    pub league: String,
    pub standings: PathBuf,
    pub matches: PathBuf,
    pub fixtures: PathBuf,
    pub flattened: PathBuf,
    pub preprocessed: PathBuf,
    pub features: PathBuf,
}

impl LeaguePaths {
    pub fn new(data_dir: &Path, league: &str) -> Self {
        Self {
            league: league.to_string(),
            standings: data_dir.join(format!("standings-{league}.json")),
            matches: data_dir.join(format!("all-matches-{league}.json")),
            fixtures: data_dir.join(format!("fixtures-{league}.json")),
            flattened: data_dir.join(format!("standings-with-matches-{league}-clean.csv")),
            preprocessed: data_dir.join(format!("standings-with-matches-{league}-cleaned.csv")),
            features: data_dir.join(format!("standings-with-winrate-features-{league}.csv")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeagueStatus {
    /// At least one stage ran.
    Built,
    /// Every output was already on disk.
    Reused,
    Skipped(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeagueRun {
    pub paths: LeaguePaths,
    pub status: LeagueStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineSummary {
    pub runs: Vec<LeagueRun>,
}

impl PipelineSummary {
    /// Feature tables ready for training, in league order.
    pub fn feature_paths(&self) -> Vec<PathBuf> {
        self.runs
            .iter()
            .filter(|run| !matches!(run.status, LeagueStatus::Skipped(_)))
            .map(|run| run.paths.features.clone())
            .collect()
    }

    pub fn skipped(&self) -> usize {
        self.runs
            .iter()
            .filter(|run| matches!(run.status, LeagueStatus::Skipped(_)))
            .count()
    }
}

pub fn run_pipeline(cfg: &PipelineConfig) -> PipelineSummary {
    let mut summary = PipelineSummary::default();
    for league in &cfg.leagues {
        let paths = LeaguePaths::new(&cfg.data_dir, league);
        let status = match run_league(&paths, cfg) {
            Ok(status) => status,
            Err(err) => {
                let reason = match err.downcast_ref::<ForecastError>() {
                    Some(ForecastError::MissingInput { path }) => {
                        format!("no data available: {}", path.display())
                    }
                    _ => format!("{err:#}"),
                };
                log::warn!("skipping league {league}: {reason}");
                LeagueStatus::Skipped(reason)
            }
        };
        summary.runs.push(LeagueRun { paths, status });
    }
    log::info!(
        "pipeline finished: {} leagues ready, {} skipped",
        summary.runs.len() - summary.skipped(),
        summary.skipped()
    );
    summary
}

pub fn run_league(paths: &LeaguePaths, cfg: &PipelineConfig) -> Result<LeagueStatus> {
    let mut built = false;

    if paths.flattened.exists() {
        log::debug!("{} exists, reusing", paths.flattened.display());
    } else {
        StandingsProcessor::from_files(&paths.standings, &paths.matches)?
            .flatten_to_long()
            .clean()?
            .save_csv(&paths.flattened)?;
        built = true;
    }

    if paths.preprocessed.exists() {
        log::debug!("{} exists, reusing", paths.preprocessed.display());
    } else {
        let pre = MatchPreprocessor::from_csv(&paths.flattened)?
            .with_zero_threshold(cfg.zero_threshold)
            .run(cfg.large_stat_threshold);
        pre.save_csv(&paths.preprocessed)?;
        built = true;
    }

    if paths.features.exists() {
        log::debug!("{} exists, reusing", paths.features.display());
    } else {
        let table = WinRateFeatureEngineer::new(cfg.n_recent).from_csv(&paths.preprocessed)?;
        table
            .write_csv(&paths.features)
            .with_context(|| format!("save features {}", paths.features.display()))?;
        log::info!(
            "{}: {} feature rows written to {}",
            paths.league,
            table.len(),
            paths.features.display()
        );
        built = true;
    }

    Ok(if built {
        LeagueStatus::Built
    } else {
        LeagueStatus::Reused
    })
}

/// Scheduled fixtures for a league, empty when the scraper saved none.
pub fn upcoming_fixtures(paths: &LeaguePaths) -> Result<Vec<MatchRecord>> {
    if !paths.fixtures.exists() {
        return Ok(Vec::new());
    }
    raw::load_fixtures(&paths.fixtures)
}
