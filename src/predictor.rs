//! Training and single-fixture forecasting over engineered feature tables.
//!
//! A forecast reuses each team's latest engineered row as its current form.
//! Only the head-to-head rate is recomputed for the requested pairing.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::Serialize;

use crate::columns;
use crate::encoding::{TeamEncoder, Venue};
use crate::error::ForecastError;
use crate::forest::{ForestClassifier, ForestParams, ForestRegressor, Scaler, holdout_split};
use crate::kickoff::{KickoffKey, parse_date, parse_time};
use crate::metrics::{
    MatchOutcome, Metrics, Prob3, RegressionMetrics, accuracy, evaluate_probs, evaluate_regression,
};
use crate::table::{Cell, Table};

pub const DEFAULT_TEST_FRACTION: f64 = 0.3;
pub const GOALS_CAP: u8 = 6;
pub const SCORE_CAP: i64 = 5;
const MIN_TRAINING_ROWS: usize = 2;

pub const BASE_FEATURES: [&str; 13] = [
    columns::WIN_RATE_GLOBAL,
    columns::WIN_RATE_LAST_N,
    columns::HOME_WIN_RATE,
    columns::AWAY_WIN_RATE,
    columns::H2H_WIN_RATE,
    columns::FORM_SCORE,
    columns::GOAL_DIFF_WIN_RATE,
    columns::WEIGHTED_OUTCOME,
    columns::TEAM_GOALS,
    columns::OPPONENT_GOALS,
    columns::RANK,
    columns::OPPONENT_RANK,
    columns::HOME_ENCODED,
];

pub const STAT_FEATURES: [&str; 27] = [
    "stat_Expected_Goals_xG_team",
    "stat_Expected_Goals_xG_opponent",
    "stat_Ball_Possession_team",
    "stat_Ball_Possession_opponent",
    "stat_Total_shots_team",
    "stat_Total_shots_opponent",
    "stat_Shots_on_target_team",
    "stat_Shots_on_target_opponent",
    "stat_Corner_Kicks_team",
    "stat_Corner_Kicks_opponent",
    "stat_Yellow_Cards_team",
    "stat_Yellow_Cards_opponent",
    "stat_Red_Cards_team",
    "stat_Red_Cards_opponent",
    "stat_Passes_team",
    "stat_Passes_opponent",
    "stat_Fouls_team",
    "stat_Fouls_opponent",
    "stat_Tackles_team",
    "stat_Tackles_opponent",
    columns::WINS,
    columns::DRAWS,
    columns::LOSSES,
    columns::SEASON_GOALS_FOR,
    columns::SEASON_GOALS_AGAINST,
    columns::GOAL_DIFFERENCE,
    columns::POINTS,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatTarget {
    Corners,
    ShotsOnTarget,
    Possession,
    YellowCards,
    Fouls,
    Tackles,
    Passes,
    ShotsTotal,
    Xg,
}

impl StatTarget {
    pub const ALL: [StatTarget; 9] = [
        StatTarget::Corners,
        StatTarget::ShotsOnTarget,
        StatTarget::Possession,
        StatTarget::YellowCards,
        StatTarget::Fouls,
        StatTarget::Tackles,
        StatTarget::Passes,
        StatTarget::ShotsTotal,
        StatTarget::Xg,
    ];

    pub fn key(self) -> &'static str {
        match self {
            StatTarget::Corners => "corners",
            StatTarget::ShotsOnTarget => "shots_on_target",
            StatTarget::Possession => "possession",
            StatTarget::YellowCards => "yellow_cards",
            StatTarget::Fouls => "fouls",
            StatTarget::Tackles => "tackles",
            StatTarget::Passes => "passes",
            StatTarget::ShotsTotal => "shots_total",
            StatTarget::Xg => "xg",
        }
    }

    fn column_base(self) -> &'static str {
        match self {
            StatTarget::Corners => "stat_Corner_Kicks",
            StatTarget::ShotsOnTarget => "stat_Shots_on_target",
            StatTarget::Possession => "stat_Ball_Possession",
            StatTarget::YellowCards => "stat_Yellow_Cards",
            StatTarget::Fouls => "stat_Fouls",
            StatTarget::Tackles => "stat_Tackles",
            StatTarget::Passes => "stat_Passes",
            StatTarget::ShotsTotal => "stat_Total_shots",
            StatTarget::Xg => "stat_Expected_Goals_xG",
        }
    }

    /// Training target column: the row team's value for the home model, the
    /// opponent's value for the away model.
    pub fn column(self, side: Venue) -> String {
        let suffix = match side {
            Venue::Home => columns::TEAM_SUFFIX,
            Venue::Away => columns::OPPONENT_SUFFIX,
        };
        format!("{}{}", self.column_base(), suffix)
    }

    pub fn model_key(self, side: Venue) -> String {
        format!("{}_{}", self.key(), side.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictorConfig {
    pub forest: ForestParams,
    pub test_fraction: f64,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            forest: ForestParams::default(),
            test_fraction: DEFAULT_TEST_FRACTION,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatPredictions {
    pub home: BTreeMap<StatTarget, f64>,
    pub away: BTreeMap<StatTarget, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    pub home_team: String,
    pub away_team: String,
    pub outcome: MatchOutcome,
    pub probabilities: Prob3,
    /// Total-goals bucket; 6 stands for six or more.
    pub goals: u8,
    pub score: String,
    pub stats: StatPredictions,
}

impl PredictionResult {
    pub fn goals_label(&self) -> String {
        if self.goals >= GOALS_CAP {
            format!("{GOALS_CAP}+")
        } else {
            self.goals.to_string()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatReport {
    pub model: String,
    pub metrics: RegressionMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingReport {
    pub rows: usize,
    pub train_rows: usize,
    pub test_rows: usize,
    pub features: Vec<String>,
    pub outcome: Metrics,
    pub goals_accuracy: f64,
    pub score_accuracy: f64,
    pub stats: Vec<StatReport>,
    pub skipped: Vec<String>,
}

/// A stat regressor and the scaler fitted alongside it. Inference reuses the
/// scaler; it is never refit.
struct StatModel {
    scaler: Scaler,
    model: ForestRegressor,
}

impl StatModel {
    fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<f64>, ForecastError> {
        self.model.predict(&self.scaler.transform(x)?)
    }
}

struct TrainedModels {
    features: Vec<String>,
    outcome: ForestClassifier<u8>,
    goals: ForestClassifier<u8>,
    score: ForestClassifier<String>,
    stats: BTreeMap<(StatTarget, Venue), StatModel>,
}

pub struct MatchPredictor {
    table: Table,
    encoder: TeamEncoder,
    config: PredictorConfig,
    models: Option<TrainedModels>,
}

impl MatchPredictor {
    /// Loads every readable feature CSV; unreadable ones are logged and
    /// skipped. Fails only when nothing could be loaded.
    pub fn from_csv_paths(paths: &[PathBuf], config: PredictorConfig) -> Result<Self> {
        let mut tables = Vec::new();
        for path in paths {
            match Table::read_csv(path) {
                Ok(table) => tables.push(table),
                Err(err) => log::warn!("skipping feature table {}: {err:#}", path.display()),
            }
        }
        if tables.is_empty() {
            let first = paths.first().cloned().unwrap_or_default();
            return Err(ForecastError::missing_input(first).into());
        }
        Self::from_tables(tables, config)
    }

    pub fn from_tables(tables: Vec<Table>, config: PredictorConfig) -> Result<Self> {
        let mut table = Table::concat(tables);
        prepare_table(&mut table)?;
        let encoder = encode_teams(&mut table)?;
        log::info!(
            "predictor loaded {} rows covering {} teams",
            table.len(),
            encoder.len()
        );
        Ok(Self {
            table,
            encoder,
            config,
            models: None,
        })
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn teams(&self) -> &[String] {
        self.encoder.classes()
    }

    pub fn is_trained(&self) -> bool {
        self.models.is_some()
    }

    /// Features the models use: the fixed list filtered to the columns present.
    pub fn feature_columns(&self) -> Vec<String> {
        BASE_FEATURES
            .iter()
            .chain(STAT_FEATURES.iter())
            .filter(|name| self.table.has_column(name))
            .map(|name| name.to_string())
            .collect()
    }

    pub fn train_models(&mut self) -> Result<TrainingReport> {
        let n = self.table.len();
        if n < MIN_TRAINING_ROWS {
            return Err(ForecastError::InsufficientRows {
                needed: MIN_TRAINING_ROWS,
                found: n,
            }
            .into());
        }
        let features = self.feature_columns();
        let x = self.matrix(&features);
        let params = self.config.forest;
        let (train, test) = holdout_split(n, self.config.test_fraction, params.seed)?;
        let x_train = pick(&x, &train);
        let x_test = pick(&x, &test);

        let outcome_y = self.class_column(columns::OUTCOME_ENCODED)?;
        let outcome = ForestClassifier::fit(&x_train, &pick(&outcome_y, &train), params)?;
        let outcome_probs: Vec<Prob3> = outcome
            .predict_proba(&x_test)?
            .iter()
            .map(|row| Prob3::from_classes(outcome.classes(), row))
            .collect();
        let outcome_truth: Vec<MatchOutcome> = pick(&outcome_y, &test)
            .into_iter()
            .filter_map(MatchOutcome::from_class)
            .collect();
        let outcome_metrics = evaluate_probs(&outcome_probs, &outcome_truth);

        let goals_y = self.class_column(columns::GOALS_CLASS)?;
        let goals = ForestClassifier::fit(&x_train, &pick(&goals_y, &train), params)?;
        let goals_accuracy = classifier_accuracy(&goals, &x_test, &pick(&goals_y, &test))?;

        let score_col = self.table.require_column(columns::SCORE_CLASS)?;
        let score_y: Vec<String> = self.table.column_cells(score_col).map(Cell::render).collect();
        let score = ForestClassifier::fit(&x_train, &pick(&score_y, &train), params)?;
        let score_accuracy = classifier_accuracy(&score, &x_test, &pick(&score_y, &test))?;

        let mut targets = Vec::new();
        let mut skipped = Vec::new();
        for target in StatTarget::ALL {
            for side in [Venue::Home, Venue::Away] {
                let key = target.model_key(side);
                match self.table.column_index(&target.column(side)) {
                    Some(col) => targets.push((target, side, col)),
                    None => {
                        log::warn!("no `{}` column; skipping {key}", target.column(side));
                        skipped.push(key);
                    }
                }
            }
        }

        let fitted: Vec<(StatTarget, Venue, StatModel, RegressionMetrics)> = targets
            .into_par_iter()
            .map(|(target, side, col)| -> Result<_, ForecastError> {
                let y: Vec<f64> = self
                    .table
                    .column_cells(col)
                    .map(|c| c.as_f64().unwrap_or(0.0))
                    .collect();
                let scaler = Scaler::fit(&x_train)?;
                let model =
                    ForestRegressor::fit(&scaler.transform(&x_train)?, &pick(&y, &train), params)?;
                let stat = StatModel { scaler, model };
                let predicted = stat.predict(&x_test)?;
                let metrics = evaluate_regression(&predicted, &pick(&y, &test));
                Ok((target, side, stat, metrics))
            })
            .collect::<Result<Vec<_>, ForecastError>>()?;

        let mut stats = BTreeMap::new();
        let mut stat_reports = Vec::new();
        for (target, side, stat, metrics) in fitted {
            let key = target.model_key(side);
            log::info!("{key}: mae={:.3} r2={:.3}", metrics.mae, metrics.r2);
            stat_reports.push(StatReport {
                model: key,
                metrics,
            });
            stats.insert((target, side), stat);
        }

        log::info!(
            "outcome: acc={:.3} brier={:.3} log_loss={:.3}; goals acc={:.3}; score acc={:.3}",
            outcome_metrics.accuracy,
            outcome_metrics.brier,
            outcome_metrics.log_loss,
            goals_accuracy,
            score_accuracy
        );

        let report = TrainingReport {
            rows: n,
            train_rows: train.len(),
            test_rows: test.len(),
            features: features.clone(),
            outcome: outcome_metrics,
            goals_accuracy,
            score_accuracy,
            stats: stat_reports,
            skipped,
        };
        self.models = Some(TrainedModels {
            features,
            outcome,
            goals,
            score,
            stats,
        });
        Ok(report)
    }

    /// Forecast for a fixture, or `None` when the teams cannot be resolved or
    /// their features cannot be assembled. The reason is logged.
    pub fn predict_future_match(&self, home: &str, away: &str) -> Option<PredictionResult> {
        match self.try_predict(home, away) {
            Ok(result) => Some(result),
            Err(err) => {
                log::warn!("no prediction for {home} vs {away}: {err}");
                None
            }
        }
    }

    pub fn try_predict(&self, home: &str, away: &str) -> Result<PredictionResult, ForecastError> {
        let models = self
            .models
            .as_ref()
            .ok_or(ForecastError::InvalidState("train_models() must run before predicting"))?;
        let home_name = self
            .encoder
            .resolve(home)
            .ok_or_else(|| ForecastError::UnknownTeam(home.trim().to_string()))?;
        let away_name = self
            .encoder
            .resolve(away)
            .ok_or_else(|| ForecastError::UnknownTeam(away.trim().to_string()))?;

        let home_row = self
            .latest_row(home_name)
            .ok_or_else(|| ForecastError::MissingSnapshot(home_name.to_string()))?;
        let away_row = self
            .latest_row(away_name)
            .ok_or_else(|| ForecastError::MissingSnapshot(away_name.to_string()))?;

        let h2h = self.head_to_head(home_name, away_name);
        let x_home = self.assemble(&models.features, home_row, away_row, h2h, Venue::Home)?;
        let x_away = self.assemble(&models.features, away_row, home_row, h2h, Venue::Away)?;

        let home_input = std::slice::from_ref(&x_home);
        let probabilities = models
            .outcome
            .predict_proba(home_input)?
            .first()
            .map(|row| Prob3::from_classes(models.outcome.classes(), row))
            .ok_or_else(|| ForecastError::Model("outcome model returned no rows".into()))?;
        let outcome = models
            .outcome
            .predict(home_input)?
            .into_iter()
            .next()
            .and_then(MatchOutcome::from_class)
            .ok_or_else(|| ForecastError::FeatureAssembly("outcome model has no classes".into()))?;
        let goals = models
            .goals
            .predict(home_input)?
            .into_iter()
            .next()
            .ok_or_else(|| ForecastError::FeatureAssembly("goals model has no classes".into()))?;
        let score = models
            .score
            .predict(home_input)?
            .into_iter()
            .next()
            .ok_or_else(|| ForecastError::FeatureAssembly("score model has no classes".into()))?;

        let mut stats = StatPredictions::default();
        for ((target, side), stat) in &models.stats {
            let (x, out) = match side {
                Venue::Home => (&x_home, &mut stats.home),
                Venue::Away => (&x_away, &mut stats.away),
            };
            if let Some(value) = stat.predict(std::slice::from_ref(x))?.first() {
                out.insert(*target, *value);
            }
        }

        Ok(PredictionResult {
            home_team: home_name.to_string(),
            away_team: away_name.to_string(),
            outcome,
            probabilities,
            goals,
            score,
            stats,
        })
    }

    /// Re-creates the training holdout and writes the table with prediction
    /// columns filled on the test rows.
    pub fn export_holdout_predictions(&self, path: &Path) -> Result<Table> {
        let models = self
            .models
            .as_ref()
            .ok_or(ForecastError::InvalidState("train_models() must run before export"))?;
        let x = self.matrix(&models.features);
        let (_, test) = holdout_split(
            self.table.len(),
            self.config.test_fraction,
            self.config.forest.seed,
        )?;

        let n = self.table.len();
        let mut outcome_col = vec![Cell::Empty; n];
        let mut goals_col = vec![Cell::Empty; n];
        let mut score_col = vec![Cell::Empty; n];
        let mut stat_cols: Vec<(String, Vec<Cell>)> = models
            .stats
            .keys()
            .map(|(target, side)| {
                (
                    format!("Predicted_{}", target.model_key(*side)),
                    vec![Cell::Empty; n],
                )
            })
            .collect();

        let x_test = pick(&x, &test);
        let outcomes = models.outcome.predict(&x_test)?;
        let goals = models.goals.predict(&x_test)?;
        let scores = models.score.predict(&x_test)?;
        for (pos, idx) in test.iter().copied().enumerate() {
            outcome_col[idx] = Cell::from_opt(outcomes.get(pos).copied());
            goals_col[idx] = Cell::from_opt(goals.get(pos).copied());
            score_col[idx] = scores.get(pos).map_or(Cell::Empty, |s| Cell::text(s.clone()));
        }
        for ((_, values), stat) in stat_cols.iter_mut().zip(models.stats.values()) {
            let predicted = stat.predict(&x_test)?;
            for (idx, value) in test.iter().copied().zip(predicted) {
                values[idx] = Cell::Number(value);
            }
        }

        let mut out = self.table.clone();
        out.set_column("Predicted_outcome", outcome_col);
        out.set_column("Predicted_goals", goals_col);
        out.set_column("Predicted_score", score_col);
        for (name, values) in stat_cols {
            out.set_column(&name, values);
        }
        out.write_csv(path)
            .with_context(|| format!("save holdout predictions {}", path.display()))?;
        log::info!("holdout predictions saved to {}", path.display());
        Ok(out)
    }

    fn matrix(&self, features: &[String]) -> Vec<Vec<f64>> {
        let cols: Vec<Option<usize>> = features
            .iter()
            .map(|name| self.table.column_index(name))
            .collect();
        self.table
            .rows()
            .iter()
            .map(|row| {
                cols.iter()
                    .map(|col| col.and_then(|c| row[c].as_f64()).unwrap_or(0.0))
                    .collect()
            })
            .collect()
    }

    fn class_column(&self, name: &str) -> Result<Vec<u8>, ForecastError> {
        let col = self.table.require_column(name)?;
        Ok(self
            .table
            .column_cells(col)
            .map(|c| c.as_f64().map_or(0, |v| v.clamp(0.0, u8::MAX as f64) as u8))
            .collect())
    }

    /// Row with the latest kickoff among those where `team` is the subject.
    /// Equal kickoffs resolve to the later row.
    fn latest_row(&self, team: &str) -> Option<usize> {
        let team_col = self.table.column_index(columns::TEAM)?;
        let date_col = self.table.column_index(columns::DATE);
        let time_col = self.table.column_index(columns::TIME);
        (0..self.table.len())
            .filter(|idx| self.table.cell(*idx, team_col).render().eq_ignore_ascii_case(team))
            .max_by_key(|idx| {
                KickoffKey::from_cells(
                    date_col.map(|c| self.table.cell(*idx, c)),
                    time_col.map(|c| self.table.cell(*idx, c)),
                )
            })
    }

    /// Mean stored h2h rate over every meeting of the two teams, in either
    /// orientation.
    fn head_to_head(&self, a: &str, b: &str) -> f64 {
        let (Some(team_col), Some(opp_col)) = (
            self.table.column_index(columns::TEAM),
            self.table.column_index(columns::OPPONENT),
        ) else {
            return 0.5;
        };
        let h2h_col = self.table.column_index(columns::H2H_WIN_RATE);
        let rates: Vec<f64> = self
            .table
            .rows()
            .iter()
            .filter(|row| {
                let team = row[team_col].render();
                let opp = row[opp_col].render();
                (team.eq_ignore_ascii_case(a) && opp.eq_ignore_ascii_case(b))
                    || (team.eq_ignore_ascii_case(b) && opp.eq_ignore_ascii_case(a))
            })
            .filter_map(|row| h2h_col.and_then(|c| row[c].as_f64()))
            .collect();
        if rates.is_empty() {
            0.5
        } else {
            rates.iter().sum::<f64>() / rates.len() as f64
        }
    }

    fn assemble(
        &self,
        features: &[String],
        subject: usize,
        opponent: usize,
        h2h: f64,
        perspective: Venue,
    ) -> Result<Vec<f64>, ForecastError> {
        let get = |row: usize, name: &str, default: f64| -> f64 {
            self.table
                .value(row, name)
                .and_then(Cell::as_f64)
                .unwrap_or(default)
        };

        let mut values: HashMap<String, f64> = HashMap::new();
        let mut set = |name: &str, v: f64| {
            values.insert(name.to_string(), v);
        };
        set(columns::WIN_RATE_GLOBAL, get(subject, columns::WIN_RATE_GLOBAL, 0.5));
        set(columns::WIN_RATE_LAST_N, get(subject, columns::WIN_RATE_LAST_N, 0.5));
        match perspective {
            Venue::Home => {
                set(columns::HOME_WIN_RATE, get(subject, columns::HOME_WIN_RATE, 0.5));
                set(columns::AWAY_WIN_RATE, get(opponent, columns::AWAY_WIN_RATE, 0.5));
            }
            Venue::Away => {
                set(columns::HOME_WIN_RATE, get(opponent, columns::HOME_WIN_RATE, 0.5));
                set(columns::AWAY_WIN_RATE, get(subject, columns::AWAY_WIN_RATE, 0.5));
            }
        }
        set(columns::HOME_ENCODED, perspective.encoded() as f64);
        set(columns::H2H_WIN_RATE, h2h);
        set(columns::FORM_SCORE, get(subject, columns::FORM_SCORE, 0.5));
        set(columns::GOAL_DIFF_WIN_RATE, get(subject, columns::GOAL_DIFF_WIN_RATE, 0.0));
        set(columns::WEIGHTED_OUTCOME, get(subject, columns::WEIGHTED_OUTCOME, 0.5));
        set(columns::TEAM_GOALS, get(subject, columns::TEAM_GOALS, 1.0));
        set(columns::OPPONENT_GOALS, get(opponent, columns::TEAM_GOALS, 1.0));
        set(columns::RANK, get(subject, columns::RANK, 10.0));
        set(columns::OPPONENT_RANK, get(opponent, columns::RANK, 10.0));
        for name in STAT_FEATURES {
            // The snapshot row is written from the subject's own side, so the
            // away vector reads the mirrored column.
            let source = match perspective {
                Venue::Home => name.to_string(),
                Venue::Away => columns::swap_side(name),
            };
            set(name, get(subject, &source, 0.0));
        }

        features
            .iter()
            .map(|name| {
                let v = values.get(name).copied().ok_or_else(|| {
                    ForecastError::FeatureAssembly(format!("no value for feature `{name}`"))
                })?;
                if v.is_finite() {
                    Ok(v)
                } else {
                    Err(ForecastError::FeatureAssembly(format!(
                        "non-finite value for feature `{name}`"
                    )))
                }
            })
            .collect()
    }
}

/// Derived targets, typed kickoff columns, mean-filled features and dropping
/// of rows without identities or goals.
fn prepare_table(table: &mut Table) -> Result<()> {
    let goals_col = table.require_column(columns::TEAM_GOALS)?;
    let against_col = table.require_column(columns::OPPONENT_GOALS)?;

    let goal_pairs: Vec<Option<(f64, f64)>> = table
        .rows()
        .iter()
        .map(|row| Some((row[goals_col].as_f64()?, row[against_col].as_f64()?)))
        .collect();
    let total: Vec<Cell> = goal_pairs
        .iter()
        .map(|g| Cell::from_opt(g.map(|(f, a)| f + a)))
        .collect();
    let bucket: Vec<Cell> = goal_pairs
        .iter()
        .map(|g| Cell::from_opt(g.map(|(f, a)| (f + a).min(GOALS_CAP as f64).trunc())))
        .collect();
    let score: Vec<Cell> = goal_pairs
        .iter()
        .map(|g| match g {
            Some((f, a)) => Cell::text(format!(
                "{}:{}",
                (*f as i64).min(SCORE_CAP),
                (*a as i64).min(SCORE_CAP)
            )),
            None => Cell::Empty,
        })
        .collect();
    table.set_column(columns::TOTAL_GOALS, total);
    table.set_column(columns::GOALS_CLASS, bucket);
    table.set_column(columns::SCORE_CLASS, score);

    if let Some(col) = table.column_index(columns::DATE) {
        table.map_column(col, |cell| {
            parse_date(&cell.render())
                .map_or(Cell::Empty, |d| Cell::text(d.format("%Y-%m-%d").to_string()))
        });
    }
    if let Some(col) = table.column_index(columns::TIME) {
        table.map_column(col, |cell| {
            parse_time(&cell.render())
                .map_or(Cell::Empty, |t| Cell::text(t.format("%H:%M").to_string()))
        });
    }

    // Goal columns are targets; rows missing them are dropped below instead.
    for name in BASE_FEATURES.iter().chain(STAT_FEATURES.iter()) {
        if *name == columns::TEAM_GOALS || *name == columns::OPPONENT_GOALS {
            continue;
        }
        let Some(col) = table.column_index(name) else {
            continue;
        };
        if !table.is_numeric_column(col) {
            continue;
        }
        let present: Vec<f64> = table.column_cells(col).filter_map(Cell::as_f64).collect();
        let mean = if present.is_empty() {
            0.0
        } else {
            present.iter().sum::<f64>() / present.len() as f64
        };
        table.map_column(col, |cell| match cell {
            Cell::Empty => Cell::Number(mean),
            other => other.clone(),
        });
    }

    let required: Vec<usize> = [
        columns::TEAM,
        columns::OPPONENT,
        columns::TEAM_GOALS,
        columns::OPPONENT_GOALS,
    ]
    .iter()
    .map(|name| table.require_column(name))
    .collect::<Result<_, _>>()?;
    let before = table.len();
    table.retain_rows(|row| {
        required.iter().all(|c| !row[*c].is_empty())
            && row[goals_col].as_f64().is_some()
            && row[against_col].as_f64().is_some()
    });
    if table.len() < before {
        log::info!("dropped {} rows without teams or goals", before - table.len());
    }
    Ok(())
}

fn encode_teams(table: &mut Table) -> Result<TeamEncoder> {
    let team_col = table.require_column(columns::TEAM)?;
    let opp_col = table.require_column(columns::OPPONENT)?;
    let goals_col = table.require_column(columns::TEAM_GOALS)?;
    let against_col = table.require_column(columns::OPPONENT_GOALS)?;

    let names: Vec<String> = table
        .column_cells(team_col)
        .chain(table.column_cells(opp_col))
        .map(Cell::render)
        .collect();
    let encoder = TeamEncoder::fit(names.iter().map(String::as_str));

    let code = |col: usize| -> Vec<Cell> {
        table
            .column_cells(col)
            .map(|c| Cell::from_opt(encoder.encode(&c.render()).map(|i| i as f64)))
            .collect()
    };
    let team_codes = code(team_col);
    let opp_codes = code(opp_col);
    let outcome: Vec<Cell> = table
        .rows()
        .iter()
        .map(|row| {
            let f = row[goals_col].as_f64().unwrap_or(0.0);
            let a = row[against_col].as_f64().unwrap_or(0.0);
            Cell::Number(MatchOutcome::from_goals(f, a).class() as f64)
        })
        .collect();
    let home = if table.has_column(columns::HOME_ENCODED) {
        None
    } else {
        let venue = table.column_index(columns::VENUE);
        Some(
            table
                .rows()
                .iter()
                .map(|row| {
                    let is_home = venue
                        .and_then(|c| Venue::from_label(&row[c].render()))
                        .is_some_and(|v| v == Venue::Home);
                    Cell::Number(if is_home { 1.0 } else { 0.0 })
                })
                .collect::<Vec<_>>(),
        )
    };

    table.set_column(columns::TEAM_ENCODED, team_codes);
    table.set_column(columns::OPPONENT_ENCODED, opp_codes);
    table.set_column(columns::OUTCOME_ENCODED, outcome);
    if let Some(home) = home {
        table.set_column(columns::HOME_ENCODED, home);
    }
    Ok(encoder)
}

fn pick<T: Clone>(values: &[T], indices: &[usize]) -> Vec<T> {
    indices.iter().map(|idx| values[*idx].clone()).collect()
}

fn classifier_accuracy<L: Ord + Clone>(
    model: &ForestClassifier<L>,
    x: &[Vec<f64>],
    truth: &[L],
) -> Result<f64, ForecastError> {
    Ok(accuracy(&model.predict(x)?, truth))
}
