mod common;

use std::path::{Path, PathBuf};

use league_forecast::config::PipelineConfig;
use league_forecast::forest::holdout_split;
use league_forecast::pipeline::run_pipeline;
use league_forecast::prediction_log;
use league_forecast::predictor::{MatchPredictor, StatTarget};
use league_forecast::table::Table;

const LEAGUE: &str = "test-league-2024-2025";

fn trained(dir: &Path) -> (PipelineConfig, MatchPredictor) {
    common::write_league(dir, LEAGUE, &common::season_matches());
    let cfg = PipelineConfig {
        data_dir: dir.to_path_buf(),
        leagues: vec![LEAGUE.to_string()],
        n_trees: 12,
        prediction_log: dir.join("predictions_log.csv"),
        ..PipelineConfig::default()
    };
    let summary = run_pipeline(&cfg);
    let mut predictor =
        MatchPredictor::from_csv_paths(&summary.feature_paths(), cfg.predictor_config())
            .expect("load features");
    predictor.train_models().expect("train");
    (cfg, predictor)
}

#[test]
fn forecast_is_a_distribution_with_capped_score() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (_, predictor) = trained(dir.path());

    let result = predictor
        .predict_future_match("alpha", " Bravo ")
        .expect("known teams");
    assert_eq!(result.home_team, "Alpha");
    assert_eq!(result.away_team, "Bravo");
    assert!((result.probabilities.sum() - 1.0).abs() < 1e-9);
    assert!(result.goals <= 6);

    let parts: Vec<i64> = result
        .score
        .split(':')
        .map(|p| p.parse().expect("integer score part"))
        .collect();
    assert_eq!(parts.len(), 2);
    assert!(parts.iter().all(|g| (0..=5).contains(g)));

    for target in StatTarget::ALL {
        assert!(result.stats.home.contains_key(&target), "{target:?} home");
        assert!(result.stats.away.contains_key(&target), "{target:?} away");
    }
}

#[test]
fn unknown_team_yields_no_forecast() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (_, predictor) = trained(dir.path());
    assert!(predictor.predict_future_match("Alpha", "Zulu").is_none());
    let err = predictor.try_predict("Zulu", "Alpha").expect_err("unknown team");
    assert!(err.is_insufficient_data());
}

#[test]
fn holdout_export_fills_test_rows_only() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (cfg, predictor) = trained(dir.path());
    let path: PathBuf = cfg.data_dir.join("all_predictions.csv");
    let exported = predictor
        .export_holdout_predictions(&path)
        .expect("export");

    let reread = Table::read_csv(&path).expect("read export");
    assert_eq!(reread.len(), exported.len());
    for col in [
        "Predicted_outcome",
        "Predicted_goals",
        "Predicted_score",
        "Predicted_corners_home",
        "Predicted_xg_away",
    ] {
        assert!(reread.has_column(col), "{col} missing");
    }

    let col = reread
        .column_index("Predicted_outcome")
        .expect("outcome column");
    let filled = reread.column_cells(col).filter(|c| !c.is_empty()).count();
    let (_, test) = holdout_split(reread.len(), cfg.test_fraction, cfg.seed).expect("split");
    assert!(filled > 0);
    assert_eq!(filled, test.len());
}

#[test]
fn logged_forecasts_append_under_one_header() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (cfg, predictor) = trained(dir.path());
    for (home, away) in [("Alpha", "Bravo"), ("Delta", "Echo")] {
        let result = predictor
            .predict_future_match(home, away)
            .expect("known teams");
        prediction_log::append(&cfg.prediction_log, "2025-06-01", "18:00", &result)
            .expect("append");
    }
    let log = Table::read_csv(&cfg.prediction_log).expect("read log");
    assert_eq!(log.len(), 2);
    assert_eq!(log.columns().len(), prediction_log::header().len());
    assert_eq!(
        log.value(1, "home_team").map(|c| c.render()).as_deref(),
        Some("Delta")
    );
}

#[test]
fn training_is_reproducible_for_a_fixed_seed() {
    let a = tempfile::tempdir().expect("tempdir");
    let b = tempfile::tempdir().expect("tempdir");
    let (_, first) = trained(a.path());
    let (_, second) = trained(b.path());
    let x = first.predict_future_match("Charlie", "Foxtrot").expect("forecast");
    let y = second.predict_future_match("Charlie", "Foxtrot").expect("forecast");
    assert_eq!(x, y);
}
