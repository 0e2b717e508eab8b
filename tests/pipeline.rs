mod common;

use std::path::Path;

use league_forecast::config::PipelineConfig;
use league_forecast::pipeline::{LeaguePaths, LeagueStatus, run_pipeline, upcoming_fixtures};
use league_forecast::table::Table;
use serde_json::json;

const LEAGUE: &str = "test-league-2024-2025";

fn config(dir: &Path, leagues: &[&str]) -> PipelineConfig {
    PipelineConfig {
        data_dir: dir.to_path_buf(),
        leagues: leagues.iter().map(|s| s.to_string()).collect(),
        prediction_log: dir.join("predictions_log.csv"),
        ..PipelineConfig::default()
    }
}

#[test]
fn missing_league_is_skipped_and_rerun_reuses_outputs() {
    let dir = tempfile::tempdir().expect("tempdir");
    common::write_league(dir.path(), LEAGUE, &common::season_matches());
    let cfg = config(dir.path(), &[LEAGUE, "ghost-league-2024-2025"]);

    let first = run_pipeline(&cfg);
    assert_eq!(first.runs.len(), 2);
    assert_eq!(first.runs[0].status, LeagueStatus::Built);
    match &first.runs[1].status {
        LeagueStatus::Skipped(reason) => assert!(reason.contains("no data available")),
        other => panic!("expected skip, got {other:?}"),
    }
    assert_eq!(first.skipped(), 1);

    let paths = LeaguePaths::new(dir.path(), LEAGUE);
    assert_eq!(first.feature_paths(), vec![paths.features.clone()]);
    let before = std::fs::read(&paths.features).expect("features written");

    let second = run_pipeline(&cfg);
    assert_eq!(second.runs[0].status, LeagueStatus::Reused);
    let after = std::fs::read(&paths.features).expect("features still there");
    assert_eq!(before, after);
}

#[test]
fn stage_outputs_follow_naming_convention() {
    let dir = tempfile::tempdir().expect("tempdir");
    common::write_league(dir.path(), LEAGUE, &common::season_matches());
    run_pipeline(&config(dir.path(), &[LEAGUE]));

    for name in [
        format!("standings-with-matches-{LEAGUE}-clean.csv"),
        format!("standings-with-matches-{LEAGUE}-cleaned.csv"),
        format!("standings-with-winrate-features-{LEAGUE}.csv"),
    ] {
        assert!(dir.path().join(&name).exists(), "{name} missing");
    }
}

#[test]
fn feature_table_has_two_rows_per_match_and_neutral_first_rows() {
    let dir = tempfile::tempdir().expect("tempdir");
    let matches = common::season_matches();
    common::write_league(dir.path(), LEAGUE, &matches);
    run_pipeline(&config(dir.path(), &[LEAGUE]));

    let paths = LeaguePaths::new(dir.path(), LEAGUE);
    let table = Table::read_csv(&paths.features).expect("read features");
    assert_eq!(table.len(), matches.len() * 2);

    for col in [
        "win_rate_global",
        "win_rate_lastN",
        "home_win_rate",
        "away_win_rate",
        "h2h_win_rate",
        "form_score",
        "weighted_outcome",
        "Team_encoded",
        "Outcome_encoded",
    ] {
        assert!(table.has_column(col), "{col} missing");
    }

    // Rows are grouped by team; the first row of each group has no history.
    let mut seen = std::collections::HashSet::new();
    for idx in 0..table.len() {
        let team = table.value(idx, "Team").expect("team").render();
        if seen.insert(team.clone()) {
            for col in ["home_win_rate", "away_win_rate", "h2h_win_rate"] {
                let v = table.value(idx, col).and_then(|c| c.as_f64());
                assert_eq!(v, Some(0.5), "{team} first row {col}");
            }
        }
    }
    assert_eq!(seen.len(), common::TEAMS.len());
}

#[test]
fn possession_percentages_become_fractions() {
    let dir = tempfile::tempdir().expect("tempdir");
    common::write_league(dir.path(), LEAGUE, &common::season_matches());
    run_pipeline(&config(dir.path(), &[LEAGUE]));

    let paths = LeaguePaths::new(dir.path(), LEAGUE);
    let table = Table::read_csv(&paths.flattened).expect("read flattened");
    let col = table
        .column_index("stat_Ball_Possession_team")
        .expect("possession column");
    for cell in table.column_cells(col) {
        let v = cell.as_f64().expect("numeric possession");
        assert!((0.0..=1.0).contains(&v), "possession {v} out of range");
    }
}

#[test]
fn fixtures_file_lists_unplayed_matches_only() {
    let dir = tempfile::tempdir().expect("tempdir");
    let paths = LeaguePaths::new(dir.path(), LEAGUE);
    assert!(upcoming_fixtures(&paths).expect("no file is fine").is_empty());

    let fixtures = json!([
        {"date": "01.06.2025", "time": "18:00", "home": "Alpha", "away": "Bravo"},
        {"date": "02.06.2025", "time": "18:00", "home": "Charlie", "away": "Delta",
         "home_goals": 1, "away_goals": 0}
    ]);
    std::fs::write(&paths.fixtures, fixtures.to_string()).expect("write fixtures");
    let upcoming = upcoming_fixtures(&paths).expect("parse fixtures");
    assert_eq!(upcoming.len(), 1);
    assert_eq!(upcoming[0].home, "Alpha");
}
