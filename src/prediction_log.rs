//! Append-only CSV history of served forecasts.

use std::fs::OpenOptions;
use std::path::Path;

use anyhow::{Context, Result};

use crate::predictor::{PredictionResult, StatTarget};

pub fn header() -> Vec<String> {
    let mut cols: Vec<String> = [
        "date",
        "time",
        "home_team",
        "away_team",
        "predicted_outcome",
        "prob_home_win",
        "prob_draw",
        "prob_away_win",
        "predicted_score",
        "predicted_goals",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    for side in ["home", "away"] {
        for target in StatTarget::ALL {
            cols.push(format!("{side}_{}", target.key()));
        }
    }
    cols
}

pub fn record(date: &str, time: &str, result: &PredictionResult) -> Vec<String> {
    let mut row = vec![
        date.trim().to_string(),
        time.trim().to_string(),
        result.home_team.clone(),
        result.away_team.clone(),
        result.outcome.label().to_string(),
        format!("{:.3}", result.probabilities.home),
        format!("{:.3}", result.probabilities.draw),
        format!("{:.3}", result.probabilities.away),
        result.score.clone(),
        result.goals_label(),
    ];
    for side in [&result.stats.home, &result.stats.away] {
        for target in StatTarget::ALL {
            row.push(side.get(&target).map(|v| format!("{v:.3}")).unwrap_or_default());
        }
    }
    row
}

/// Appends one forecast, writing the header first when the file is new or
/// empty.
pub fn append(path: &Path, date: &str, time: &str, result: &PredictionResult) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create {}", parent.display()))?;
    }
    let needs_header = std::fs::metadata(path).map_or(true, |m| m.len() == 0);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open prediction log {}", path.display()))?;
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
    if needs_header {
        writer.write_record(header()).context("write prediction log header")?;
    }
    writer
        .write_record(record(date, time, result))
        .context("write prediction log row")?;
    writer.flush().context("flush prediction log")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::{append, header};
    use crate::metrics::{MatchOutcome, Prob3};
    use crate::predictor::{PredictionResult, StatPredictions, StatTarget};

    fn sample() -> PredictionResult {
        let mut home = BTreeMap::new();
        home.insert(StatTarget::Corners, 5.25);
        PredictionResult {
            home_team: "Alpha".to_string(),
            away_team: "Beta".to_string(),
            outcome: MatchOutcome::HomeWin,
            probabilities: Prob3 {
                home: 0.5,
                draw: 0.3,
                away: 0.2,
            },
            goals: 6,
            score: "2:1".to_string(),
            stats: StatPredictions {
                home,
                away: BTreeMap::new(),
            },
        }
    }

    #[test]
    fn header_written_once() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("log").join("predictions_log.csv");
        append(&path, "2025-08-01", "20:00", &sample()).expect("first append");
        append(&path, "2025-08-02", "18:00", &sample()).expect("second append");
        let raw = std::fs::read_to_string(&path).expect("read log");
        let lines: Vec<&str> = raw.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].split(',').count(), header().len());
        assert!(lines[1].starts_with("2025-08-01,20:00,Alpha,Beta,Home win,0.500,0.300,0.200,2:1,6+,5.250,"));
    }

    #[test]
    fn unwritable_log_dir_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let blocker = dir.path().join("log");
        std::fs::write(&blocker, "").expect("write");
        let err = append(&blocker.join("predictions_log.csv"), "2025-08-01", "20:00", &sample())
            .expect_err("parent is a file");
        assert!(format!("{err:#}").contains("create"));
    }
}
