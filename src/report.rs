//! Console rendering shared by the binaries.

use crate::predictor::{PredictionResult, StatTarget, TrainingReport};

pub fn training_summary(report: &TrainingReport) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "trained on {} rows ({} train / {} test, {} features)\n",
        report.rows,
        report.train_rows,
        report.test_rows,
        report.features.len()
    ));
    out.push_str(&format!(
        "outcome   acc {:.3}  brier {:.3}  logloss {:.3}\n",
        report.outcome.accuracy, report.outcome.brier, report.outcome.log_loss
    ));
    out.push_str(&format!("goals     acc {:.3}\n", report.goals_accuracy));
    out.push_str(&format!("score     acc {:.3}\n", report.score_accuracy));
    for stat in &report.stats {
        out.push_str(&format!(
            "{:<22} mae {:.3}  r2 {:.3}\n",
            stat.model, stat.metrics.mae, stat.metrics.r2
        ));
    }
    if !report.skipped.is_empty() {
        out.push_str(&format!("no data for: {}\n", report.skipped.join(", ")));
    }
    out
}

pub fn prediction_summary(result: &PredictionResult) -> String {
    let p = &result.probabilities;
    let mut out = format!(
        "{} vs {}\n  outcome: {}  (home {:.1}% / draw {:.1}% / away {:.1}%)\n  score: {}  total goals: {}\n",
        result.home_team,
        result.away_team,
        result.outcome.label(),
        p.home * 100.0,
        p.draw * 100.0,
        p.away * 100.0,
        result.score,
        result.goals_label()
    );
    for target in StatTarget::ALL {
        let home = result.stats.home.get(&target);
        let away = result.stats.away.get(&target);
        if home.is_none() && away.is_none() {
            continue;
        }
        let fmt = |v: Option<&f64>| v.map(|v| format!("{v:.2}")).unwrap_or_else(|| "-".to_string());
        out.push_str(&format!(
            "  {:<16} {:>8} | {:<8}\n",
            target.key(),
            fmt(home),
            fmt(away)
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::prediction_summary;
    use crate::metrics::{MatchOutcome, Prob3};
    use crate::predictor::{PredictionResult, StatPredictions, StatTarget};

    #[test]
    fn only_predicted_stats_are_listed() {
        let mut home = BTreeMap::new();
        home.insert(StatTarget::Corners, 4.5);
        let result = PredictionResult {
            home_team: "Alpha".to_string(),
            away_team: "Beta".to_string(),
            outcome: MatchOutcome::Draw,
            probabilities: Prob3::uniform(),
            goals: 2,
            score: "1:1".to_string(),
            stats: StatPredictions {
                home,
                away: BTreeMap::new(),
            },
        };
        let text = prediction_summary(&result);
        assert!(text.starts_with("Alpha vs Beta\n"));
        assert!(text.contains("outcome: Draw"));
        assert!(text.contains("corners"));
        assert!(text.contains("4.50"));
        assert!(!text.contains("passes"));
    }
}
