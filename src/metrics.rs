use serde::Serialize;

/// Match result from the home side's point of view, encoded draw = 0,
/// home win = 1, away win = 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MatchOutcome {
    Draw,
    HomeWin,
    AwayWin,
}

impl MatchOutcome {
    pub fn from_goals(home_goals: f64, away_goals: f64) -> Self {
        if home_goals > away_goals {
            MatchOutcome::HomeWin
        } else if home_goals < away_goals {
            MatchOutcome::AwayWin
        } else {
            MatchOutcome::Draw
        }
    }

    pub fn from_class(class: u8) -> Option<Self> {
        match class {
            0 => Some(MatchOutcome::Draw),
            1 => Some(MatchOutcome::HomeWin),
            2 => Some(MatchOutcome::AwayWin),
            _ => None,
        }
    }

    pub fn class(self) -> u8 {
        match self {
            MatchOutcome::Draw => 0,
            MatchOutcome::HomeWin => 1,
            MatchOutcome::AwayWin => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MatchOutcome::Draw => "Draw",
            MatchOutcome::HomeWin => "Home win",
            MatchOutcome::AwayWin => "Away win",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Prob3 {
    pub home: f64,
    pub draw: f64,
    pub away: f64,
}

impl Prob3 {
    pub fn uniform() -> Self {
        Self {
            home: 1.0 / 3.0,
            draw: 1.0 / 3.0,
            away: 1.0 / 3.0,
        }
    }

    /// Maps a classifier's probability vector onto the three outcomes. Classes
    /// the model never saw read as 0.
    pub fn from_classes(classes: &[u8], proba: &[f64]) -> Self {
        let mut out = Self {
            home: 0.0,
            draw: 0.0,
            away: 0.0,
        };
        for (class, p) in classes.iter().zip(proba) {
            match MatchOutcome::from_class(*class) {
                Some(MatchOutcome::HomeWin) => out.home = *p,
                Some(MatchOutcome::Draw) => out.draw = *p,
                Some(MatchOutcome::AwayWin) => out.away = *p,
                None => {}
            }
        }
        out
    }

    pub fn sum(&self) -> f64 {
        self.home + self.draw + self.away
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Metrics {
    pub samples: usize,
    pub brier: f64,
    pub log_loss: f64,
    pub accuracy: f64,
}

impl Metrics {
    fn empty() -> Self {
        Self {
            samples: 0,
            brier: 0.0,
            log_loss: 0.0,
            accuracy: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RegressionMetrics {
    pub samples: usize,
    pub mae: f64,
    pub r2: f64,
}

pub fn evaluate_probs(predictions: &[Prob3], outcomes: &[MatchOutcome]) -> Metrics {
    if predictions.is_empty() || predictions.len() != outcomes.len() {
        return Metrics::empty();
    }

    let mut brier_sum = 0.0_f64;
    let mut log_loss_sum = 0.0_f64;
    let mut correct = 0usize;

    for (p, outcome) in predictions.iter().zip(outcomes) {
        let y = one_hot(*outcome);
        brier_sum +=
            (p.home - y.home).powi(2) + (p.draw - y.draw).powi(2) + (p.away - y.away).powi(2);

        let actual_prob = match outcome {
            MatchOutcome::HomeWin => p.home,
            MatchOutcome::Draw => p.draw,
            MatchOutcome::AwayWin => p.away,
        }
        .clamp(1e-12, 1.0);
        log_loss_sum += -actual_prob.ln();

        if argmax(*p) == *outcome {
            correct += 1;
        }
    }

    let n = predictions.len() as f64;
    Metrics {
        samples: predictions.len(),
        brier: brier_sum / n,
        log_loss: log_loss_sum / n,
        accuracy: correct as f64 / n,
    }
}

pub fn accuracy<T: PartialEq>(predicted: &[T], actual: &[T]) -> f64 {
    if predicted.is_empty() || predicted.len() != actual.len() {
        return 0.0;
    }
    let hits = predicted.iter().zip(actual).filter(|(p, a)| p == a).count();
    hits as f64 / predicted.len() as f64
}

/// MAE and coefficient of determination. A constant target gives R² = 0 unless
/// the predictions match it exactly.
pub fn evaluate_regression(predicted: &[f64], actual: &[f64]) -> RegressionMetrics {
    if predicted.is_empty() || predicted.len() != actual.len() {
        return RegressionMetrics {
            samples: 0,
            mae: 0.0,
            r2: 0.0,
        };
    }
    let n = actual.len() as f64;
    let mean = actual.iter().sum::<f64>() / n;
    let mut abs_sum = 0.0;
    let mut ss_res = 0.0;
    let mut ss_tot = 0.0;
    for (p, a) in predicted.iter().zip(actual) {
        abs_sum += (p - a).abs();
        ss_res += (a - p).powi(2);
        ss_tot += (a - mean).powi(2);
    }
    let r2 = if ss_tot > 0.0 {
        1.0 - ss_res / ss_tot
    } else if ss_res == 0.0 {
        1.0
    } else {
        0.0
    };
    RegressionMetrics {
        samples: predicted.len(),
        mae: abs_sum / n,
        r2,
    }
}

fn argmax(p: Prob3) -> MatchOutcome {
    if p.home >= p.draw && p.home >= p.away {
        MatchOutcome::HomeWin
    } else if p.draw >= p.away {
        MatchOutcome::Draw
    } else {
        MatchOutcome::AwayWin
    }
}

fn one_hot(outcome: MatchOutcome) -> Prob3 {
    match outcome {
        MatchOutcome::HomeWin => Prob3 {
            home: 1.0,
            draw: 0.0,
            away: 0.0,
        },
        MatchOutcome::Draw => Prob3 {
            home: 0.0,
            draw: 1.0,
            away: 0.0,
        },
        MatchOutcome::AwayWin => Prob3 {
            home: 0.0,
            draw: 0.0,
            away: 1.0,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::{MatchOutcome, Prob3, evaluate_probs, evaluate_regression};

    #[test]
    fn perfect_predictions_have_zero_brier() {
        let preds = vec![
            Prob3 {
                home: 1.0,
                draw: 0.0,
                away: 0.0,
            },
            Prob3 {
                home: 0.0,
                draw: 1.0,
                away: 0.0,
            },
        ];
        let outcomes = vec![MatchOutcome::HomeWin, MatchOutcome::Draw];
        let m = evaluate_probs(&preds, &outcomes);
        assert_eq!(m.samples, 2);
        assert!(m.brier < 1e-12);
        assert_eq!(m.accuracy, 1.0);
    }

    #[test]
    fn unseen_classes_read_as_zero() {
        let p = Prob3::from_classes(&[0, 1], &[0.25, 0.75]);
        assert_eq!(p.draw, 0.25);
        assert_eq!(p.home, 0.75);
        assert_eq!(p.away, 0.0);
    }

    #[test]
    fn regression_metrics_on_exact_fit() {
        let m = evaluate_regression(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]);
        assert_eq!(m.mae, 0.0);
        assert_eq!(m.r2, 1.0);
        let off = evaluate_regression(&[2.0, 2.0, 2.0], &[1.0, 2.0, 3.0]);
        assert!((off.mae - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(off.r2, 0.0);
    }
}
