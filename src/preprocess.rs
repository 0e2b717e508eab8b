//! Numeric cleanup between the flattened table and feature engineering.
//!
//! The steps are meant to run in declaration order; [`MatchPreprocessor::run`]
//! applies the standard chain.

use std::path::Path;

use anyhow::{Context, Result};

use crate::columns;
use crate::table::{Cell, Table, extract_decimal, strip_to_number};

pub const DEFAULT_ZERO_THRESHOLD: f64 = 0.95;
pub const DEFAULT_LARGE_STAT_THRESHOLD: f64 = 100.0;
const RESCALE_EPSILON: f64 = 1e-6;

/// Columns each step touched, for logging and tests.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreprocessReport {
    pub split_goals: bool,
    pub dropped: Vec<String>,
    pub rescaled: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct MatchPreprocessor {
    table: Table,
    zero_threshold: f64,
    report: PreprocessReport,
}

impl MatchPreprocessor {
    pub fn from_csv(path: &Path) -> Result<Self> {
        let table = Table::read_csv(path)
            .with_context(|| format!("load cleaned table {}", path.display()))?;
        Ok(Self::from_table(table))
    }

    pub fn from_table(table: Table) -> Self {
        Self {
            table,
            zero_threshold: DEFAULT_ZERO_THRESHOLD,
            report: PreprocessReport::default(),
        }
    }

    pub fn with_zero_threshold(mut self, threshold: f64) -> Self {
        self.zero_threshold = threshold;
        self
    }

    /// Standard chain: fill with 0, coerce, split goals, drop zero-heavy
    /// columns, rescale large stats.
    pub fn run(self, large_stat_threshold: f64) -> Self {
        self.fill_missing(0.0)
            .convert_numeric_and_percentage()
            .split_goals_column()
            .drop_zero_heavy_columns()
            .normalize_large_stats(large_stat_threshold)
    }

    pub fn fill_missing(mut self, value: f64) -> Self {
        for col in 0..self.table.columns().len() {
            self.table.map_column(col, |cell| match cell {
                Cell::Empty => Cell::Number(value),
                other => other.clone(),
            });
        }
        self
    }

    /// Percentage columns become fractions; every other non-identity column is
    /// forced numeric with unparsable cells set to 0.
    pub fn convert_numeric_and_percentage(mut self) -> Self {
        for col in 0..self.table.columns().len() {
            if columns::IDENTITY.contains(&self.table.columns()[col].as_str()) {
                continue;
            }
            let has_percent = self
                .table
                .column_cells(col)
                .any(|cell| cell.render().contains('%'));
            if has_percent {
                self.table.map_column(col, |cell| {
                    Cell::Number(extract_decimal(&cell.render()).map_or(0.0, |v| v / 100.0))
                });
            } else {
                self.table.map_column(col, |cell| match cell {
                    Cell::Number(v) => Cell::Number(*v),
                    other => Cell::Number(strip_to_number(&other.render()).unwrap_or(0.0)),
                });
            }
        }
        self
    }

    pub fn split_goals_column(mut self) -> Self {
        let Some(col) = self.table.column_index(columns::COMPOSITE_GOALS) else {
            return self;
        };
        let (home, away): (Vec<Cell>, Vec<Cell>) = self
            .table
            .column_cells(col)
            .map(|cell| {
                let (h, a) = split_composite_goals(&cell.render());
                (Cell::Number(h as f64), Cell::Number(a as f64))
            })
            .unzip();
        self.table
            .drop_columns(&[columns::COMPOSITE_GOALS.to_string()]);
        self.table.set_column(columns::COMPOSITE_GOALS_HOME, home);
        self.table.set_column(columns::COMPOSITE_GOALS_AWAY, away);
        self.report.split_goals = true;
        log::info!(
            "split `{}` into {} / {}",
            columns::COMPOSITE_GOALS,
            columns::COMPOSITE_GOALS_HOME,
            columns::COMPOSITE_GOALS_AWAY
        );
        self
    }

    /// Drops columns whose share of zero cells is strictly above the threshold.
    pub fn drop_zero_heavy_columns(mut self) -> Self {
        if self.table.is_empty() {
            return self;
        }
        let rows = self.table.len() as f64;
        let doomed: Vec<String> = self
            .table
            .columns()
            .iter()
            .enumerate()
            .filter(|(_, name)| !columns::PROTECTED.contains(&name.as_str()))
            .filter(|(col, _)| {
                let zeros = self.table.column_cells(*col).filter(|c| c.is_zero()).count();
                zeros as f64 / rows > self.zero_threshold
            })
            .map(|(_, name)| name.clone())
            .collect();
        if !doomed.is_empty() {
            log::info!(
                "dropping {} columns with >{:.0}% zeros: {:?}",
                doomed.len(),
                self.zero_threshold * 100.0,
                doomed
            );
            self.table.drop_columns(&doomed);
            self.report.dropped.extend(doomed);
        }
        self
    }

    pub fn normalize_large_stats(mut self, threshold: f64) -> Self {
        for col in 0..self.table.columns().len() {
            let name = self.table.columns()[col].clone();
            if columns::PROTECTED.contains(&name.as_str()) || !self.table.is_numeric_column(col) {
                continue;
            }
            let max = self
                .table
                .column_cells(col)
                .filter_map(Cell::as_f64)
                .fold(f64::NEG_INFINITY, f64::max);
            if max > threshold {
                let denom = max + RESCALE_EPSILON;
                self.table.map_column(col, |cell| match cell {
                    Cell::Number(v) => Cell::Number(v / denom),
                    other => other.clone(),
                });
                self.report.rescaled.push(name);
            }
        }
        if !self.report.rescaled.is_empty() {
            log::info!("rescaled large stats: {:?}", self.report.rescaled);
        }
        self
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn report(&self) -> &PreprocessReport {
        &self.report
    }

    pub fn into_table(self) -> Table {
        self.table
    }

    pub fn save_csv(&self, path: &Path) -> Result<()> {
        self.table
            .write_csv(path)
            .with_context(|| format!("save preprocessed table {}", path.display()))?;
        log::info!("preprocessed table saved to {}", path.display());
        Ok(())
    }
}

/// `"2:1"` → (2, 1). A bare number such as `"21"` or `"1012"` is split in the
/// middle of its digits. Anything else is 0–0.
pub fn split_composite_goals(raw: &str) -> (i64, i64) {
    let s = raw.trim();
    if let Some((h, a)) = s.split_once(':') {
        return (
            h.trim().parse().unwrap_or(0),
            a.trim().parse().unwrap_or(0),
        );
    }
    let Some(value) = s.parse::<f64>().ok().filter(|v| v.is_finite() && *v >= 0.0) else {
        return (0, 0);
    };
    let digits = format!("{}", value.trunc() as i64);
    let mid = digits.len().div_ceil(2);
    let (h, a) = digits.split_at(mid);
    (h.parse().unwrap_or(0), a.parse().unwrap_or(0))
}
