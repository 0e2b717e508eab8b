//! Rolling per-team form features.
//!
//! Each team's rows are replayed oldest first through a [`TeamHistory`], so a
//! row's features only ever see that row and the ones before it. Venue and
//! head-to-head rates use strictly earlier rows; the global, trailing-window,
//! form and goal-difference rates include the row itself.

use std::collections::{HashMap, VecDeque};
use std::path::Path;

use anyhow::{Context, Result};

use crate::columns;
use crate::encoding::{Outcome, TargetWinner, TeamEncoder, Venue};
use crate::kickoff::KickoffKey;
use crate::table::{Cell, Table};

pub const DEFAULT_N_RECENT: usize = 5;
pub const NEUTRAL_RATE: f64 = 0.5;
/// Applied most-recent-first; shorter histories use the tail.
pub const FORM_WEIGHTS: [f64; 3] = [0.3, 0.2, 0.1];

const LEGACY_GOALS_FOR: &str = "Goals For";
const LEGACY_GOALS_AGAINST: &str = "Goals Against";

/// Feature values for one row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormFeatures {
    pub win_rate_global: f64,
    pub win_rate_last_n: f64,
    pub home_win_rate: f64,
    pub away_win_rate: f64,
    pub h2h_win_rate: f64,
    pub win_streak: u32,
    pub form_score: f64,
    pub goal_diff: f64,
    pub goal_diff_win_rate: f64,
    pub weighted_outcome: f64,
}

#[derive(Debug, Clone, Copy, Default)]
struct Tally {
    wins: usize,
    games: usize,
}

impl Tally {
    fn record(&mut self, win: bool) {
        self.games += 1;
        if win {
            self.wins += 1;
        }
    }

    fn rate(self) -> f64 {
        if self.games == 0 {
            NEUTRAL_RATE
        } else {
            self.wins as f64 / self.games as f64
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct RecentGame {
    win: bool,
    positive_goal_diff: bool,
}

/// Running state for one team's chronological replay.
#[derive(Debug, Clone)]
struct TeamHistory {
    n_recent: usize,
    overall: Tally,
    recent: VecDeque<RecentGame>,
    form: VecDeque<bool>,
    streak: u32,
    home: Tally,
    away: Tally,
    meetings: HashMap<String, Tally>,
}

impl TeamHistory {
    fn new(n_recent: usize) -> Self {
        Self {
            n_recent: n_recent.max(1),
            overall: Tally::default(),
            recent: VecDeque::with_capacity(n_recent),
            form: VecDeque::with_capacity(FORM_WEIGHTS.len()),
            streak: 0,
            home: Tally::default(),
            away: Tally::default(),
            meetings: HashMap::new(),
        }
    }

    fn advance(
        &mut self,
        opponent: &str,
        venue: Option<Venue>,
        win: bool,
        goal_diff: f64,
    ) -> FormFeatures {
        let h2h_win_rate = self
            .meetings
            .get(opponent)
            .copied()
            .unwrap_or_default()
            .rate();
        let home_win_rate = self.home.rate();
        let away_win_rate = self.away.rate();

        self.overall.record(win);
        self.meetings.entry(opponent.to_string()).or_default().record(win);
        match venue {
            Some(Venue::Home) => self.home.record(win),
            Some(Venue::Away) => self.away.record(win),
            None => {}
        }
        self.streak = if win { self.streak + 1 } else { 0 };

        self.recent.push_back(RecentGame {
            win,
            positive_goal_diff: goal_diff > 0.0,
        });
        while self.recent.len() > self.n_recent {
            self.recent.pop_front();
        }
        self.form.push_back(win);
        while self.form.len() > FORM_WEIGHTS.len() {
            self.form.pop_front();
        }

        let window = self.recent.len() as f64;
        let win_rate_last_n = self.recent.iter().filter(|g| g.win).count() as f64 / window;
        let goal_diff_win_rate =
            self.recent.iter().filter(|g| g.positive_goal_diff).count() as f64 / window;
        let form_score = self.form_score();

        FormFeatures {
            win_rate_global: self.overall.rate(),
            win_rate_last_n,
            home_win_rate,
            away_win_rate,
            h2h_win_rate,
            win_streak: self.streak,
            form_score,
            goal_diff,
            goal_diff_win_rate,
            weighted_outcome: 0.5 * win_rate_last_n + 0.3 * form_score + 0.2 * goal_diff_win_rate,
        }
    }

    fn form_score(&self) -> f64 {
        let weights = &FORM_WEIGHTS[FORM_WEIGHTS.len() - self.form.len()..];
        self.form
            .iter()
            .rev()
            .zip(weights)
            .map(|(win, w)| if *win { *w } else { 0.0 })
            .sum()
    }
}

#[derive(Debug, Clone)]
pub struct WinRateFeatureEngineer {
    n_recent: usize,
}

impl Default for WinRateFeatureEngineer {
    fn default() -> Self {
        Self::new(DEFAULT_N_RECENT)
    }
}

impl WinRateFeatureEngineer {
    pub fn new(n_recent: usize) -> Self {
        Self {
            n_recent: n_recent.max(1),
        }
    }

    /// Reads a preprocessed CSV and returns the engineered table.
    pub fn from_csv(&self, path: &Path) -> Result<Table> {
        let table = Table::read_csv(path)
            .with_context(|| format!("load preprocessed table {}", path.display()))?;
        self.engineer(table)
    }

    /// Encoding followed by feature creation.
    pub fn engineer(&self, mut table: Table) -> Result<Table> {
        table.rename_column(LEGACY_GOALS_FOR, columns::TEAM_GOALS);
        table.rename_column(LEGACY_GOALS_AGAINST, columns::OPPONENT_GOALS);
        encode_columns(&mut table)?;
        self.create_winrate_features(&table)
    }

    /// Returns a new table sorted by team then kickoff, with the form feature
    /// columns added (or overwritten). The input is left untouched.
    pub fn create_winrate_features(&self, table: &Table) -> Result<Table> {
        let team_col = table.require_column(columns::TEAM)?;
        let opp_col = table.require_column(columns::OPPONENT)?;
        let goals_col = table.require_column(columns::TEAM_GOALS)?;
        let against_col = table.require_column(columns::OPPONENT_GOALS)?;
        let date_col = table.column_index(columns::DATE);
        let time_col = table.column_index(columns::TIME);
        let venue_col = table.column_index(columns::VENUE);
        let outcome_col = table.column_index(columns::OUTCOME);

        let mut order: Vec<(String, KickoffKey, usize)> = (0..table.len())
            .map(|idx| {
                let row = table.row(idx);
                let kickoff = KickoffKey::from_cells(
                    date_col.map(|c| &row[c]),
                    time_col.map(|c| &row[c]),
                );
                (row[team_col].render(), kickoff, idx)
            })
            .collect();
        order.sort();
        let order: Vec<usize> = order.into_iter().map(|(_, _, idx)| idx).collect();
        let mut out = table.select_rows(&order);

        let mut features = Vec::with_capacity(out.len());
        let mut current_team: Option<String> = None;
        let mut history = TeamHistory::new(self.n_recent);
        for row in out.rows() {
            let team = row[team_col].render();
            if current_team.as_deref() != Some(team.as_str()) {
                history = TeamHistory::new(self.n_recent);
                current_team = Some(team);
            }
            let goals_for = row[goals_col].as_f64().unwrap_or(0.0);
            let goals_against = row[against_col].as_f64().unwrap_or(0.0);
            let win = outcome_col
                .and_then(|c| Outcome::from_label(&row[c].render()))
                .map_or(goals_for > goals_against, Outcome::is_win);
            let venue = venue_col.and_then(|c| Venue::from_label(&row[c].render()));
            features.push(history.advance(
                &row[opp_col].render(),
                venue,
                win,
                goals_for - goals_against,
            ));
        }

        let column = |f: fn(&FormFeatures) -> f64| -> Vec<Cell> {
            features.iter().map(|x| Cell::Number(f(x))).collect()
        };
        out.set_column(columns::WIN_RATE_GLOBAL, column(|f| f.win_rate_global));
        out.set_column(columns::WIN_RATE_LAST_N, column(|f| f.win_rate_last_n));
        out.set_column(columns::HOME_WIN_RATE, column(|f| f.home_win_rate));
        out.set_column(columns::AWAY_WIN_RATE, column(|f| f.away_win_rate));
        out.set_column(columns::H2H_WIN_RATE, column(|f| f.h2h_win_rate));
        out.set_column(columns::WIN_STREAK, column(|f| f.win_streak as f64));
        out.set_column(columns::FORM_SCORE, column(|f| f.form_score));
        out.set_column(columns::GOAL_DIFF, column(|f| f.goal_diff));
        out.set_column(columns::GOAL_DIFF_WIN_RATE, column(|f| f.goal_diff_win_rate));
        out.set_column(columns::WEIGHTED_OUTCOME, column(|f| f.weighted_outcome));
        Ok(out)
    }
}

/// Adds the integer encodings of team, opponent, venue, outcome and winner.
/// Labels outside the known vocabularies are left blank.
pub fn encode_columns(table: &mut Table) -> Result<TeamEncoder> {
    let team_col = table.require_column(columns::TEAM)?;
    let opp_col = table.require_column(columns::OPPONENT)?;

    let names: Vec<String> = table
        .column_cells(team_col)
        .chain(table.column_cells(opp_col))
        .map(Cell::render)
        .collect();
    let encoder = TeamEncoder::fit(names.iter().map(String::as_str));

    let index_of = |col: usize| -> Vec<Cell> {
        table
            .column_cells(col)
            .map(|c| Cell::from_opt(encoder.encode(&c.render()).map(|i| i as f64)))
            .collect()
    };
    let team_codes = index_of(team_col);
    let opp_codes = index_of(opp_col);

    let labels = |name: &str, f: &dyn Fn(&str) -> Option<u8>| -> Vec<Cell> {
        match table.column_index(name) {
            Some(col) => table
                .column_cells(col)
                .map(|c| Cell::from_opt(f(&c.render())))
                .collect(),
            None => vec![Cell::Empty; table.len()],
        }
    };
    let home_codes = labels(columns::VENUE, &|s: &str| Venue::from_label(s).map(Venue::encoded));
    let outcome_codes = labels(columns::OUTCOME, &|s: &str| {
        Outcome::from_label(s).map(Outcome::encoded)
    });
    let target_codes = labels(columns::TARGET_WINNER, &|s: &str| {
        TargetWinner::from_label(s).map(TargetWinner::encoded)
    });

    table.set_column(columns::TEAM_ENCODED, team_codes);
    table.set_column(columns::OPPONENT_ENCODED, opp_codes);
    table.set_column(columns::HOME_ENCODED, home_codes);
    table.set_column(columns::OUTCOME_ENCODED, outcome_codes);
    table.set_column(columns::TARGET_ENCODED, target_codes);
    Ok(encoder)
}
