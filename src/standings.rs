//! Standings + results → one row per (team, match).

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use anyhow::{Context, Result};

use crate::columns;
use crate::encoding::{Outcome, TargetWinner, Venue};
use crate::error::ForecastError;
use crate::raw::{self, MatchRecord, StandingsRow};
use crate::table::{Cell, Table, extract_decimal};

/// Raw statistic values for one normalized label, already turned to the row
/// team's perspective.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SideStat {
    pub team: String,
    pub opponent: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TeamMatchRow {
    pub rank: Option<i64>,
    pub team: String,
    pub wins: Option<i64>,
    pub draws: Option<i64>,
    pub losses: Option<i64>,
    pub season_goals_for: Option<i64>,
    pub season_goals_against: Option<i64>,
    pub goal_difference: Option<i64>,
    pub points: Option<i64>,
    pub opponent: String,
    pub opponent_rank: Option<i64>,
    pub date: String,
    pub time: String,
    pub venue: Venue,
    pub team_goals: i32,
    pub opponent_goals: i32,
    pub outcome: Outcome,
    pub target: TargetWinner,
    pub stats: BTreeMap<String, SideStat>,
}

impl TeamMatchRow {
    pub fn to_record(&self) -> Vec<(String, Cell)> {
        let num = |v: Option<i64>| Cell::from_opt(v.map(|n| n as f64));
        let mut record = vec![
            (columns::RANK.to_string(), num(self.rank)),
            (columns::TEAM.to_string(), Cell::text(self.team.clone())),
            (columns::WINS.to_string(), num(self.wins)),
            (columns::DRAWS.to_string(), num(self.draws)),
            (columns::LOSSES.to_string(), num(self.losses)),
            (columns::SEASON_GOALS_FOR.to_string(), num(self.season_goals_for)),
            (
                columns::SEASON_GOALS_AGAINST.to_string(),
                num(self.season_goals_against),
            ),
            (columns::GOAL_DIFFERENCE.to_string(), num(self.goal_difference)),
            (columns::POINTS.to_string(), num(self.points)),
            (columns::OPPONENT.to_string(), Cell::text(self.opponent.clone())),
            (columns::OPPONENT_RANK.to_string(), num(self.opponent_rank)),
            (columns::DATE.to_string(), Cell::text(self.date.clone())),
            (columns::TIME.to_string(), Cell::text(self.time.clone())),
            (columns::VENUE.to_string(), Cell::text(self.venue.label())),
            (
                columns::TEAM_GOALS.to_string(),
                Cell::Number(self.team_goals as f64),
            ),
            (
                columns::OPPONENT_GOALS.to_string(),
                Cell::Number(self.opponent_goals as f64),
            ),
            (columns::OUTCOME.to_string(), Cell::text(self.outcome.label())),
            (
                columns::TARGET_WINNER.to_string(),
                Cell::text(self.target.label()),
            ),
        ];
        for (label, value) in &self.stats {
            record.push((
                columns::stat_column(label, columns::TEAM_SUFFIX),
                Cell::parse(&value.team),
            ));
            record.push((
                columns::stat_column(label, columns::OPPONENT_SUFFIX),
                Cell::parse(&value.opponent),
            ));
        }
        record
    }
}

/// `"Ball Possession (%)"` → `"Ball_Possession"`.
pub fn normalize_stat_name(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_run = false;
    for ch in raw.trim().chars() {
        if ch.is_whitespace() || matches!(ch, '(' | ')' | '%') {
            if !in_run {
                out.push('_');
                in_run = true;
            }
        } else {
            out.push(ch);
            in_run = false;
        }
    }
    out.trim_matches('_').to_string()
}

/// Pairs every standings team with each match it played, oldest first.
/// Matches whose teams are missing from the standings only produce the row(s)
/// for the side that is listed.
pub fn flatten(standings: &[StandingsRow], matches: &[MatchRecord]) -> Vec<TeamMatchRow> {
    let rank_by_team: HashMap<&str, Option<i64>> = standings
        .iter()
        .map(|row| (row.team.as_str(), row.rank))
        .collect();

    let mut out = Vec::new();
    for standing in standings {
        let mut own: Vec<&MatchRecord> = matches
            .iter()
            .filter(|m| m.involves(&standing.team))
            .collect();
        own.sort_by_key(|m| m.kickoff());

        for record in own {
            let is_home = record.home == standing.team;
            let (venue, opponent) = if is_home {
                (Venue::Home, record.away.clone())
            } else {
                (Venue::Away, record.home.clone())
            };
            let (team_goals, opponent_goals) = match (record.home_goals, record.away_goals) {
                (Some(h), Some(a)) if is_home => (h, a),
                (Some(h), Some(a)) => (a, h),
                _ => (0, 0),
            };

            let mut stats = BTreeMap::new();
            for pair in &record.statistics {
                let label = normalize_stat_name(&pair.label);
                if label.is_empty() {
                    continue;
                }
                let side = if is_home {
                    SideStat {
                        team: pair.home_value.clone(),
                        opponent: pair.away_value.clone(),
                    }
                } else {
                    SideStat {
                        team: pair.away_value.clone(),
                        opponent: pair.home_value.clone(),
                    }
                };
                stats.insert(label, side);
            }

            out.push(TeamMatchRow {
                rank: standing.rank,
                team: standing.team.clone(),
                wins: standing.wins,
                draws: standing.draws,
                losses: standing.losses,
                season_goals_for: standing.goals_for,
                season_goals_against: standing.goals_against,
                goal_difference: standing.goal_difference,
                points: standing.points,
                opponent_rank: rank_by_team.get(opponent.as_str()).copied().flatten(),
                opponent,
                date: record.date.clone(),
                time: record.time.clone(),
                venue,
                team_goals,
                opponent_goals,
                outcome: Outcome::from_goals(team_goals, opponent_goals),
                target: TargetWinner::from_goals(team_goals, opponent_goals),
                stats,
            });
        }
    }
    out
}

/// Percentage columns become 0–1 fractions, then every blank is filled with 0.
pub fn clean_table(table: &mut Table) {
    for col in 0..table.columns().len() {
        let has_percent = table
            .column_cells(col)
            .any(|cell| cell.render().contains('%'));
        if has_percent {
            table.map_column(col, |cell| match cell {
                Cell::Number(v) => Cell::Number(v / 100.0),
                other => extract_decimal(&other.render())
                    .map(|v| Cell::Number(v / 100.0))
                    .unwrap_or_default(),
            });
        }
        table.map_column(col, |cell| match cell {
            Cell::Empty => Cell::Number(0.0),
            other => other.clone(),
        });
    }
}

#[derive(Debug, Clone)]
pub struct StandingsProcessor {
    standings: Vec<StandingsRow>,
    matches: Vec<MatchRecord>,
    table: Option<Table>,
}

impl StandingsProcessor {
    pub fn new(standings: Vec<StandingsRow>, matches: Vec<MatchRecord>) -> Self {
        Self {
            standings,
            matches,
            table: None,
        }
    }

    pub fn from_files(standings_path: &Path, matches_path: &Path) -> Result<Self> {
        let standings = raw::load_standings(standings_path)?;
        let matches = raw::load_matches(matches_path)?;
        Ok(Self::new(standings, matches))
    }

    pub fn rows(&self) -> Vec<TeamMatchRow> {
        flatten(&self.standings, &self.matches)
    }

    pub fn flatten_to_long(mut self) -> Self {
        let records = self.rows().iter().map(TeamMatchRow::to_record).collect::<Vec<_>>();
        self.table = Some(Table::from_records(records));
        self
    }

    pub fn clean(mut self) -> Result<Self> {
        let table = self
            .table
            .as_mut()
            .ok_or(ForecastError::InvalidState("call flatten_to_long() before clean()"))?;
        clean_table(table);
        Ok(self)
    }

    pub fn table(&self) -> Option<&Table> {
        self.table.as_ref()
    }

    pub fn into_table(self) -> Result<Table> {
        Ok(self
            .table
            .ok_or(ForecastError::InvalidState("nothing flattened yet"))?)
    }

    pub fn save_csv(&self, path: &Path) -> Result<()> {
        let table = self
            .table
            .as_ref()
            .ok_or(ForecastError::InvalidState("nothing flattened yet"))?;
        table
            .write_csv(path)
            .with_context(|| format!("save flattened table {}", path.display()))?;
        log::info!("flattened {} rows into {}", table.len(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{StandingsProcessor, flatten, normalize_stat_name};
    use crate::encoding::{Outcome, Venue};
    use crate::error::ForecastError;
    use crate::raw::{MatchRecord, StandingsRow, StatPair};
    use crate::table::Cell;

    fn standing(rank: i64, team: &str) -> StandingsRow {
        StandingsRow {
            rank: Some(rank),
            team: team.to_string(),
            played: Some(2),
            wins: Some(1),
            draws: Some(0),
            losses: Some(1),
            goals_for: Some(3),
            goals_against: Some(3),
            goal_difference: Some(0),
            points: Some(3),
            form: String::new(),
        }
    }

    fn game(date: &str, home: &str, away: &str, goals: Option<(i32, i32)>) -> MatchRecord {
        MatchRecord {
            date: date.to_string(),
            time: "18:00".to_string(),
            home: home.to_string(),
            away: away.to_string(),
            home_goals: goals.map(|g| g.0),
            away_goals: goals.map(|g| g.1),
            status: None,
            statistics: vec![StatPair {
                label: "Ball Possession (%)".to_string(),
                home_value: "60%".to_string(),
                away_value: "40%".to_string(),
            }],
        }
    }

    #[test]
    fn stat_labels_become_identifiers() {
        assert_eq!(normalize_stat_name(" Ball Possession (%) "), "Ball_Possession");
        assert_eq!(normalize_stat_name("Expected Goals (xG)"), "Expected_Goals_xG");
        assert_eq!(normalize_stat_name("Shots on target"), "Shots_on_target");
    }

    #[test]
    fn every_match_yields_mirrored_pair() {
        let standings = vec![standing(1, "Alpha"), standing(2, "Beta")];
        let matches = vec![
            game("10.08.2024", "Alpha", "Beta", Some((2, 1))),
            game("03.08.2024", "Beta", "Alpha", Some((1, 1))),
        ];
        let rows = flatten(&standings, &matches);
        assert_eq!(rows.len(), 4);

        // Alpha's rows come first, oldest first.
        assert_eq!(rows[0].team, "Alpha");
        assert_eq!(rows[0].date, "03.08.2024");
        assert_eq!(rows[0].venue, Venue::Away);
        assert_eq!(rows[0].outcome, Outcome::Draw);

        let alpha_win = &rows[1];
        let beta_loss = rows
            .iter()
            .find(|r| r.team == "Beta" && r.date == "10.08.2024")
            .expect("beta row");
        assert_eq!(
            (alpha_win.team_goals, alpha_win.opponent_goals),
            (beta_loss.opponent_goals, beta_loss.team_goals)
        );
        assert_eq!(alpha_win.outcome, Outcome::Win);
        assert_eq!(beta_loss.outcome, Outcome::Loss);
        assert_eq!(alpha_win.stats["Ball_Possession"].team, "60%");
        assert_eq!(beta_loss.stats["Ball_Possession"].team, "40%");
        assert_eq!(beta_loss.opponent_rank, Some(1));
    }

    #[test]
    fn missing_goals_default_to_goalless_draw() {
        let rows = flatten(
            &[standing(1, "Alpha")],
            &[game("01.08.2024", "Alpha", "Gamma", None)],
        );
        assert_eq!((rows[0].team_goals, rows[0].opponent_goals), (0, 0));
        assert_eq!(rows[0].outcome, Outcome::Draw);
        assert_eq!(rows[0].opponent_rank, None);
    }

    #[test]
    fn clean_requires_flatten_first() {
        let err = StandingsProcessor::new(Vec::new(), Vec::new())
            .clean()
            .expect_err("clean before flatten must fail");
        assert!(matches!(
            err.downcast_ref::<ForecastError>(),
            Some(ForecastError::InvalidState(_))
        ));
    }

    #[test]
    fn clean_turns_percentages_into_fractions_and_fills_blanks() {
        let processor = StandingsProcessor::new(
            vec![standing(1, "Alpha")],
            vec![game("01.08.2024", "Alpha", "Gamma", Some((1, 0)))],
        )
        .flatten_to_long()
        .clean()
        .expect("clean");
        let table = processor.table().expect("table");
        assert_eq!(
            table.value(0, "stat_Ball_Possession_team"),
            Some(&Cell::Number(0.6))
        );
        assert_eq!(table.value(0, "opponent_rank"), Some(&Cell::Number(0.0)));
        assert_eq!(table.value(0, "Team"), Some(&Cell::Text("Alpha".to_string())));
    }
}
