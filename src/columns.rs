//! Column names shared by every stage's CSV tables.

pub const RANK: &str = "Rank";
pub const TEAM: &str = "Team";
pub const WINS: &str = "Wins";
pub const DRAWS: &str = "Draws";
pub const LOSSES: &str = "Loses";
pub const SEASON_GOALS_FOR: &str = "Team_goals";
pub const SEASON_GOALS_AGAINST: &str = "Opponents_goals";
pub const GOAL_DIFFERENCE: &str = "Goal_difference";
pub const POINTS: &str = "Points";
pub const OPPONENT: &str = "Opponent";
pub const OPPONENT_RANK: &str = "opponent_rank";
pub const DATE: &str = "Date";
pub const TIME: &str = "Time";
pub const VENUE: &str = "Home/Away";
pub const TEAM_GOALS: &str = "team_goals";
pub const OPPONENT_GOALS: &str = "opponent_goals";
pub const OUTCOME: &str = "Outcome";
pub const TARGET_WINNER: &str = "Target_Winner";

pub const TEAM_ENCODED: &str = "Team_encoded";
pub const OPPONENT_ENCODED: &str = "Opponent_encoded";
pub const HOME_ENCODED: &str = "Home_encoded";
pub const OUTCOME_ENCODED: &str = "Outcome_encoded";
pub const TARGET_ENCODED: &str = "Target_encoded";

pub const WIN_RATE_GLOBAL: &str = "win_rate_global";
pub const WIN_RATE_LAST_N: &str = "win_rate_lastN";
pub const HOME_WIN_RATE: &str = "home_win_rate";
pub const AWAY_WIN_RATE: &str = "away_win_rate";
pub const H2H_WIN_RATE: &str = "h2h_win_rate";
pub const WIN_STREAK: &str = "win_streak";
pub const FORM_SCORE: &str = "form_score";
pub const GOAL_DIFF: &str = "goal_diff";
pub const GOAL_DIFF_WIN_RATE: &str = "goal_diff_win_rate";
pub const WEIGHTED_OUTCOME: &str = "weighted_outcome";

pub const TOTAL_GOALS: &str = "total_goals";
pub const GOALS_CLASS: &str = "goals_class";
pub const SCORE_CLASS: &str = "score_class";

/// Composite "h:a" goals cell some exports carry, and the columns it splits into.
pub const COMPOSITE_GOALS: &str = "Goals";
pub const COMPOSITE_GOALS_HOME: &str = "team_total_goals_home";
pub const COMPOSITE_GOALS_AWAY: &str = "team_total_goals_away";

pub const STAT_PREFIX: &str = "stat_";
pub const TEAM_SUFFIX: &str = "_team";
pub const OPPONENT_SUFFIX: &str = "_opponent";

/// Identity and categorical columns. Numeric coercion never touches these.
pub const IDENTITY: [&str; 7] = [TEAM, OPPONENT, DATE, TIME, VENUE, OUTCOME, TARGET_WINNER];

/// Columns the later stages cannot work without; preprocessing never drops or
/// rescales them.
pub const PROTECTED: [&str; 9] = [
    TEAM,
    OPPONENT,
    DATE,
    TIME,
    VENUE,
    OUTCOME,
    TARGET_WINNER,
    TEAM_GOALS,
    OPPONENT_GOALS,
];

pub fn stat_column(label: &str, suffix: &str) -> String {
    format!("{STAT_PREFIX}{label}{suffix}")
}

/// `stat_x_team` <-> `stat_x_opponent`; other names come back unchanged.
pub fn swap_side(name: &str) -> String {
    if let Some(base) = name.strip_suffix(TEAM_SUFFIX) {
        format!("{base}{OPPONENT_SUFFIX}")
    } else if let Some(base) = name.strip_suffix(OPPONENT_SUFFIX) {
        format!("{base}{TEAM_SUFFIX}")
    } else {
        name.to_string()
    }
}
