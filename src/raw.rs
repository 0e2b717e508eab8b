//! Scraper output: the standings and match JSON snapshots written per league.
//!
//! The scraper hands over whatever it read off the page, so every numeric field
//! may arrive as a number, a numeric string, or not at all.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde_json::Value;

use crate::error::ForecastError;
use crate::kickoff::KickoffKey;

#[derive(Debug, Clone, PartialEq)]
pub struct StandingsRow {
    pub rank: Option<i64>,
    pub team: String,
    pub played: Option<i64>,
    pub wins: Option<i64>,
    pub draws: Option<i64>,
    pub losses: Option<i64>,
    pub goals_for: Option<i64>,
    pub goals_against: Option<i64>,
    pub goal_difference: Option<i64>,
    pub points: Option<i64>,
    pub form: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatPair {
    pub label: String,
    pub home_value: String,
    pub away_value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchRecord {
    pub date: String,
    pub time: String,
    pub home: String,
    pub away: String,
    pub home_goals: Option<i32>,
    pub away_goals: Option<i32>,
    pub status: Option<String>,
    pub statistics: Vec<StatPair>,
}

impl MatchRecord {
    pub fn is_played(&self) -> bool {
        self.home_goals.is_some() && self.away_goals.is_some()
    }

    pub fn involves(&self, team: &str) -> bool {
        self.home == team || self.away == team
    }

    pub fn kickoff(&self) -> KickoffKey {
        KickoffKey::parse(&self.date, &self.time)
    }
}

pub fn load_standings(path: &Path) -> Result<Vec<StandingsRow>> {
    let raw = read_snapshot(path)?;
    parse_standings_json(&raw).with_context(|| format!("parse standings {}", path.display()))
}

pub fn load_matches(path: &Path) -> Result<Vec<MatchRecord>> {
    let raw = read_snapshot(path)?;
    parse_matches_json(&raw).with_context(|| format!("parse matches {}", path.display()))
}

/// Scheduled fixtures only: records where either side has no goal count yet.
pub fn load_fixtures(path: &Path) -> Result<Vec<MatchRecord>> {
    Ok(load_matches(path)?
        .into_iter()
        .filter(|m| !m.is_played())
        .collect())
}

fn read_snapshot(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(ForecastError::missing_input(path).into());
    }
    fs::read_to_string(path).with_context(|| format!("read {}", path.display()))
}

pub fn parse_standings_json(raw: &str) -> Result<Vec<StandingsRow>> {
    let value = serde_json::from_str::<Value>(raw.trim()).context("invalid standings json")?;
    let list = value
        .get("standings")
        .and_then(|v| v.as_array())
        .ok_or_else(|| anyhow!("missing standings array"))?;
    Ok(list.iter().filter_map(parse_standings_row).collect())
}

fn parse_standings_row(v: &Value) -> Option<StandingsRow> {
    let team = v.get("team")?.as_str()?.trim().to_string();
    if team.is_empty() {
        return None;
    }
    let mut goals_for = v.get("GF").and_then(as_i64_any);
    let mut goals_against = v.get("GA").and_then(as_i64_any);
    // Some snapshots keep the raw "GF:GA" cell.
    if goals_against.is_none() {
        if let Some((gf, ga)) = v.get("GF").and_then(|x| x.as_str()).and_then(parse_score_pair) {
            goals_for = Some(gf as i64);
            goals_against = Some(ga as i64);
        }
    }
    Some(StandingsRow {
        rank: v.get("rank").and_then(as_i64_any),
        team,
        played: v.get("MP").and_then(as_i64_any),
        wins: v.get("W").and_then(as_i64_any),
        draws: v.get("D").and_then(as_i64_any),
        losses: v.get("L").and_then(as_i64_any),
        goals_for,
        goals_against,
        goal_difference: v.get("GD").and_then(as_i64_any),
        points: v.get("Pts").and_then(as_i64_any),
        form: v
            .get("Form")
            .and_then(|x| x.as_str())
            .unwrap_or_default()
            .to_string(),
    })
}

pub fn parse_matches_json(raw: &str) -> Result<Vec<MatchRecord>> {
    let value = serde_json::from_str::<Value>(raw.trim()).context("invalid matches json")?;
    let list = match &value {
        Value::Array(items) => items,
        Value::Object(_) => value
            .get("matches")
            .and_then(|v| v.as_array())
            .ok_or_else(|| anyhow!("missing matches array"))?,
        Value::Null => return Ok(Vec::new()),
        _ => return Err(anyhow!("unexpected matches json shape")),
    };
    Ok(list.iter().filter_map(parse_match_record).collect())
}

fn parse_match_record(v: &Value) -> Option<MatchRecord> {
    let home = v.get("home")?.as_str()?.trim().to_string();
    let away = v.get("away")?.as_str()?.trim().to_string();
    if home.is_empty() || away.is_empty() {
        return None;
    }
    let statistics = v
        .get("statistics")
        .and_then(|s| s.as_array())
        .map(|arr| arr.iter().filter_map(parse_stat_pair).collect())
        .unwrap_or_default();
    Some(MatchRecord {
        date: string_field(v, "date"),
        time: string_field(v, "time"),
        home,
        away,
        home_goals: v.get("home_goals").and_then(as_i32_any),
        away_goals: v.get("away_goals").and_then(as_i32_any),
        status: v
            .get("status")
            .and_then(|x| x.as_str())
            .map(|s| s.to_string()),
        statistics,
    })
}

fn parse_stat_pair(v: &Value) -> Option<StatPair> {
    let label = v.get("label")?.as_str()?.to_string();
    Some(StatPair {
        label,
        home_value: v.get("home_value").map(value_text).unwrap_or_default(),
        away_value: v.get("away_value").map(value_text).unwrap_or_default(),
    })
}

fn string_field(v: &Value, key: &str) -> String {
    v.get(key).map(value_text).unwrap_or_default()
}

fn value_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

fn as_i64_any(v: &Value) -> Option<i64> {
    if let Some(n) = v.as_i64() {
        return Some(n);
    }
    if let Some(f) = v.as_f64() {
        return Some(f as i64);
    }
    v.as_str()?.trim().parse::<i64>().ok()
}

fn as_i32_any(v: &Value) -> Option<i32> {
    let n = as_i64_any(v)?;
    i32::try_from(n).ok()
}

fn parse_score_pair(raw: &str) -> Option<(i32, i32)> {
    let mut nums = raw
        .split(|ch: char| !ch.is_ascii_digit())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<i32>().ok());
    let home = nums.next()?;
    let away = nums.next()?;
    Some((home, away))
}
