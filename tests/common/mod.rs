#![allow(dead_code)]

use std::path::Path;

use chrono::{Duration, NaiveDate};
use serde_json::{Value, json};

pub const TEAMS: [&str; 6] = ["Alpha", "Bravo", "Charlie", "Delta", "Echo", "Foxtrot"];

/// Double round robin between [`TEAMS`], three days apart, with a full set of
/// scraped statistics on every match.
pub fn season_matches() -> Vec<Value> {
    let start = NaiveDate::from_ymd_opt(2024, 8, 2).expect("valid date");
    let mut out = Vec::new();
    let mut k = 0usize;
    for i in 0..TEAMS.len() {
        for j in 0..TEAMS.len() {
            if i == j {
                continue;
            }
            let date = start + Duration::days(3 * k as i64);
            out.push(played_match(i, j, k, &date.format("%d.%m.%Y").to_string()));
            k += 1;
        }
    }
    out
}

pub fn played_match(i: usize, j: usize, k: usize, date: &str) -> Value {
    let home_goals = (i * 3 + j * 2 + k) % 4;
    let away_goals = (i + j * 3 + k * 2) % 3;
    let possession = 40 + (i * 7 + j * 3 + k) % 20;
    json!({
        "date": date,
        "time": "20:00",
        "home": TEAMS[i],
        "away": TEAMS[j],
        "home_goals": home_goals,
        "away_goals": away_goals,
        "status": "FT",
        "statistics": [
            {"label": "Ball Possession (%)", "home_value": format!("{possession}%"), "away_value": format!("{}%", 100 - possession)},
            {"label": "Corner Kicks", "home_value": (2 + (i + k) % 7).to_string(), "away_value": (2 + (j + k) % 6).to_string()},
            {"label": "Shots on target", "home_value": (1 + (i * 2 + k) % 6).to_string(), "away_value": (1 + (j * 2 + k) % 5).to_string()},
            {"label": "Total shots", "home_value": (6 + (i + k * 3) % 12).to_string(), "away_value": (5 + (j + k * 3) % 10).to_string()},
            {"label": "Yellow Cards", "home_value": (1 + (i + k) % 4).to_string(), "away_value": (1 + (j + k) % 3).to_string()},
            {"label": "Fouls", "home_value": (8 + (i + k) % 9).to_string(), "away_value": (9 + (j + k) % 7).to_string()},
            {"label": "Tackles", "home_value": (10 + (i * 5 + k) % 11).to_string(), "away_value": (12 + (j * 5 + k) % 9).to_string()},
            {"label": "Passes", "home_value": (300 + (i * 37 + k * 11) % 200).to_string(), "away_value": (280 + (j * 41 + k * 13) % 220).to_string()},
            {"label": "Expected Goals (xG)", "home_value": format!("{:.2}", 0.4 + ((i + k) % 10) as f64 * 0.2), "away_value": format!("{:.2}", 0.3 + ((j + k) % 8) as f64 * 0.2)}
        ]
    })
}

pub fn standings() -> Value {
    let rows: Vec<Value> = TEAMS
        .iter()
        .enumerate()
        .map(|(idx, team)| {
            json!({
                "rank": idx + 1,
                "team": team,
                "MP": 10,
                "W": 6 - idx,
                "D": 2,
                "L": 2 + idx,
                "GF": 20 - idx * 2,
                "GA": 8 + idx * 2,
                "GD": 12 - idx as i64 * 4,
                "Pts": 20 - idx as i64 * 3,
                "Form": "WDLWW"
            })
        })
        .collect();
    json!({ "standings": rows })
}

/// Writes the standings and results snapshots the pipeline expects for
/// `league` under `dir`.
pub fn write_league(dir: &Path, league: &str, matches: &[Value]) {
    std::fs::write(
        dir.join(format!("standings-{league}.json")),
        serde_json::to_string_pretty(&standings()).expect("encode standings"),
    )
    .expect("write standings");
    std::fs::write(
        dir.join(format!("all-matches-{league}.json")),
        serde_json::to_string_pretty(&Value::Array(matches.to_vec())).expect("encode matches"),
    )
    .expect("write matches");
}
