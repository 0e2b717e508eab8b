use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use league_forecast::features::WinRateFeatureEngineer;
use league_forecast::forest::{ForestClassifier, ForestParams, ForestRegressor};
use league_forecast::table::{Cell, Table};

const TEAMS: usize = 20;

fn season_table() -> Table {
    let mut records = Vec::new();
    let mut k = 0usize;
    for i in 0..TEAMS {
        for j in 0..TEAMS {
            if i == j {
                continue;
            }
            let gf = (i * 3 + j * 2 + k) % 4;
            let ga = (i + j * 3 + k * 2) % 3;
            let day = 1 + k % 28;
            let month = 1 + (k / 28) % 12;
            for (team, opp, venue, f, a) in [(i, j, "home", gf, ga), (j, i, "away", ga, gf)] {
                let outcome = match f.cmp(&a) {
                    std::cmp::Ordering::Greater => "W",
                    std::cmp::Ordering::Less => "L",
                    std::cmp::Ordering::Equal => "D",
                };
                records.push(vec![
                    ("Team".to_string(), Cell::text(format!("Team {team}"))),
                    ("Opponent".to_string(), Cell::text(format!("Team {opp}"))),
                    ("Date".to_string(), Cell::text(format!("{day:02}.{month:02}.2024"))),
                    ("Time".to_string(), Cell::text("20:00")),
                    ("Home/Away".to_string(), Cell::text(venue)),
                    ("team_goals".to_string(), Cell::Number(f as f64)),
                    ("opponent_goals".to_string(), Cell::Number(a as f64)),
                    ("Outcome".to_string(), Cell::text(outcome)),
                ]);
            }
            k += 1;
        }
    }
    Table::from_records(records)
}

fn training_matrix(rows: usize, width: usize) -> (Vec<Vec<f64>>, Vec<u8>, Vec<f64>) {
    let mut x = Vec::with_capacity(rows);
    let mut classes = Vec::with_capacity(rows);
    let mut target = Vec::with_capacity(rows);
    for r in 0..rows {
        let row: Vec<f64> = (0..width)
            .map(|c| ((r * 31 + c * 17) % 97) as f64 / 97.0)
            .collect();
        let signal = row[0] + row[1] - row[2];
        classes.push(if signal > 0.6 { 1 } else if signal < 0.3 { 2 } else { 0 });
        target.push(signal * 10.0);
        x.push(row);
    }
    (x, classes, target)
}

fn bench_winrate_features(c: &mut Criterion) {
    let table = season_table();
    let engineer = WinRateFeatureEngineer::default();
    c.bench_function("winrate_features", |b| {
        b.iter(|| {
            let out = engineer.engineer(black_box(table.clone())).unwrap();
            black_box(out.len());
        })
    });
}

fn bench_forest_fit(c: &mut Criterion) {
    let (x, classes, target) = training_matrix(600, 40);
    let params = ForestParams {
        n_trees: 20,
        ..ForestParams::default()
    };
    c.bench_function("forest_classifier_fit", |b| {
        b.iter(|| {
            let model = ForestClassifier::fit(black_box(&x), black_box(&classes), params).unwrap();
            black_box(model.classes().len());
        })
    });
    c.bench_function("forest_regressor_fit", |b| {
        b.iter(|| {
            let model = ForestRegressor::fit(black_box(&x), black_box(&target), params).unwrap();
            black_box(model.predict(&x[..1]).unwrap());
        })
    });
}

criterion_group!(benches, bench_winrate_features, bench_forest_fit);
criterion_main!(benches);
