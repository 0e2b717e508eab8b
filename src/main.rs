use std::io::{self, BufRead, Write};

use anyhow::{Context, Result, anyhow};

use league_forecast::config::{self, PipelineConfig};
use league_forecast::pipeline::{self, LeaguePaths};
use league_forecast::prediction_log;
use league_forecast::predictor::MatchPredictor;
use league_forecast::report;

const HOLDOUT_FILE: &str = "all_predictions.csv";

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let args: Vec<String> = std::env::args().collect();
    let level = if config::has_flag(&args, "verbose") {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();

    let mut cfg = PipelineConfig::from_env();
    cfg.apply_args(&args);

    let summary = pipeline::run_pipeline(&cfg);
    let feature_paths = summary.feature_paths();
    if feature_paths.is_empty() {
        return Err(anyhow!(
            "no league produced a feature table under {}",
            cfg.data_dir.display()
        ));
    }

    let mut predictor = MatchPredictor::from_csv_paths(&feature_paths, cfg.predictor_config())?;
    let training = predictor.train_models()?;
    print!("{}", report::training_summary(&training));

    let holdout = cfg.data_dir.join(HOLDOUT_FILE);
    let exported = predictor.export_holdout_predictions(&holdout)?;
    println!("holdout predictions: {} rows -> {}", exported.len(), holdout.display());

    if config::has_flag(&args, "fixtures") {
        print_fixtures(&cfg);
    }

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        let Some(date) = prompt(&mut lines, "match date (YYYY-MM-DD): ")? else {
            break;
        };
        let Some(time) = prompt(&mut lines, "kickoff time (HH:MM): ")? else {
            break;
        };
        let Some(home) = prompt(&mut lines, "home team: ")? else {
            break;
        };
        let Some(away) = prompt(&mut lines, "away team: ")? else {
            break;
        };

        match predictor.predict_future_match(&home, &away) {
            Some(result) => {
                print!("{}", report::prediction_summary(&result));
                prediction_log::append(&cfg.prediction_log, &date, &time, &result)?;
            }
            None => println!("insufficient historical data for {home} vs {away}"),
        }

        let again = prompt(&mut lines, "another match? (y/n): ")?.unwrap_or_default();
        if !again.eq_ignore_ascii_case("y") {
            break;
        }
    }

    Ok(())
}

fn prompt<B: BufRead>(lines: &mut io::Lines<B>, label: &str) -> Result<Option<String>> {
    print!("{label}");
    io::stdout().flush().context("flush stdout")?;
    match lines.next() {
        Some(line) => Ok(Some(line.context("read stdin")?.trim().to_string())),
        None => Ok(None),
    }
}

fn print_fixtures(cfg: &PipelineConfig) {
    for league in &cfg.leagues {
        let paths = LeaguePaths::new(&cfg.data_dir, league);
        match pipeline::upcoming_fixtures(&paths) {
            Ok(fixtures) if fixtures.is_empty() => {}
            Ok(fixtures) => {
                println!("{league}:");
                for fixture in fixtures {
                    println!(
                        "  {} {}  {} vs {}",
                        fixture.date, fixture.time, fixture.home, fixture.away
                    );
                }
            }
            Err(err) => log::warn!("fixtures for {league}: {err:#}"),
        }
    }
}
