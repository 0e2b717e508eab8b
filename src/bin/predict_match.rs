use anyhow::{Context, Result, anyhow};

use league_forecast::config::{self, PipelineConfig};
use league_forecast::pipeline;
use league_forecast::prediction_log;
use league_forecast::predictor::MatchPredictor;
use league_forecast::report;

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let home = config::flag_value(&args, "home").context("missing --home=<team>")?;
    let away = config::flag_value(&args, "away").context("missing --away=<team>")?;
    let date = config::flag_value(&args, "date").unwrap_or_default();
    let time = config::flag_value(&args, "time").unwrap_or_default();

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
    if config::has_flag(&args, "report") {
        print!("{}", report::training_summary(&training));
    }

    let result = predictor
        .try_predict(&home, &away)
        .map_err(|err| anyhow!("insufficient historical data for {home} vs {away}: {err}"))?;
    print!("{}", report::prediction_summary(&result));

    if !config::has_flag(&args, "no-log") {
        prediction_log::append(&cfg.prediction_log, &date, &time, &result)?;
    }
    Ok(())
}
