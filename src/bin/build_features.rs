use anyhow::Result;

use league_forecast::config::{self, PipelineConfig};
use league_forecast::pipeline::{self, LeagueStatus};

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

    println!("Feature build complete");
    println!("Data dir: {}", cfg.data_dir.display());
    for run in &summary.runs {
        let status = match &run.status {
            LeagueStatus::Built => "built".to_string(),
            LeagueStatus::Reused => "reused".to_string(),
            LeagueStatus::Skipped(reason) => format!("skipped ({reason})"),
        };
        println!("  {:<36} {}", run.paths.league, status);
    }
    println!(
        "Ready: {}/{}",
        summary.runs.len() - summary.skipped(),
        summary.runs.len()
    );
    Ok(())
}
