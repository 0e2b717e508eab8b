pub mod columns;
pub mod config;
pub mod encoding;
pub mod error;
pub mod features;
pub mod forest;
pub mod kickoff;
pub mod metrics;
pub mod pipeline;
pub mod prediction_log;
pub mod predictor;
pub mod preprocess;
pub mod raw;
pub mod report;
pub mod standings;
pub mod table;
