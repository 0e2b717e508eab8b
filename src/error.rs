use std::path::PathBuf;

use thiserror::Error;

/// Failure modes the pipeline and the predictor distinguish. They travel inside
/// `anyhow::Error`, so callers that care can `downcast_ref::<ForecastError>()`.
#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("no data available: {} does not exist", path.display())]
    MissingInput { path: PathBuf },

    #[error("invalid state: {0}")]
    InvalidState(&'static str),

    #[error("required column `{0}` is missing")]
    MissingColumn(String),

    #[error("insufficient historical data for team `{0}`")]
    UnknownTeam(String),

    #[error("no recent form snapshot for team `{0}`")]
    MissingSnapshot(String),

    #[error("could not assemble prediction features: {0}")]
    FeatureAssembly(String),

    #[error("model failure: {0}")]
    Model(String),

    #[error("duplicate column in {path}: {column}")]
    DuplicateColumn { path: String, column: String },

    #[error("not enough clean rows to train: need {needed}, found {found}")]
    InsufficientRows { needed: usize, found: usize },
}

impl ForecastError {
    pub fn missing_input(path: impl Into<PathBuf>) -> Self {
        Self::MissingInput { path: path.into() }
    }

    /// True for the conditions a user-facing caller should render as
    /// "insufficient data" rather than as an internal fault.
    pub fn is_insufficient_data(&self) -> bool {
        matches!(
            self,
            Self::MissingInput { .. }
                | Self::UnknownTeam(_)
                | Self::MissingSnapshot(_)
                | Self::InsufficientRows { .. }
        )
    }
}
