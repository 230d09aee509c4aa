use thiserror::Error;

use super::config::ConfigError;
use super::table::TableError;
use crate::core::io::tsv::TsvError;
use crate::core::models::frame::FrameError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Table(#[from] TableError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error("Neither manifold nor x and y were specified.")]
    NoAxes,

    #[error("Column '{0}' not found in table")]
    MissingColumn(String),

    #[error("Failed to read predictions '{path}': {source}")]
    PredictionRead { path: String, source: TsvError },

    #[error("Invalid prediction file '{path}': {reason}")]
    Predictions { path: String, reason: String },
}
