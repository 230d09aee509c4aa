use scaffviz::engine::error::EngineError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Scaffviz(#[from] EngineError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse file '{path}': {source}", path = path.display())]
    FileParsing {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid argument: {0}")]
    Argument(String),

    #[error("Server error on {addr}: {source}")]
    Server {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<scaffviz::engine::table::TableError> for CliError {
    fn from(e: scaffviz::engine::table::TableError) -> Self {
        CliError::Scaffviz(e.into())
    }
}

impl From<scaffviz::engine::config::ConfigError> for CliError {
    fn from(e: scaffviz::engine::config::ConfigError) -> Self {
        CliError::Config(e.to_string())
    }
}
