//! Error types for the engine

use bastion_core::ConfigError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Malformed market input: {0}")]
    Input(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
