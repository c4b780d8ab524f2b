//! Configuration errors shared by every component config

use thiserror::Error;

/// Raised by `validate()` on configuration structs and by config loaders.
///
/// Any of these is fatal at startup: the engine refuses to run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {error}")]
    Io { path: String, error: String },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Duplicate strategy id: {0}")]
    DuplicateStrategy(String),
}

impl ConfigError {
    /// Shorthand for an invalid field
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Field checks shared by the config structs of every crate
pub mod checks {
    use super::ConfigError;
    use rust_decimal::Decimal;

    pub fn positive(field: &str, value: Decimal) -> Result<(), ConfigError> {
        if value <= Decimal::ZERO {
            return Err(ConfigError::invalid(field, format!("must be > 0, got {value}")));
        }
        Ok(())
    }

    pub fn non_negative(field: &str, value: Decimal) -> Result<(), ConfigError> {
        if value < Decimal::ZERO {
            return Err(ConfigError::invalid(field, format!("must be >= 0, got {value}")));
        }
        Ok(())
    }

    /// A ratio cap in (0, 1]
    pub fn fraction(field: &str, value: Decimal) -> Result<(), ConfigError> {
        if value <= Decimal::ZERO || value > Decimal::ONE {
            return Err(ConfigError::invalid(
                field,
                format!("must be in (0, 1], got {value}"),
            ));
        }
        Ok(())
    }

    pub fn non_zero(field: &str, value: usize) -> Result<(), ConfigError> {
        if value == 0 {
            return Err(ConfigError::invalid(field, "must be > 0"));
        }
        Ok(())
    }
}
