use thiserror::Error;

use crate::config::ConfigError;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Write error: {0}")]
    Write(String),

    #[error("Operation error: {0}")]
    Operation(String),

    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),
}

impl StoreError {
    /// Fatal errors are the ones a client never converts into an empty result.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, StoreError::Operation(_))
    }
}
