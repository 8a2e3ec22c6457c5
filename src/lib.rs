// Datastore clients library
// Document store (CouchDB over HTTP) and relational store (sqlx pool) wrappers

pub mod config;
pub mod error;
pub mod logging;
pub mod utils;

// Re-export commonly used types for convenience
pub use config::{ConfigError, CouchDbConfig, MySqlConfig, StoreConfig};
pub use error::{Result, StoreError};
pub use utils::datasource::{
    DocumentStoreClient,
    Lookup,
    PooledConnection,
    QueryOutcome,
    RelationalStoreClient,
    Table,
};
