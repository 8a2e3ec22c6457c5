use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Failure reported by a document-store backend before any policy is applied.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            BackendError::Decode(e.to_string())
        } else {
            BackendError::Transport(e.to_string())
        }
    }
}

/// Identifier and revision token assigned by the store to a saved document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRevision {
    pub id: String,
    pub rev: String,
}

/// Raw document-store API. Implementations forward each call to the server
/// and report failures as [`BackendError`]; the client decides which of them
/// are fatal.
#[async_trait]
pub trait CouchBackend: Send + Sync {
    async fn database_exists(&self, db: &str) -> Result<bool, BackendError>;

    /// Returns `false` when the database already existed.
    async fn create_database(&self, db: &str) -> Result<bool, BackendError>;

    async fn find(&self, db: &str, query: &Value) -> Result<Vec<Value>, BackendError>;

    async fn temp_view(
        &self,
        db: &str,
        map: &str,
        reduce: Option<&str>,
    ) -> Result<Vec<Value>, BackendError>;

    async fn put_document(
        &self,
        db: &str,
        id: &str,
        document: &Value,
    ) -> Result<DocumentRevision, BackendError>;

    async fn get_document(&self, db: &str, id: &str) -> Result<Value, BackendError>;
}
