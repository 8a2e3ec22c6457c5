use serde_json::Value;
use std::path::Path;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::base::{BackendError, CouchBackend};
use super::couchdb_http::HttpCouchBackend;
use super::outcome::{Lookup, QueryOutcome};
use crate::config::{CouchDbConfig, StoreConfig};
use crate::error::{Result, StoreError};

/// Client bound to one CouchDB database.
///
/// The database is resolved once at construction, creating it if the server
/// does not have it yet. Query and view failures other than a vanished
/// database come back as [`QueryOutcome::Failed`]; document creation errors
/// always propagate.
pub struct DocumentStoreClient<B: CouchBackend = HttpCouchBackend> {
    backend: B,
    db_name: String,
}

impl DocumentStoreClient<HttpCouchBackend> {
    pub async fn new(
        url: &str,
        db_name: &str,
        username: Option<&str>,
        password: Option<&str>,
    ) -> Result<Self> {
        let config = CouchDbConfig::new(url, db_name)
            .with_credentials(username.map(str::to_string), password.map(str::to_string));
        Self::from_config(&config).await
    }

    pub async fn from_config(config: &CouchDbConfig) -> Result<Self> {
        let backend = HttpCouchBackend::new(config)?;
        Self::with_backend(backend, &config.db_name).await
    }

    /// Connect using the `couchdb` group of a YAML credentials file.
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let config = StoreConfig::load(path)?;
        Self::from_config(config.require_couchdb()?).await
    }
}

impl<B: CouchBackend> DocumentStoreClient<B> {
    pub async fn with_backend(backend: B, db_name: impl Into<String>) -> Result<Self> {
        let db_name = db_name.into();

        let exists = backend.database_exists(&db_name).await.map_err(|e| {
            error!("Error connecting to CouchDB: {}", e);
            StoreError::Connection(format!("cannot resolve database '{}': {}", db_name, e))
        })?;

        if exists {
            info!("Connected to existing database: {}", db_name);
        } else {
            let created = backend.create_database(&db_name).await.map_err(|e| {
                error!("Failed to create database '{}': {}", db_name, e);
                StoreError::Connection(format!("cannot create database '{}': {}", db_name, e))
            })?;
            if created {
                info!("Created and connected to database: {}", db_name);
            } else {
                info!("Database {} appeared concurrently, connected to it", db_name);
            }
        }

        Ok(Self { backend, db_name })
    }

    pub fn database_name(&self) -> &str {
        &self.db_name
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Run a Mango query and return the matching documents in server order.
    ///
    /// Errors only when the bound database no longer exists.
    pub async fn run_mango_query(&self, query: &Value) -> Result<QueryOutcome<Vec<Value>>> {
        match self.backend.find(&self.db_name, query).await {
            Ok(docs) => {
                info!("Mango query executed: {} documents", docs.len());
                Ok(QueryOutcome::Complete(docs))
            }
            Err(e) => self.degrade(e, "Mango query"),
        }
    }

    /// Evaluate a transient map/reduce view without storing a design document.
    pub async fn run_temp_view(
        &self,
        map_fun: &str,
        reduce_fun: Option<&str>,
    ) -> Result<QueryOutcome<Vec<Value>>> {
        match self.backend.temp_view(&self.db_name, map_fun, reduce_fun).await {
            Ok(rows) => {
                info!("Temporary view executed: {} rows", rows.len());
                Ok(QueryOutcome::Complete(rows))
            }
            Err(e) => self.degrade(e, "temporary view"),
        }
    }

    /// Save a new document and return its id.
    ///
    /// An `_id` already present in the document is kept, otherwise a random
    /// one is generated.
    pub async fn create_document(&self, document: &Value) -> Result<String> {
        if !document.is_object() {
            error!("Error creating document: not a JSON object");
            return Err(StoreError::Write("document must be a JSON object".to_string()));
        }

        let doc_id = match document.get("_id").and_then(Value::as_str) {
            Some(id) => id.to_string(),
            None => Uuid::new_v4().simple().to_string(),
        };

        match self.backend.put_document(&self.db_name, &doc_id, document).await {
            Ok(revision) => {
                info!("Document created with ID: {}", revision.id);
                debug!("Document {} revision {}", revision.id, revision.rev);
                Ok(revision.id)
            }
            Err(e) => {
                error!("Error creating document: {}", e);
                Err(StoreError::Write(e.to_string()))
            }
        }
    }

    pub async fn get_document(&self, doc_id: &str) -> Lookup {
        match self.backend.get_document(&self.db_name, doc_id).await {
            Ok(document) => Lookup::Found(document),
            Err(BackendError::NotFound(_)) => {
                warn!("Document with ID: {} not found", doc_id);
                Lookup::Missing
            }
            Err(e) => {
                error!("Error fetching document {}: {}", doc_id, e);
                Lookup::Failed(StoreError::Operation(e.to_string()))
            }
        }
    }

    fn degrade<T>(&self, e: BackendError, operation: &str) -> Result<QueryOutcome<T>> {
        match e {
            BackendError::NotFound(_) => {
                error!("Database '{}' not found for {}", self.db_name, operation);
                Err(StoreError::Connection(format!("database '{}' not found", self.db_name)))
            }
            other => {
                error!("Error executing {}: {}", operation, other);
                Ok(QueryOutcome::Failed(StoreError::Operation(other.to_string())))
            }
        }
    }
}
