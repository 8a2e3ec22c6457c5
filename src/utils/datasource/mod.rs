pub mod base;
pub mod couchdb;
pub mod couchdb_http;
pub mod mysql;
pub mod outcome;
pub mod table;

pub use base::{BackendError, CouchBackend, DocumentRevision};
pub use couchdb::DocumentStoreClient;
pub use couchdb_http::HttpCouchBackend;
pub use mysql::{PooledConnection, RelationalStoreClient};
pub use outcome::{Lookup, QueryOutcome};
pub use table::Table;
