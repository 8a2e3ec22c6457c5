//! Run a query against the relational store described by a credentials file.
//!
//! ```text
//! cargo run --example mysql_query -- cred/db_credentials.yaml "SELECT * FROM actor LIMIT 5;"
//! ```
//!
//! When `COUCHDB_URL` and `COUCHDB_DB_NAME` are set (a `.env` file works too),
//! the document store is contacted as well and its first documents are printed.

use datastore_clients::logging::init_tracing;
use datastore_clients::{CouchDbConfig, DocumentStoreClient, RelationalStoreClient};
use dotenv::dotenv;
use serde_json::json;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_tracing("datastore_clients=info").map_err(|e| anyhow::anyhow!(e))?;

    let mut args = std::env::args().skip(1);
    let cred_file = args.next().unwrap_or_else(|| "cred/db_credentials.yaml".to_string());
    let sql = args.next().unwrap_or_else(|| "SELECT * FROM actor LIMIT 5;".to_string());

    let mut connector = RelationalStoreClient::from_file(&cred_file)?;
    let table = connector.query(&sql).await?;
    println!("{}", serde_json::to_string_pretty(&table.to_json())?);
    connector.close().await;

    if let Ok(config) = CouchDbConfig::from_env() {
        let client = DocumentStoreClient::from_config(&config).await?;
        let docs = client
            .run_mango_query(&json!({ "selector": {}, "limit": 5 }))
            .await?
            .or_empty();
        println!("{}", serde_json::to_string_pretty(&docs)?);
    }

    Ok(())
}
