use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::{json, Value};
use sqlx::error::BoxDynError;
use sqlx::mysql::{MySql, MySqlPool, MySqlPoolOptions, MySqlRow, MySqlTypeInfo, MySqlValueRef};
use sqlx::pool::PoolConnection;
use sqlx::sqlite::{Sqlite, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::types::Json;
use sqlx::{Column, Decode, Executor, Row, Statement, Type, TypeInfo};
use std::path::Path;
use tracing::{debug, info};

use super::table::Table;
use crate::config::{mask_url, ConfigError, MySqlConfig, StoreConfig};
use crate::error::Result;

const MAX_CONNECTIONS: u32 = 5;

/// Live pool, one variant per supported driver.
#[derive(Clone)]
enum Engine {
    MySql(MySqlPool),
    Sqlite(SqlitePool),
}

impl Engine {
    async fn close(&self) {
        match self {
            Engine::MySql(pool) => pool.close().await,
            Engine::Sqlite(pool) => pool.close().await,
        }
    }
}

enum EngineState {
    Uninitialized,
    Active(Engine),
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Driver {
    MySql,
    Sqlite,
}

impl Driver {
    fn from_url(url: &str) -> std::result::Result<Self, ConfigError> {
        if url.starts_with("mysql://") {
            Ok(Driver::MySql)
        } else if url.starts_with("sqlite:") {
            Ok(Driver::Sqlite)
        } else {
            Err(ConfigError::Invalid(format!(
                "unsupported connection scheme in '{}'",
                mask_url(url)
            )))
        }
    }
}

/// Connection checked out of the pool; it goes back when dropped.
pub enum PooledConnection {
    MySql(PoolConnection<MySql>),
    Sqlite(PoolConnection<Sqlite>),
}

/// SQL client that builds its connection pool on first use.
///
/// `close` drops the pool; the next query builds a fresh one from the same
/// credentials.
pub struct RelationalStoreClient {
    connection_url: String,
    driver: Driver,
    state: EngineState,
    engines_created: u64,
}

impl RelationalStoreClient {
    /// Load the `mysql` credentials group from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let config = StoreConfig::load(path)?;
        Self::new(config.require_mysql()?)
    }

    pub fn new(config: &MySqlConfig) -> Result<Self> {
        let connection_url = config.connection_url()?;
        let driver = Driver::from_url(&connection_url)?;
        debug!("Relational connection string (masked): {}", mask_url(&connection_url));

        Ok(Self {
            connection_url,
            driver,
            state: EngineState::Uninitialized,
            engines_created: 0,
        })
    }

    /// Number of pools built over the lifetime of this client.
    pub fn engines_created(&self) -> u64 {
        self.engines_created
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, EngineState::Active(_))
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state, EngineState::Closed)
    }

    async fn engine(&mut self) -> Result<Engine> {
        if let EngineState::Active(engine) = &self.state {
            return Ok(engine.clone());
        }

        let engine = match self.driver {
            Driver::MySql => Engine::MySql(
                MySqlPoolOptions::new()
                    .max_connections(MAX_CONNECTIONS)
                    .connect(&self.connection_url)
                    .await?,
            ),
            Driver::Sqlite => Engine::Sqlite(
                SqlitePoolOptions::new()
                    .max_connections(MAX_CONNECTIONS)
                    .connect(&self.connection_url)
                    .await?,
            ),
        };

        self.engines_created += 1;
        info!(
            "Created connection pool #{} for {}",
            self.engines_created,
            mask_url(&self.connection_url)
        );
        self.state = EngineState::Active(engine.clone());
        Ok(engine)
    }

    /// Scoped connection from the pool; it goes back to the pool when dropped.
    pub async fn connection(&mut self) -> Result<PooledConnection> {
        let connection = match self.engine().await? {
            Engine::MySql(pool) => PooledConnection::MySql(pool.acquire().await?),
            Engine::Sqlite(pool) => PooledConnection::Sqlite(pool.acquire().await?),
        };
        Ok(connection)
    }

    /// Run `sql` and materialize the whole result set.
    ///
    /// Column names come from the prepared statement, so an empty result
    /// still reports them.
    pub async fn query(&mut self, sql: &str) -> Result<Table> {
        let connection = self.connection().await?;

        let start = std::time::Instant::now();
        let table = match connection {
            PooledConnection::MySql(mut conn) => {
                let statement = (&mut *conn).prepare(sql).await?;
                let columns = column_names(statement.columns());
                let rows = statement.query().fetch_all(&mut *conn).await?;
                materialize(columns, &rows, decode_mysql_cell)
            }
            PooledConnection::Sqlite(mut conn) => {
                let statement = (&mut *conn).prepare(sql).await?;
                let columns = column_names(statement.columns());
                let rows = statement.query().fetch_all(&mut *conn).await?;
                materialize(columns, &rows, decode_sqlite_cell)
            }
        };

        debug!(
            "Query returned {} rows x {} columns in {} ms",
            table.row_count(),
            table.column_count(),
            start.elapsed().as_millis()
        );
        Ok(table)
    }

    /// Dispose of the pool if one exists.
    pub async fn close(&mut self) {
        if !self.is_active() {
            return;
        }
        if let EngineState::Active(engine) = std::mem::replace(&mut self.state, EngineState::Closed) {
            engine.close().await;
            info!("Closed connection pool for {}", mask_url(&self.connection_url));
        }
    }
}

fn column_names<C: Column>(columns: &[C]) -> Vec<String> {
    columns.iter().map(|c| c.name().to_string()).collect()
}

fn materialize<R>(columns: Vec<String>, rows: &[R], decode: fn(&R, usize) -> Value) -> Table {
    let rows = rows
        .iter()
        .map(|row| (0..columns.len()).map(|i| decode(row, i)).collect())
        .collect();
    Table::new(columns, rows)
}

/// How a column's values are read, keyed on the driver's type name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellKind {
    Null,
    Bool,
    Integer,
    Unsigned,
    Float,
    Decimal,
    Date,
    Time,
    DateTime,
    Json,
    Bytes,
    Text,
}

impl CellKind {
    fn from_type_name(name: &str) -> Self {
        let name = name.to_ascii_uppercase();
        match name.as_str() {
            "NULL" => CellKind::Null,
            "BOOLEAN" | "BOOL" | "BIT" => CellKind::Bool,
            "YEAR" => CellKind::Unsigned,
            n if n.ends_with(" UNSIGNED") => CellKind::Unsigned,
            "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "INTEGER" | "BIGINT" => CellKind::Integer,
            "FLOAT" | "DOUBLE" | "REAL" => CellKind::Float,
            "DECIMAL" | "NUMERIC" => CellKind::Decimal,
            "DATE" => CellKind::Date,
            "TIME" => CellKind::Time,
            "DATETIME" | "TIMESTAMP" => CellKind::DateTime,
            "JSON" => CellKind::Json,
            "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" | "GEOMETRY" => {
                CellKind::Bytes
            }
            _ => CellKind::Text,
        }
    }
}

/// Exact DECIMAL text; MySQL sends fixed-point values as strings.
struct DecimalText(String);

impl Type<MySql> for DecimalText {
    fn type_info() -> MySqlTypeInfo {
        <str as Type<MySql>>::type_info()
    }

    fn compatible(ty: &MySqlTypeInfo) -> bool {
        ty.name() == "DECIMAL"
    }
}

impl<'r> Decode<'r, MySql> for DecimalText {
    fn decode(value: MySqlValueRef<'r>) -> std::result::Result<Self, BoxDynError> {
        let raw = <&[u8] as Decode<MySql>>::decode(value)?;
        Ok(DecimalText(std::str::from_utf8(raw)?.to_string()))
    }
}

/// Binary values as an array of byte values, so nothing is lost.
fn bytes_value(bytes: Vec<u8>) -> Value {
    Value::Array(bytes.into_iter().map(Value::from).collect())
}

fn decode_mysql_cell(row: &MySqlRow, index: usize) -> Value {
    let kind = CellKind::from_type_name(row.column(index).type_info().name());
    let decoded = match kind {
        CellKind::Null => Ok(Value::Null),
        CellKind::Bool => row.try_get::<Option<bool>, _>(index).map(|v| json!(v)),
        CellKind::Integer => row.try_get::<Option<i64>, _>(index).map(|v| json!(v)),
        CellKind::Unsigned => row.try_get::<Option<u64>, _>(index).map(|v| json!(v)),
        CellKind::Float => row.try_get::<Option<f64>, _>(index).map(|v| json!(v)),
        CellKind::Decimal => row
            .try_get::<Option<DecimalText>, _>(index)
            .map(|v| json!(v.map(|d| d.0))),
        CellKind::Date => row
            .try_get::<Option<NaiveDate>, _>(index)
            .map(|v| json!(v.map(|d| d.to_string()))),
        CellKind::Time => row
            .try_get::<Option<NaiveTime>, _>(index)
            .map(|v| json!(v.map(|t| t.to_string()))),
        CellKind::DateTime => row
            .try_get::<Option<NaiveDateTime>, _>(index)
            .map(|v| json!(v.map(|dt| dt.to_string()))),
        CellKind::Json => row
            .try_get::<Option<Json<Value>>, _>(index)
            .map(|v| v.map(|j| j.0).unwrap_or(Value::Null)),
        CellKind::Bytes => row
            .try_get::<Option<Vec<u8>>, _>(index)
            .map(|v| v.map(bytes_value).unwrap_or(Value::Null)),
        CellKind::Text => row.try_get::<Option<String>, _>(index).map(|v| json!(v)),
    };

    decoded.unwrap_or_else(|e| {
        debug!("Could not decode column {} ({:?}): {}", index, kind, e);
        Value::Null
    })
}

/// SQLite values carry their storage class, so only declared BOOLEAN
/// columns need a hint; everything else follows the stored value.
fn decode_sqlite_cell(row: &SqliteRow, index: usize) -> Value {
    if CellKind::from_type_name(row.column(index).type_info().name()) == CellKind::Bool {
        if let Ok(val) = row.try_get::<Option<bool>, _>(index) {
            return json!(val);
        }
    }

    if let Ok(val) = row.try_get::<Option<i64>, _>(index) {
        json!(val)
    } else if let Ok(val) = row.try_get::<Option<f64>, _>(index) {
        json!(val)
    } else if let Ok(val) = row.try_get::<Option<String>, _>(index) {
        json!(val)
    } else if let Ok(val) = row.try_get::<Option<Vec<u8>>, _>(index) {
        val.map(bytes_value).unwrap_or(Value::Null)
    } else {
        Value::Null
    }
}
