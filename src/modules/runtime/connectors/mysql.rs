//! MySQL connector implementation

use async_trait::async_trait;
use crm_query_core::{CrmError, DatabaseSettings};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::mysql::{MySqlColumn, MySqlConnectOptions, MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::{Column, Row, TypeInfo};
use std::collections::HashMap;
use tracing::{debug, info};

use super::traits::{ColumnInfo, QueryRows, SqlDatabase, TableSchema};
use crm_query_types::Row as JsonRow;

const DESCRIBE_COLUMNS: &str = "SELECT CAST(TABLE_NAME AS CHAR) AS table_name, \
     CAST(COLUMN_NAME AS CHAR) AS column_name, \
     CAST(COLUMN_TYPE AS CHAR) AS column_type \
     FROM information_schema.COLUMNS \
     WHERE TABLE_SCHEMA = DATABASE() \
     ORDER BY TABLE_NAME, ORDINAL_POSITION";

/// MySQL database connector
pub struct MySqlConnector {
    pool: MySqlPool,
    database: String,
}

impl MySqlConnector {
    /// Create a connector whose pool opens connections on first use
    ///
    /// No network traffic happens here, so the server can start while the
    /// database is still unreachable.
    pub fn connect_lazy(settings: &DatabaseSettings) -> Self {
        let options = MySqlConnectOptions::new()
            .host(&settings.host)
            .port(settings.port)
            .username(&settings.user)
            .password(&settings.password)
            .database(&settings.database);

        let config = &settings.pool;
        let pool = MySqlPoolOptions::new()
            .max_connections(config.max_connections())
            .min_connections(config.min_connections())
            .acquire_timeout(config.acquire_timeout())
            .idle_timeout(config.idle_timeout())
            .max_lifetime(config.max_lifetime())
            .connect_lazy_with(options);

        info!(
            "MySQL pool configured for {} (database '{}')",
            settings.address(),
            settings.database
        );

        Self {
            pool,
            database: settings.database.clone(),
        }
    }

    /// Convert a MySQL row to a JSON-compatible map
    fn row_to_map(row: &MySqlRow) -> JsonRow {
        row.columns()
            .iter()
            .map(|column| (column.name().to_string(), Self::get_column_value(row, column)))
            .collect()
    }

    /// Get a column value as a JSON value
    ///
    /// Undecodable values become `null` rather than failing the whole result.
    fn get_column_value(row: &MySqlRow, column: &MySqlColumn) -> Value {
        let type_name = column.type_info().name();
        let idx = column.ordinal();

        match type_name {
            "BOOLEAN" => row
                .try_get::<Option<bool>, _>(idx)
                .ok()
                .flatten()
                .map(Value::Bool)
                .unwrap_or(Value::Null),
            "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => row
                .try_get::<Option<i64>, _>(idx)
                .ok()
                .flatten()
                .map(|v| Value::Number(v.into()))
                .unwrap_or(Value::Null),
            "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "MEDIUMINT UNSIGNED" | "INT UNSIGNED"
            | "BIGINT UNSIGNED" => row
                .try_get::<Option<u64>, _>(idx)
                .ok()
                .flatten()
                .map(|v| Value::Number(v.into()))
                .unwrap_or(Value::Null),
            "FLOAT" => row
                .try_get::<Option<f32>, _>(idx)
                .ok()
                .flatten()
                .map(|v| float_value(v as f64))
                .unwrap_or(Value::Null),
            "DOUBLE" => row
                .try_get::<Option<f64>, _>(idx)
                .ok()
                .flatten()
                .map(float_value)
                .unwrap_or(Value::Null),
            "DECIMAL" => row
                .try_get::<Option<Decimal>, _>(idx)
                .ok()
                .flatten()
                .map(decimal_value)
                .unwrap_or(Value::Null),
            "DATETIME" | "TIMESTAMP" => row
                .try_get::<Option<chrono::NaiveDateTime>, _>(idx)
                .ok()
                .flatten()
                .map(|v| Value::String(v.format("%Y-%m-%dT%H:%M:%S").to_string()))
                .unwrap_or(Value::Null),
            "DATE" => row
                .try_get::<Option<chrono::NaiveDate>, _>(idx)
                .ok()
                .flatten()
                .map(|v| Value::String(v.to_string()))
                .unwrap_or(Value::Null),
            "TIME" => row
                .try_get::<Option<chrono::NaiveTime>, _>(idx)
                .ok()
                .flatten()
                .map(|v| Value::String(v.to_string()))
                .unwrap_or(Value::Null),
            "JSON" => row
                .try_get::<Option<Value>, _>(idx)
                .ok()
                .flatten()
                .unwrap_or(Value::Null),
            _ => match row.try_get::<Option<String>, _>(idx) {
                Ok(v) => v.map(Value::String).unwrap_or(Value::Null),
                Err(_) => row
                    .try_get::<Option<Vec<u8>>, _>(idx)
                    .ok()
                    .flatten()
                    .map(|bytes| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
                    .unwrap_or(Value::Null),
            },
        }
    }
}

fn float_value(v: f64) -> Value {
    serde_json::Number::from_f64(v)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

/// Decimals are exposed as JSON numbers; values `f64` cannot hold fall back to text
fn decimal_value(v: Decimal) -> Value {
    v.to_f64()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(v.to_string()))
}

/// Keep the requested tables, in request order, matching names case-insensitively
fn select_tables(
    mut columns_by_table: HashMap<String, (String, Vec<ColumnInfo>)>,
    tables: &[String],
    database: &str,
) -> Result<Vec<TableSchema>, CrmError> {
    tables
        .iter()
        .map(|table| {
            columns_by_table
                .remove(&table.to_lowercase())
                .map(|(name, columns)| TableSchema { name, columns })
                .ok_or_else(|| {
                    CrmError::Config(format!(
                        "Table '{}' not found in database '{}'",
                        table, database
                    ))
                })
        })
        .collect()
}

#[async_trait]
impl SqlDatabase for MySqlConnector {
    async fn execute(&self, statement: &str) -> Result<QueryRows, CrmError> {
        let rows = sqlx::query(statement)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| CrmError::QueryExecution(format!("MySQL query failed: {}", e)))?;

        let columns = rows
            .first()
            .map(|row| row.columns().iter().map(|c| c.name().to_string()).collect())
            .unwrap_or_default();
        let rows = rows.iter().map(Self::row_to_map).collect();

        Ok(QueryRows { columns, rows })
    }

    async fn describe_tables(&self, tables: &[String]) -> Result<Vec<TableSchema>, CrmError> {
        let rows = sqlx::query(DESCRIBE_COLUMNS)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| CrmError::Database(format!("MySQL schema lookup failed: {}", e)))?;

        let mut columns_by_table: HashMap<String, (String, Vec<ColumnInfo>)> = HashMap::new();
        for row in &rows {
            let table: String = row
                .try_get("table_name")
                .map_err(|e| CrmError::Database(e.to_string()))?;
            let column = ColumnInfo {
                name: row
                    .try_get("column_name")
                    .map_err(|e| CrmError::Database(e.to_string()))?,
                data_type: row
                    .try_get("column_type")
                    .map_err(|e| CrmError::Database(e.to_string()))?,
            };
            columns_by_table
                .entry(table.to_lowercase())
                .or_insert_with(|| (table.clone(), Vec::new()))
                .1
                .push(column);
        }
        debug!(
            "Schema lookup returned {} tables in '{}'",
            columns_by_table.len(),
            self.database
        );

        select_tables(columns_by_table, tables, &self.database)
    }

    async fn health_check(&self) -> Result<(), CrmError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| CrmError::Database(format!("MySQL health check failed: {}", e)))?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }

    fn dialect(&self) -> &'static str {
        "mysql"
    }
}
