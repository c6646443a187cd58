//! Database connectors for the CRM query backend

mod mysql;
mod traits;

pub use mysql::MySqlConnector;
pub use traits::{ColumnInfo, QueryRows, SqlDatabase, TableSchema};
