//! Database seam used by the query engine and the segment flow

use async_trait::async_trait;
use crm_query_core::CrmError;
use crm_query_types::Row;

/// Rows returned by a statement, with the column order preserved
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryRows {
    /// Column names in select-list order
    pub columns: Vec<String>,
    /// One map per row
    pub rows: Vec<Row>,
}

impl QueryRows {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A single column in a table description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
}

/// Column layout of one table, as fed to the language model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<ColumnInfo>,
}

impl TableSchema {
    /// One-line description, e.g. `Table 'city' has columns: cityid (int), citydesc (varchar(50)).`
    pub fn describe(&self) -> String {
        let columns: Vec<String> = self
            .columns
            .iter()
            .map(|c| format!("{} ({})", c.name, c.data_type))
            .collect();
        format!("Table '{}' has columns: {}.", self.name, columns.join(", "))
    }
}

/// Trait for the relational database behind the CRM
///
/// Implementations run SQL text as given; any vetting happens before the
/// call (see `SegmentSqlPolicy`).
#[async_trait]
pub trait SqlDatabase: Send + Sync {
    /// Execute a statement and return its rows
    async fn execute(&self, statement: &str) -> Result<QueryRows, CrmError>;

    /// Describe the given tables, in the order requested
    async fn describe_tables(&self, tables: &[String]) -> Result<Vec<TableSchema>, CrmError>;

    /// Check if the connection is healthy
    async fn health_check(&self) -> Result<(), CrmError>;

    /// Close the connection and release resources
    async fn close(&self);

    /// SQL dialect name used in prompts
    fn dialect(&self) -> &'static str;
}
