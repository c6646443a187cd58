//! Natural-language to SQL query engine
//!
//! A question goes through two model calls: the first writes SQL against
//! the described tables, the second turns the rows that SQL returned into
//! the final answer. Only the second call is streamed.

mod sql;

pub use sql::{extract_sql, render_markdown_table};

use crm_query_core::CrmError;
use futures::StreamExt;
use std::fmt;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::connectors::{SqlDatabase, TableSchema};
use crate::llm::{LanguageModel, TextStream};
use crate::prompts::{RESPONSE_SYNTHESIS_PROMPT, TEXT_TO_SQL_PROMPT};

/// Rows of SQL output shown to the model when writing the answer
pub const MAX_CONTEXT_ROWS: usize = 50;

/// Whether the answer should be produced in one piece or streamed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryMode {
    Complete,
    Streaming,
}

/// Answer produced by the engine
pub enum QueryOutput {
    Full(String),
    Stream(TextStream),
}

impl QueryOutput {
    /// View the answer as a stream; a full answer becomes a single chunk
    pub fn into_stream(self) -> TextStream {
        match self {
            QueryOutput::Full(text) => Box::pin(futures::stream::once(async move { Ok(text) })),
            QueryOutput::Stream(stream) => stream,
        }
    }

    /// Collect the answer into one string
    pub async fn into_text(self) -> Result<String, CrmError> {
        match self {
            QueryOutput::Full(text) => Ok(text),
            QueryOutput::Stream(mut stream) => {
                let mut text = String::new();
                while let Some(chunk) = stream.next().await {
                    text.push_str(&chunk?);
                }
                Ok(text)
            }
        }
    }
}

impl fmt::Debug for QueryOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryOutput::Full(text) => f.debug_tuple("Full").field(text).finish(),
            QueryOutput::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// Text-to-SQL engine over a fixed set of tables
pub struct TextToSqlEngine {
    llm: Arc<dyn LanguageModel>,
    database: Arc<dyn SqlDatabase>,
    tables: Vec<String>,
    /// Built on first use; a failed lookup is retried on the next call
    schema_context: OnceCell<String>,
}

impl TextToSqlEngine {
    pub fn new(
        llm: Arc<dyn LanguageModel>,
        database: Arc<dyn SqlDatabase>,
        tables: Vec<String>,
    ) -> Self {
        Self {
            llm,
            database,
            tables,
            schema_context: OnceCell::new(),
        }
    }

    pub fn tables(&self) -> &[String] {
        &self.tables
    }

    /// Description of every allowed table, one line each
    pub async fn schema_context(&self) -> Result<&str, CrmError> {
        let context = self
            .schema_context
            .get_or_try_init(|| async {
                let schemas = self.database.describe_tables(&self.tables).await?;
                info!("Loaded schema for tables: {}", self.tables.join(", "));
                Ok::<_, CrmError>(
                    schemas
                        .iter()
                        .map(TableSchema::describe)
                        .collect::<Vec<_>>()
                        .join("\n"),
                )
            })
            .await?;
        Ok(context.as_str())
    }

    /// Ask the model for a SQL statement answering `question`
    pub async fn generate_sql(&self, question: &str) -> Result<String, CrmError> {
        let schema = self.schema_context().await?;
        let prompt = TEXT_TO_SQL_PROMPT.format(&[
            ("dialect", self.database.dialect()),
            ("schema", schema),
            ("query_str", question),
        ])?;

        let reply = self.llm.complete(&prompt).await?;
        extract_sql(&reply).ok_or_else(|| {
            CrmError::QueryExecution("Language model did not return a SQL statement".to_string())
        })
    }

    /// Answer `question` from the database
    pub async fn query(&self, question: &str, mode: QueryMode) -> Result<QueryOutput, CrmError> {
        let sql = self.generate_sql(question).await?;
        debug!("Generated SQL: {}", sql);

        let result = self.database.execute(&sql).await?;
        info!("Text-to-SQL query returned {} rows", result.len());

        let context = render_markdown_table(&result, MAX_CONTEXT_ROWS);
        let prompt = RESPONSE_SYNTHESIS_PROMPT.format(&[
            ("query_str", question),
            ("sql_query", sql.as_str()),
            ("context_str", context.as_str()),
        ])?;

        if mode == QueryMode::Streaming && self.llm.supports_streaming() {
            Ok(QueryOutput::Stream(self.llm.stream(&prompt).await?))
        } else {
            Ok(QueryOutput::Full(self.llm.complete(&prompt).await?))
        }
    }
}
