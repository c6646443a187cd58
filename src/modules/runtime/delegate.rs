//! Query delegate
//!
//! Owns the language model, the database and the text-to-SQL engine, and is
//! the single entry point the HTTP handlers call into.

use crm_query_core::{CrmError, Segment, SegmentSqlPolicy, Settings};
use crm_query_types::Row;
use futures::StreamExt;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::connectors::SqlDatabase;
use crate::engine::{QueryMode, TextToSqlEngine};
use crate::llm::{LanguageModel, TextStream};
use crate::prompts::SEGMENT_GENERATION_PROMPT;

/// Characters of segment SQL written to the log
const SQL_LOG_PREFIX: usize = 100;

pub struct QueryDelegate {
    llm: Arc<dyn LanguageModel>,
    database: Arc<dyn SqlDatabase>,
    engine: TextToSqlEngine,
    policy: SegmentSqlPolicy,
    /// Configured tables, bare and qualified with the database name
    allowed_tables: Vec<String>,
}

impl QueryDelegate {
    pub fn new(
        llm: Arc<dyn LanguageModel>,
        database: Arc<dyn SqlDatabase>,
        settings: &Settings,
    ) -> Self {
        let tables = settings.database.tables.clone();
        let qualified = tables
            .iter()
            .map(|t| format!("{}.{}", settings.database.database, t));
        let allowed_tables = tables.iter().cloned().chain(qualified).collect();
        let engine = TextToSqlEngine::new(llm.clone(), database.clone(), tables);

        Self {
            llm,
            database,
            engine,
            policy: settings.segment_sql_policy,
            allowed_tables,
        }
    }

    pub fn engine(&self) -> &TextToSqlEngine {
        &self.engine
    }

    /// Answer a natural-language question about the CRM data
    pub async fn answer(&self, question: &str) -> Result<String, CrmError> {
        info!("Processing query: {}", question);

        let result = match self.engine.query(question, QueryMode::Complete).await {
            Ok(output) => output.into_text().await,
            Err(e) => Err(e),
        };

        match result {
            Ok(answer) => {
                info!("Query completed successfully");
                Ok(answer)
            }
            Err(e) => {
                error!("Query error: {}", e);
                Err(e)
            }
        }
    }

    /// Answer a question as a stream of text chunks
    ///
    /// The stream ends after the first error it yields.
    pub async fn answer_streaming(&self, question: &str) -> Result<TextStream, CrmError> {
        info!("Processing streaming query: {}", question);

        let mut chunks = match self.engine.query(question, QueryMode::Streaming).await {
            Ok(output) => output.into_stream(),
            Err(e) => {
                error!("Streaming query error: {}", e);
                return Err(e);
            }
        };

        let logged = async_stream::stream! {
            let mut failed = false;
            while let Some(chunk) = chunks.next().await {
                if let Err(e) = &chunk {
                    error!("Streaming query error: {}", e);
                    failed = true;
                }
                yield chunk;
                if failed {
                    break;
                }
            }
            if !failed {
                info!("Streaming query completed successfully");
            }
        };
        Ok(Box::pin(logged))
    }

    /// Turn a segment description into a named SQL filter
    pub async fn generate_segment(&self, description: &str) -> Result<Segment, CrmError> {
        info!("Generating segment for: {}", description);

        let prompt = SEGMENT_GENERATION_PROMPT.format(&[("description", description)])?;
        let reply = self.llm.complete(&prompt).await.map_err(|e| {
            error!("Segment generation error: {}", e);
            e
        })?;

        match Segment::from_model_output(&reply) {
            Ok(segment) => {
                info!("Generated segment: {}", segment.name);
                debug!("Segment SQL: {}", segment.sql);
                Ok(segment)
            }
            Err(e) => {
                error!("Failed to parse segment response: {}", e);
                Err(e)
            }
        }
    }

    /// Run segment SQL and return the matching customers
    pub async fn execute_segment_sql(&self, sql: &str) -> Result<Vec<Row>, CrmError> {
        let preview: String = sql.chars().take(SQL_LOG_PREFIX).collect();
        info!("Executing segment SQL: {}...", preview);

        if let Err(e) = self.policy.check(sql, &self.allowed_tables) {
            error!("Segment SQL rejected ({} policy): {}", self.policy, e);
            return Err(e);
        }

        match self.database.execute(sql).await {
            Ok(result) => {
                info!("Segment query returned {} rows", result.len());
                Ok(result.rows)
            }
            Err(e) => {
                error!("Segment SQL execution error: {}", e);
                Err(e)
            }
        }
    }

    /// Whether the database answers a trivial query
    pub async fn health_check(&self) -> bool {
        match self.database.health_check().await {
            Ok(()) => true,
            Err(e) => {
                error!("Health check failed: {}", e);
                false
            }
        }
    }

    /// Release the database pool
    pub async fn close(&self) {
        self.database.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockDatabase, MockLanguageModel};
    use crm_query_core::ErrorKind;
    use tokio_test::assert_ok;

    fn delegate(llm: MockLanguageModel, db: MockDatabase) -> QueryDelegate {
        QueryDelegate::new(Arc::new(llm), Arc::new(db), &Settings::default())
    }

    #[tokio::test]
    async fn test_answer() {
        let delegate = delegate(
            MockLanguageModel::new()
                .reply("SELECT custid, custname FROM customer")
                .reply("Ada 2 pelanggan."),
            MockDatabase::new(),
        );
        assert_eq!(delegate.answer("berapa?").await.unwrap(), "Ada 2 pelanggan.");
    }

    #[tokio::test]
    async fn test_answer_propagates_llm_failure() {
        let delegate = delegate(MockLanguageModel::new().fail("timeout"), MockDatabase::new());
        let err = delegate.answer("berapa?").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Infrastructure);
    }

    #[tokio::test]
    async fn test_answer_streaming_stops_after_error() {
        let delegate = delegate(
            MockLanguageModel::new()
                .reply("SELECT 1")
                .chunks(&["Ada "])
                .chunk_error("connection reset")
                .chunks(&["never"]),
            MockDatabase::new(),
        );

        let items: Vec<Result<String, CrmError>> =
            delegate.answer_streaming("?").await.unwrap().collect().await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap(), "Ada ");
        assert!(items[1].is_err());
    }

    #[tokio::test]
    async fn test_generate_segment_fenced() {
        let reply = "```json\n{\"name\": \"Pelanggan Korporat\", \"sql\": \"SELECT custid FROM customer WHERE custtypedetail = 6\"}\n```";
        let delegate = delegate(MockLanguageModel::new().reply(reply), MockDatabase::new());

        let segment = delegate.generate_segment("pelanggan korporat").await.unwrap();
        assert_eq!(segment.name, "Pelanggan Korporat");
        assert_eq!(segment.sql, "SELECT custid FROM customer WHERE custtypedetail = 6");
    }

    #[tokio::test]
    async fn test_generate_segment_errors() {
        let delegate = delegate(
            MockLanguageModel::new().reply("bukan json").fail("quota exceeded"),
            MockDatabase::new(),
        );

        let err = delegate.generate_segment("x").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidFormat);

        let err = delegate.generate_segment("x").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Infrastructure);
    }

    #[tokio::test]
    async fn test_execute_segment_sql() {
        let db = Arc::new(MockDatabase::new());
        let delegate = QueryDelegate::new(
            Arc::new(MockLanguageModel::new()),
            db.clone(),
            &Settings::default(),
        );

        let rows = assert_ok!(
            delegate
                .execute_segment_sql("SELECT custid, custname FROM customer")
                .await
        );
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["custname"], "PT Maju Jaya");
        assert_eq!(db.executed(), vec!["SELECT custid, custname FROM customer"]);
    }

    #[tokio::test]
    async fn test_execute_segment_sql_policy() {
        let db = Arc::new(MockDatabase::new());
        let mut settings = Settings::default();
        settings.segment_sql_policy = SegmentSqlPolicy::ReadOnly;
        let delegate = QueryDelegate::new(Arc::new(MockLanguageModel::new()), db.clone(), &settings);

        let err = delegate
            .execute_segment_sql("DELETE FROM customer")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
        assert!(db.executed().is_empty());
    }

    #[tokio::test]
    async fn test_execute_segment_sql_allowed_tables() {
        let db = Arc::new(MockDatabase::new());
        let mut settings = Settings::default();
        settings.segment_sql_policy = SegmentSqlPolicy::AllowedTables;
        let delegate = QueryDelegate::new(Arc::new(MockLanguageModel::new()), db.clone(), &settings);

        assert_ok!(
            delegate
                .execute_segment_sql("SELECT c.custid FROM clonecrm.customer c, invoice i")
                .await
        );
        let err = delegate
            .execute_segment_sql("SELECT u.* FROM customer c, mysql.user u")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
        assert_eq!(db.executed().len(), 1);
    }

    #[tokio::test]
    async fn test_health_check() {
        let healthy = delegate(MockLanguageModel::new(), MockDatabase::new());
        assert!(healthy.health_check().await);

        let down = delegate(MockLanguageModel::new(), MockDatabase::new().unhealthy());
        assert!(!down.health_check().await);
    }
}
