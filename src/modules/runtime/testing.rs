//! In-memory fakes for the language model and database seams

use async_trait::async_trait;
use crm_query_core::CrmError;
use crm_query_types::Row;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::connectors::{ColumnInfo, QueryRows, SqlDatabase, TableSchema};
use crate::llm::{LanguageModel, TextStream};

/// Language model that plays back scripted replies
#[derive(Default)]
pub struct MockLanguageModel {
    replies: Mutex<VecDeque<Result<String, String>>>,
    chunks: Vec<Result<String, String>>,
    no_streaming: bool,
    prompts: Mutex<Vec<String>>,
}

impl MockLanguageModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply for the next `complete` call
    pub fn reply(mut self, text: &str) -> Self {
        self.replies.get_mut().unwrap().push_back(Ok(text.to_string()));
        self
    }

    /// Queue a failure for the next `complete` call
    pub fn fail(mut self, message: &str) -> Self {
        self.replies
            .get_mut()
            .unwrap()
            .push_back(Err(message.to_string()));
        self
    }

    /// Chunks yielded by `stream`
    pub fn chunks(mut self, chunks: &[&str]) -> Self {
        self.chunks
            .extend(chunks.iter().map(|c| Ok(c.to_string())));
        self
    }

    /// Make `stream` fail after the chunks queued so far
    pub fn chunk_error(mut self, message: &str) -> Self {
        self.chunks.push(Err(message.to_string()));
        self
    }

    pub fn without_streaming(mut self) -> Self {
        self.no_streaming = true;
        self
    }

    /// Every prompt received, in order
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    fn next_reply(&self, prompt: &str) -> Result<String, CrmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err("no scripted reply".to_string()))
            .map_err(CrmError::Llm)
    }
}

#[async_trait]
impl LanguageModel for MockLanguageModel {
    async fn complete(&self, prompt: &str) -> Result<String, CrmError> {
        self.next_reply(prompt)
    }

    async fn stream(&self, prompt: &str) -> Result<TextStream, CrmError> {
        if self.chunks.is_empty() {
            let reply = self.next_reply(prompt)?;
            return Ok(Box::pin(futures::stream::iter(vec![Ok(reply)])));
        }
        self.prompts.lock().unwrap().push(prompt.to_string());
        let chunks: Vec<Result<String, CrmError>> = self
            .chunks
            .iter()
            .cloned()
            .map(|c| c.map_err(CrmError::Llm))
            .collect();
        Ok(Box::pin(futures::stream::iter(chunks)))
    }

    fn supports_streaming(&self) -> bool {
        !self.no_streaming
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}

/// Database holding two CRM tables and a fixed query result
pub struct MockDatabase {
    result: Result<QueryRows, String>,
    schemas: Vec<TableSchema>,
    healthy: bool,
    executed: Mutex<Vec<String>>,
    describe_calls: AtomicUsize,
}

impl MockDatabase {
    pub fn new() -> Self {
        Self {
            result: Ok(customer_rows()),
            schemas: vec![
                table("customer", &[("custid", "int"), ("custname", "varchar(100)")]),
                table(
                    "invoice",
                    &[("invno", "int"), ("custid", "int"), ("balanceinvoice", "decimal(18,2)")],
                ),
            ],
            healthy: true,
            executed: Mutex::new(Vec::new()),
            describe_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_rows(mut self, rows: QueryRows) -> Self {
        self.result = Ok(rows);
        self
    }

    pub fn failing_query(mut self, message: &str) -> Self {
        self.result = Err(message.to_string());
        self
    }

    pub fn unhealthy(mut self) -> Self {
        self.healthy = false;
        self
    }

    /// Every statement executed, in order
    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }

    pub fn describe_calls(&self) -> usize {
        self.describe_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SqlDatabase for MockDatabase {
    async fn execute(&self, statement: &str) -> Result<QueryRows, CrmError> {
        self.executed.lock().unwrap().push(statement.to_string());
        self.result
            .clone()
            .map_err(|e| CrmError::QueryExecution(format!("MySQL query failed: {}", e)))
    }

    async fn describe_tables(&self, tables: &[String]) -> Result<Vec<TableSchema>, CrmError> {
        self.describe_calls.fetch_add(1, Ordering::SeqCst);
        tables
            .iter()
            .map(|name| {
                self.schemas
                    .iter()
                    .find(|s| s.name.eq_ignore_ascii_case(name))
                    .cloned()
                    .ok_or_else(|| CrmError::Config(format!("Table '{}' not found", name)))
            })
            .collect()
    }

    async fn health_check(&self) -> Result<(), CrmError> {
        if self.healthy {
            Ok(())
        } else {
            Err(CrmError::Database("connection refused".to_string()))
        }
    }

    async fn close(&self) {}

    fn dialect(&self) -> &'static str {
        "mysql"
    }
}

fn table(name: &str, columns: &[(&str, &str)]) -> TableSchema {
    TableSchema {
        name: name.to_string(),
        columns: columns
            .iter()
            .map(|(name, data_type)| ColumnInfo {
                name: name.to_string(),
                data_type: data_type.to_string(),
            })
            .collect(),
    }
}

/// Two customers, as `execute` returns them
pub fn customer_rows() -> QueryRows {
    QueryRows {
        columns: vec!["custid".to_string(), "custname".to_string()],
        rows: vec![
            Row::from_iter([
                ("custid".to_string(), json!(1)),
                ("custname".to_string(), json!("PT Maju Jaya")),
            ]),
            Row::from_iter([
                ("custid".to_string(), json!(2)),
                ("custname".to_string(), json!("Budi Santoso")),
            ]),
        ],
    }
}
