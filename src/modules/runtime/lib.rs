//! Runtime server for the CRM query backend
//!
//! This crate provides the HTTP server, the MySQL connector, the language
//! model client, the text-to-SQL engine, and the request handlers.

pub mod connectors;
pub mod delegate;
pub mod engine;
pub mod handlers;
pub mod llm;
pub mod prompts;
pub mod server;
pub mod state;

#[cfg(test)]
mod testing;

pub use connectors::{MySqlConnector, SqlDatabase};
pub use delegate::QueryDelegate;
pub use engine::{QueryMode, QueryOutput, TextToSqlEngine};
pub use handlers::{ChatHandler, HealthHandler, ModelsHandler, OpenApiHandler, SegmentHandler};
pub use llm::{LanguageModel, OpenAiClient, TextStream};
pub use server::{build_router, Runtime};
pub use state::AppState;
