//! Type definitions for the CRM query backend
//!
//! This crate contains the request and response shapes shared across the
//! workspace: the OpenAI-compatible chat/model objects, the segment payloads,
//! and the small runtime bodies (health, error detail).

pub mod chat;
pub mod models;
pub mod runtime;
pub mod segment;

pub use chat::{
    completion_id, unix_timestamp, ChatChoice, ChatCompletionChunk, ChatCompletionRequest,
    ChatCompletionResponse, ChatMessage, ChunkChoice, Delta, Role, Usage, DEFAULT_MODEL_ID,
};
pub use models::{ModelInfo, ModelsResponse};
pub use runtime::{ErrorDetail, HealthResponse, StreamError};
pub use segment::{Row, SegmentExecuteRequest, SegmentExecuteResponse, SegmentGenerateRequest};
