//! HTTP request handlers for the CRM query backend
//!
//! This module contains the OpenAI-compatible chat and model endpoints, the
//! customer segment endpoints, health, and OpenAPI documentation.

mod chat;
mod error;
mod health;
mod models;
mod openapi;
mod segments;

pub use chat::{completion_events, ChatHandler};
pub use error::ApiError;
pub use health::HealthHandler;
pub use models::ModelsHandler;
pub use openapi::OpenApiHandler;
pub use segments::SegmentHandler;
