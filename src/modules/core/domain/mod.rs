//! Domain models for the CRM query backend

mod policy;
mod segment;
mod settings;
mod types;

pub use policy::SegmentSqlPolicy;
pub use segment::{strip_code_fence, Segment};
pub use settings::{DatabaseSettings, LlmSettings, ServerSettings, Settings, DEFAULT_TABLES};
pub use types::PoolConfig;
