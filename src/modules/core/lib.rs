//! Core domain logic for the CRM query backend
//!
//! This crate contains the settings model, segment definitions, the segment
//! SQL trust policy, and the error types shared by every other crate.

pub mod domain;
pub mod error;

pub use domain::*;
pub use error::{CrmError, ErrorKind, Result};
