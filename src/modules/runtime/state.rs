//! Shared runtime application state (HTTP handlers)

use crm_query_core::Settings;
use std::sync::Arc;

use crate::delegate::QueryDelegate;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub delegate: Arc<QueryDelegate>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(delegate: Arc<QueryDelegate>, settings: Arc<Settings>) -> Self {
        Self { delegate, settings }
    }
}
