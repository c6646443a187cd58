//! HTTP server for the CRM query backend

use axum::{
    routing::{get, post},
    Router,
};
use crm_query_core::{CrmError, Settings};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

use crate::connectors::{MySqlConnector, SqlDatabase};
use crate::delegate::QueryDelegate;
use crate::handlers::{ChatHandler, HealthHandler, ModelsHandler, OpenApiHandler, SegmentHandler};
use crate::llm::{LanguageModel, OpenAiClient};
use crate::state::AppState;

/// Build the Axum router
pub fn build_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request timeout
    let timeout = TimeoutLayer::new(state.settings.server.request_timeout());

    Router::new()
        // OpenAI-compatible endpoints
        .route("/v1/models", get(ModelsHandler::list))
        .route("/v1/chat/completions", post(ChatHandler::completions))
        // Segment endpoints
        .route("/api/segments/generate", post(SegmentHandler::generate))
        .route("/api/segments/execute", post(SegmentHandler::execute))
        // Documentation
        .route("/openapi.json", get(OpenApiHandler::handle))
        // Health check
        .route("/health", get(HealthHandler::check))
        // State
        .with_state(state)
        // Middleware
        .layer(cors)
        .layer(timeout)
        .layer(TraceLayer::new_for_http())
}

/// Runtime server for the CRM query backend
pub struct Runtime {
    settings: Arc<Settings>,
    delegate: Arc<QueryDelegate>,
}

impl Runtime {
    /// Create a runtime backed by MySQL and the configured OpenAI endpoint
    ///
    /// Nothing connects yet; the pool opens its first connection on demand.
    pub fn new(settings: Settings) -> Result<Self, CrmError> {
        let database: Arc<dyn SqlDatabase> =
            Arc::new(MySqlConnector::connect_lazy(&settings.database));
        let llm: Arc<dyn LanguageModel> = Arc::new(OpenAiClient::new(&settings.llm)?);
        Ok(Self::with_backends(settings, llm, database))
    }

    /// Create a runtime over explicit backends
    pub fn with_backends(
        settings: Settings,
        llm: Arc<dyn LanguageModel>,
        database: Arc<dyn SqlDatabase>,
    ) -> Self {
        let delegate = Arc::new(QueryDelegate::new(llm, database, &settings));
        Self {
            settings: Arc::new(settings),
            delegate,
        }
    }

    pub fn router(&self) -> Router {
        build_router(AppState::new(self.delegate.clone(), self.settings.clone()))
    }

    /// Start the server
    pub async fn run(&self) -> Result<(), CrmError> {
        let addr: SocketAddr = self
            .settings
            .server
            .bind_address()
            .parse()
            .map_err(|e| CrmError::Server(format!("Invalid address: {}", e)))?;

        let app = self.router();

        info!("Starting CRM query server on http://{}", addr);
        info!(
            "Database: {} (database '{}')",
            self.settings.database.address(),
            self.settings.database.database
        );
        info!("Tables: {}", self.settings.database.tables.join(", "));
        info!("Model: {}", self.settings.llm.model);
        info!("Segment SQL policy: {}", self.settings.segment_sql_policy);
        info!("OpenAPI docs: http://{}/openapi.json", addr);

        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| CrmError::Server(format!("Failed to bind: {}", e)))?;

        axum::serve(listener, app)
            .with_graceful_shutdown(Self::shutdown_signal())
            .await
            .map_err(|e| CrmError::Server(format!("Server error: {}", e)))?;

        info!("Server stopped");
        self.shutdown().await;

        Ok(())
    }

    /// Wait for shutdown signal
    async fn shutdown_signal() {
        let ctrl_c = async {
            if let Err(e) = signal::ctrl_c().await {
                error!("Failed to install CTRL+C signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    sigterm.recv().await;
                }
                Err(e) => {
                    error!("Failed to install SIGTERM signal handler: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                debug!("Received CTRL+C, shutting down...");
            }
            _ = terminate => {
                debug!("Received SIGTERM, shutting down...");
            }
        }
    }

    /// Gracefully shutdown the runtime
    pub async fn shutdown(&self) {
        info!("Closing database connections...");
        self.delegate.close().await;
        info!("Shutdown complete");
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn delegate(&self) -> &QueryDelegate {
        &self.delegate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockDatabase, MockLanguageModel};
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    fn runtime(db: MockDatabase) -> Runtime {
        Runtime::with_backends(
            Settings::default(),
            Arc::new(MockLanguageModel::new()),
            Arc::new(db),
        )
    }

    async fn get_json(router: Router, uri: &str) -> (StatusCode, Value) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_runtime_creation() {
        let runtime = tokio_test::assert_ok!(Runtime::new(Settings::default()));
        assert_eq!(runtime.settings().server.port, 8000);
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get_json(runtime(MockDatabase::new()).router(), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["database"], "connected");

        let (status, body) =
            get_json(runtime(MockDatabase::new().unhealthy()).router(), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "unhealthy");
        assert_eq!(body["database"], "disconnected");
    }

    #[tokio::test]
    async fn test_models() {
        let (status, body) = get_json(runtime(MockDatabase::new()).router(), "/v1/models").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["object"], "list");
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
        assert_eq!(body["data"][0]["id"], "crm-sql-engine");
        assert_eq!(body["data"][0]["owned_by"], "crm-backend");
    }

    #[tokio::test]
    async fn test_openapi() {
        let (status, body) =
            get_json(runtime(MockDatabase::new()).router(), "/openapi.json").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["info"]["title"], "CRM Query Backend");
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let response = runtime(MockDatabase::new())
            .router()
            .oneshot(Request::builder().uri("/query/x").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
