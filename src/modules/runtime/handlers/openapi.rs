//! OpenAPI documentation handler

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use crm_query_core::Settings;
use serde_json::{json, Value};

use crate::state::AppState;

/// Handler for OpenAPI documentation
pub struct OpenApiHandler;

impl OpenApiHandler {
    /// Handle GET /openapi.json
    pub async fn handle(State(state): State<AppState>) -> impl IntoResponse {
        (StatusCode::OK, Json(Self::generate_spec(&state.settings)))
    }

    fn json_body(schema: &str) -> Value {
        json!({
            "required": true,
            "content": {
                "application/json": {
                    "schema": { "$ref": format!("#/components/schemas/{}", schema) }
                }
            }
        })
    }

    fn json_response(description: &str, schema: &str) -> Value {
        json!({
            "description": description,
            "content": {
                "application/json": {
                    "schema": { "$ref": format!("#/components/schemas/{}", schema) }
                }
            }
        })
    }

    fn paths() -> Value {
        let error = Self::json_response("Error", "ErrorDetail");

        json!({
            "/health": {
                "get": {
                    "summary": "Service and database health",
                    "operationId": "health",
                    "tags": ["system"],
                    "responses": {
                        "200": Self::json_response("Health status", "HealthResponse")
                    }
                }
            },
            "/v1/models": {
                "get": {
                    "summary": "List available models",
                    "operationId": "list_models",
                    "tags": ["openai"],
                    "responses": {
                        "200": Self::json_response("Model list", "ModelsResponse")
                    }
                }
            },
            "/v1/chat/completions": {
                "post": {
                    "summary": "Answer the last user message from the CRM database",
                    "operationId": "chat_completions",
                    "tags": ["openai"],
                    "requestBody": Self::json_body("ChatCompletionRequest"),
                    "responses": {
                        "200": {
                            "description": "Completion, or server-sent chunks ending with [DONE] when stream is true",
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/ChatCompletionResponse" }
                                },
                                "text/event-stream": {
                                    "schema": { "type": "string" }
                                }
                            }
                        },
                        "400": error.clone(),
                        "500": error.clone()
                    }
                }
            },
            "/api/segments/generate": {
                "post": {
                    "summary": "Generate segment SQL from a description",
                    "operationId": "generate_segment",
                    "tags": ["segments"],
                    "requestBody": Self::json_body("SegmentGenerateRequest"),
                    "responses": {
                        "200": Self::json_response("Generated segment", "Segment"),
                        "400": error.clone(),
                        "500": error.clone()
                    }
                }
            },
            "/api/segments/execute": {
                "post": {
                    "summary": "Run segment SQL and return matching customers",
                    "operationId": "execute_segment",
                    "tags": ["segments"],
                    "requestBody": Self::json_body("SegmentExecuteRequest"),
                    "responses": {
                        "200": Self::json_response("Matching customers", "SegmentExecuteResponse"),
                        "400": error.clone(),
                        "500": error
                    }
                }
            }
        })
    }

    fn schemas() -> Value {
        json!({
            "ErrorDetail": {
                "type": "object",
                "properties": { "detail": { "type": "string" } },
                "required": ["detail"]
            },
            "HealthResponse": {
                "type": "object",
                "properties": {
                    "status": { "type": "string", "enum": ["healthy", "unhealthy"] },
                    "database": { "type": "string", "enum": ["connected", "disconnected"] }
                },
                "required": ["status", "database"]
            },
            "ModelsResponse": {
                "type": "object",
                "properties": {
                    "object": { "type": "string" },
                    "data": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "id": { "type": "string" },
                                "object": { "type": "string" },
                                "created": { "type": "integer" },
                                "owned_by": { "type": "string" }
                            }
                        }
                    }
                }
            },
            "ChatMessage": {
                "type": "object",
                "properties": {
                    "role": { "type": "string", "enum": ["system", "user", "assistant"] },
                    "content": { "type": "string" }
                },
                "required": ["role", "content"]
            },
            "ChatCompletionRequest": {
                "type": "object",
                "properties": {
                    "model": { "type": "string" },
                    "messages": {
                        "type": "array",
                        "items": { "$ref": "#/components/schemas/ChatMessage" }
                    },
                    "temperature": { "type": "number" },
                    "max_tokens": { "type": "integer" },
                    "stream": { "type": "boolean", "default": false }
                },
                "required": ["messages"]
            },
            "ChatCompletionResponse": {
                "type": "object",
                "properties": {
                    "id": { "type": "string" },
                    "object": { "type": "string" },
                    "created": { "type": "integer" },
                    "model": { "type": "string" },
                    "choices": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "index": { "type": "integer" },
                                "message": { "$ref": "#/components/schemas/ChatMessage" },
                                "finish_reason": { "type": "string" }
                            }
                        }
                    },
                    "usage": {
                        "type": "object",
                        "properties": {
                            "prompt_tokens": { "type": "integer" },
                            "completion_tokens": { "type": "integer" },
                            "total_tokens": { "type": "integer" }
                        }
                    }
                }
            },
            "SegmentGenerateRequest": {
                "type": "object",
                "properties": { "description": { "type": "string" } },
                "required": ["description"]
            },
            "Segment": {
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "sql": { "type": "string" }
                },
                "required": ["name", "sql"]
            },
            "SegmentExecuteRequest": {
                "type": "object",
                "properties": { "sql": { "type": "string" } },
                "required": ["sql"]
            },
            "SegmentExecuteResponse": {
                "type": "object",
                "properties": {
                    "customers": {
                        "type": "array",
                        "items": { "type": "object", "additionalProperties": true }
                    },
                    "count": { "type": "integer" }
                },
                "required": ["customers", "count"]
            }
        })
    }

    /// Generate OpenAPI 3.0 specification
    pub fn generate_spec(settings: &Settings) -> Value {
        json!({
            "openapi": "3.0.3",
            "info": {
                "title": "CRM Query Backend",
                "version": env!("CARGO_PKG_VERSION"),
                "description": "OpenAI-compatible natural-language queries and customer segments over the CRM database"
            },
            "servers": [
                {
                    "url": format!("http://localhost:{}", settings.server.port),
                    "description": "Local development server"
                }
            ],
            "paths": Self::paths(),
            "components": { "schemas": Self::schemas() },
            "tags": [
                { "name": "system", "description": "Service status" },
                { "name": "openai", "description": "OpenAI-compatible endpoints" },
                { "name": "segments", "description": "Customer segment endpoints" }
            ]
        })
    }
}
