//! OpenAI-compatible chat completions handler

use axum::{
    extract::State,
    response::{
        sse::{Event, Sse},
        IntoResponse, Response,
    },
    Json,
};
use crm_query_core::CrmError;
use crm_query_types::{
    completion_id, unix_timestamp, ChatCompletionChunk, ChatCompletionRequest,
    ChatCompletionResponse, StreamError,
};
use futures::{Stream, StreamExt};
use serde::Serialize;
use std::convert::Infallible;
use std::sync::Arc;
use tracing::{debug, error, info};

use super::error::ApiError;
use crate::delegate::QueryDelegate;
use crate::llm::DONE_SENTINEL;
use crate::state::AppState;

/// Handler for chat completion requests
pub struct ChatHandler;

impl ChatHandler {
    /// Handle POST /v1/chat/completions
    pub async fn completions(
        State(state): State<AppState>,
        Json(request): Json<ChatCompletionRequest>,
    ) -> Result<Response, ApiError> {
        let question = request
            .last_user_message()
            .ok_or_else(|| CrmError::InvalidRequest("No user message provided".to_string()))?
            .to_string();
        info!("Received query: {}", question);

        if request.is_streaming() {
            let events = completion_events(state.delegate.clone(), question, request.model)
                .map(|data| Ok::<_, Infallible>(Event::default().data(data)));
            return Ok(Sse::new(events).into_response());
        }

        let answer = state.delegate.answer(&question).await?;
        let response = ChatCompletionResponse::answer(
            completion_id(),
            unix_timestamp(),
            request.model,
            &question,
            answer,
        );
        Ok(Json(response).into_response())
    }
}

/// `data:` payloads for a streamed completion
///
/// One chunk per piece of the answer, then a finish chunk, then `[DONE]`.
/// A failure at any point yields a single `{"error": ...}` payload instead
/// and ends the stream there.
pub fn completion_events(
    delegate: Arc<QueryDelegate>,
    question: String,
    model: String,
) -> impl Stream<Item = String> + Send {
    let id = completion_id();
    let created = unix_timestamp();

    async_stream::stream! {
        let mut chunks = match delegate.answer_streaming(&question).await {
            Ok(chunks) => chunks,
            Err(e) => {
                yield error_event(&e);
                return;
            }
        };

        while let Some(chunk) = chunks.next().await {
            match chunk {
                Ok(text) => {
                    yield to_json(&ChatCompletionChunk::content(&id, created, &model, text));
                }
                Err(e) => {
                    debug!("Streaming completion ended with error: {}", e);
                    yield error_event(&e);
                    return;
                }
            }
        }

        yield to_json(&ChatCompletionChunk::finish(&id, created, &model));
        yield DONE_SENTINEL.to_string();
    }
}

fn error_event(err: &CrmError) -> String {
    to_json(&StreamError {
        error: err.to_string(),
    })
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| {
        error!("Failed to serialize stream event: {}", e);
        format!("{{\"error\":\"{}\"}}", e)
    })
}
