//! OpenAI-compatible chat-completions client

use async_trait::async_trait;
use crm_query_core::{CrmError, LlmSettings};
use futures::StreamExt;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, error};

use super::sse::{SseDecoder, DONE_SENTINEL};
use super::{LanguageModel, TextStream};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Non-streaming response body
#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

/// One streamed `data:` payload
#[derive(Debug, Deserialize)]
struct CompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

/// Client for `POST {base_url}/chat/completions`
pub struct OpenAiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(settings: &LlmSettings) -> Result<Self, CrmError> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| CrmError::Llm(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn payload(&self, prompt: &str, stream: bool) -> serde_json::Value {
        json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
            "temperature": 0,
            "stream": stream,
        })
    }

    async fn send(&self, prompt: &str, stream: bool) -> Result<reqwest::Response, CrmError> {
        debug!("Sending {} prompt characters to {}", prompt.len(), self.model);

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&self.payload(prompt, stream))
            .send()
            .await
            .map_err(|e| CrmError::Llm(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Language model returned {}: {}", status, body);
            return Err(CrmError::Llm(format!("{} returned {}: {}", self.model, status, body)));
        }
        Ok(response)
    }
}

/// Content of one streamed payload; `None` for role-only or empty deltas
fn chunk_content(data: &str) -> Result<Option<String>, CrmError> {
    let chunk: CompletionChunk = serde_json::from_str(data)
        .map_err(|e| CrmError::Llm(format!("Malformed stream chunk '{}': {}", data, e)))?;

    if let Some(err) = chunk.error {
        let message = err
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| err.to_string());
        return Err(CrmError::Llm(message));
    }

    Ok(chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content)
        .filter(|content| !content.is_empty()))
}

#[async_trait]
impl LanguageModel for OpenAiClient {
    async fn complete(&self, prompt: &str) -> Result<String, CrmError> {
        let response: CompletionResponse = self
            .send(prompt, false)
            .await?
            .json()
            .await
            .map_err(|e| CrmError::Llm(format!("Malformed completion response: {}", e)))?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| CrmError::Llm("Completion response has no content".to_string()))
    }

    async fn stream(&self, prompt: &str) -> Result<TextStream, CrmError> {
        let response = self.send(prompt, true).await?;
        let mut body = Box::pin(response.bytes_stream());

        let chunks = async_stream::stream! {
            let mut decoder = SseDecoder::new();
            let mut finished = false;

            'outer: while let Some(frame) = body.next().await {
                let frame = match frame {
                    Ok(frame) => frame,
                    Err(e) => {
                        yield Err(CrmError::Llm(format!("Stream interrupted: {}", e)));
                        finished = true;
                        break;
                    }
                };

                for data in decoder.push(&frame) {
                    if data == DONE_SENTINEL {
                        finished = true;
                        break 'outer;
                    }
                    match chunk_content(&data) {
                        Ok(Some(content)) => {
                            yield Ok(content);
                        }
                        Ok(None) => {}
                        Err(e) => {
                            yield Err(e);
                            finished = true;
                            break 'outer;
                        }
                    }
                }
            }

            if !finished {
                if let Some(data) = decoder.finish() {
                    if data != DONE_SENTINEL {
                        match chunk_content(&data) {
                            Ok(Some(content)) => {
                                yield Ok(content);
                            }
                            Ok(None) => {}
                            Err(e) => {
                                yield Err(e);
                            }
                        }
                    }
                }
            }
        };

        Ok(Box::pin(chunks))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
