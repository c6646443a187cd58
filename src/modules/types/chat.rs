//! OpenAI-compatible chat completion types
//!
//! These mirror the public chat-completions contract closely enough that
//! stock OpenAI SDK clients can talk to the backend unmodified.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Object tag for a non-streaming completion
pub const COMPLETION_OBJECT: &str = "chat.completion";

/// Object tag for a streamed completion chunk
pub const CHUNK_OBJECT: &str = "chat.completion.chunk";

/// Model identifier advertised by this backend
pub const DEFAULT_MODEL_ID: &str = "crm-sql-engine";

/// Finish reason reported when an answer is complete
pub const FINISH_STOP: &str = "stop";

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single message in the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// The role of the message author
    pub role: Role,
    /// The content of the message
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Request body for `POST /v1/chat/completions`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    /// Model ID echoed back in the response
    #[serde(default = "default_model")]
    pub model: String,

    /// Conversation so far; only the last user message is answered
    pub messages: Vec<ChatMessage>,

    /// Sampling temperature (accepted, not forwarded)
    #[serde(default)]
    pub temperature: Option<f32>,

    /// Maximum tokens to generate (accepted, not forwarded)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Stream the answer as server-sent events
    #[serde(default)]
    pub stream: Option<bool>,

    /// End-user identifier (accepted, not forwarded)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

fn default_model() -> String {
    DEFAULT_MODEL_ID.to_string()
}

impl ChatCompletionRequest {
    /// Content of the last message authored by the user, if any
    pub fn last_user_message(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }

    /// Whether the caller asked for a streamed response
    pub fn is_streaming(&self) -> bool {
        self.stream.unwrap_or(false)
    }
}

/// Token usage estimate
///
/// The backend has no tokenizer of its own, so counts are whitespace-delimited
/// words of the question and the answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub total_tokens: usize,
}

impl Usage {
    pub fn estimate(prompt: &str, completion: &str) -> Self {
        let prompt_tokens = prompt.split_whitespace().count();
        let completion_tokens = completion.split_whitespace().count();
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// A single choice in a completion response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatChoice {
    pub index: u32,
    pub message: ChatMessage,
    pub finish_reason: String,
}

/// Response body for a non-streaming completion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionResponse {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub model: String,
    pub choices: Vec<ChatChoice>,
    pub usage: Usage,
}

impl ChatCompletionResponse {
    /// Wrap an answer to `question` into a single-choice completion
    pub fn answer(
        id: impl Into<String>,
        created: i64,
        model: impl Into<String>,
        question: &str,
        answer: String,
    ) -> Self {
        let usage = Usage::estimate(question, &answer);
        Self {
            id: id.into(),
            object: COMPLETION_OBJECT.to_string(),
            created,
            model: model.into(),
            choices: vec![ChatChoice {
                index: 0,
                message: ChatMessage::assistant(answer),
                finish_reason: FINISH_STOP.to_string(),
            }],
            usage,
        }
    }
}

/// Incremental message content in a streamed chunk
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Delta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// A single choice in a streamed chunk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkChoice {
    pub index: u32,
    pub delta: Delta,
    /// Always serialized; `null` on every chunk but the last
    pub finish_reason: Option<String>,
}

/// One server-sent event payload of a streamed completion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionChunk {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub model: String,
    pub choices: Vec<ChunkChoice>,
}

impl ChatCompletionChunk {
    fn with_choice(id: &str, created: i64, model: &str, choice: ChunkChoice) -> Self {
        Self {
            id: id.to_string(),
            object: CHUNK_OBJECT.to_string(),
            created,
            model: model.to_string(),
            choices: vec![choice],
        }
    }

    /// Chunk carrying a piece of the answer
    pub fn content(id: &str, created: i64, model: &str, content: impl Into<String>) -> Self {
        Self::with_choice(
            id,
            created,
            model,
            ChunkChoice {
                index: 0,
                delta: Delta {
                    content: Some(content.into()),
                },
                finish_reason: None,
            },
        )
    }

    /// Terminal chunk: empty delta, `finish_reason: "stop"`
    pub fn finish(id: &str, created: i64, model: &str) -> Self {
        Self::with_choice(
            id,
            created,
            model,
            ChunkChoice {
                index: 0,
                delta: Delta::default(),
                finish_reason: Some(FINISH_STOP.to_string()),
            },
        )
    }
}

/// Generate a completion id of the form `chatcmpl-<12 hex digits>`
pub fn completion_id() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("chatcmpl-{}", &hex[..12])
}

/// Current Unix time in seconds
pub fn unix_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_role_serde() {
        assert_eq!(serde_json::to_string(&Role::Assistant).unwrap(), "\"assistant\"");
        let role: Role = serde_json::from_str("\"system\"").unwrap();
        assert_eq!(role, Role::System);
        assert!(serde_json::from_str::<Role>("\"tool\"").is_err());
    }

    #[test]
    fn test_request_defaults() {
        let request: ChatCompletionRequest = serde_json::from_value(json!({
            "messages": [{"role": "user", "content": "halo"}]
        }))
        .unwrap();
        assert_eq!(request.model, DEFAULT_MODEL_ID);
        assert!(!request.is_streaming());
        assert!(request.temperature.is_none());
    }

    #[test]
    fn test_last_user_message() {
        let request = ChatCompletionRequest {
            model: DEFAULT_MODEL_ID.to_string(),
            messages: vec![
                ChatMessage::new(Role::System, "be brief"),
                ChatMessage::user("first"),
                ChatMessage::assistant("answer"),
                ChatMessage::user("second"),
                ChatMessage::assistant("another"),
            ],
            temperature: None,
            max_tokens: None,
            stream: Some(true),
            user: None,
        };
        assert_eq!(request.last_user_message(), Some("second"));
        assert!(request.is_streaming());
    }

    #[test]
    fn test_last_user_message_missing() {
        let request: ChatCompletionRequest = serde_json::from_value(json!({
            "messages": [{"role": "system", "content": "only system"}]
        }))
        .unwrap();
        assert_eq!(request.last_user_message(), None);
    }

    #[test]
    fn test_usage_estimate() {
        let usage = Usage::estimate("Berapa total invoice bulan ini?", "Total  invoice\nadalah 42");
        assert_eq!(usage.prompt_tokens, 5);
        assert_eq!(usage.completion_tokens, 4);
        assert_eq!(usage.total_tokens, 9);
    }

    #[test]
    fn test_completion_response_shape() {
        let response =
            ChatCompletionResponse::answer("chatcmpl-abc", 10, "crm-sql-engine", "q", "a b".into());
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["object"], "chat.completion");
        assert_eq!(value["choices"][0]["message"]["role"], "assistant");
        assert_eq!(value["choices"][0]["finish_reason"], "stop");
        assert_eq!(value["usage"]["total_tokens"], 3);
    }

    #[test]
    fn test_chunk_shapes() {
        let content = serde_json::to_value(ChatCompletionChunk::content("id", 1, "m", "hi")).unwrap();
        assert_eq!(content["object"], "chat.completion.chunk");
        assert_eq!(content["choices"][0]["delta"], json!({"content": "hi"}));
        assert!(content["choices"][0]["finish_reason"].is_null());
        assert!(content["choices"][0].as_object().unwrap().contains_key("finish_reason"));

        let finish = serde_json::to_value(ChatCompletionChunk::finish("id", 1, "m")).unwrap();
        assert_eq!(finish["choices"][0]["delta"], json!({}));
        assert_eq!(finish["choices"][0]["finish_reason"], "stop");
    }

    #[test]
    fn test_completion_id_format() {
        let id = completion_id();
        assert!(id.starts_with("chatcmpl-"));
        assert_eq!(id.len(), "chatcmpl-".len() + 12);
        assert!(id["chatcmpl-".len()..].chars().all(|c| c.is_ascii_hexdigit()));
    }
}
