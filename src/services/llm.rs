use async_trait::async_trait;
use futures_util::stream::{self, BoxStream, TryStreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tokio::io::AsyncBufReadExt;
use tokio_util::io::StreamReader;

use crate::{
    config::Config,
    constants::LLM_REQUEST_TIMEOUT_SECS,
    error::{AppError, Result},
};

// ==================== MESSAGES ====================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
    Tool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    /// JSON-encoded arguments exactly as the model produced them.
    #[serde(default)]
    pub arguments: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type", default = "function_kind")]
    pub kind: String,
    pub function: FunctionCall,
}

fn function_kind() -> String {
    "function".to_string()
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: id.into(),
            kind: function_kind(),
            function: FunctionCall {
                name: name.into(),
                arguments: arguments.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    fn text(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::text(ChatRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::text(ChatRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::text(ChatRole::Assistant, content)
    }

    pub fn assistant_tool_calls(content: Option<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content,
            tool_calls,
            tool_call_id: None,
        }
    }

    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Tool,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
        }
    }
}

/// A function the model may call; `parameters` is a JSON schema object.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Value,
}

impl Serialize for ToolDefinition {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serde_json::json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.parameters,
            }
        })
        .serialize(serializer)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LlmResponse {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCall>,
}

/// Chat-completion boundary used by the Guardian.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: Option<&[ToolDefinition]>,
    ) -> Result<LlmResponse>;

    /// Streams content deltas of a tool-free completion.
    async fn stream_complete(
        &self,
        messages: &[ChatMessage],
    ) -> Result<BoxStream<'static, Result<String>>>;
}

// ==================== OPENAI WIRE FORMAT ====================
#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [ToolDefinition]>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<ToolCall>,
}

#[derive(Deserialize)]
struct StreamResponse {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
}

#[derive(Deserialize, Default)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, PartialEq)]
enum StreamLine {
    Content(String),
    Skip,
    Done,
}

fn parse_stream_line(line: &str) -> Result<StreamLine> {
    let line = line.trim();
    let payload = line.strip_prefix("data:").map(str::trim).unwrap_or(line);
    if payload.is_empty() || payload.starts_with(':') {
        return Ok(StreamLine::Skip);
    }
    if payload == "[DONE]" {
        return Ok(StreamLine::Done);
    }
    let chunk: StreamResponse = serde_json::from_str(payload)
        .map_err(|e| AppError::ExternalAPI(format!("Malformed stream chunk: {}", e)))?;
    Ok(chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content)
        .filter(|content| !content.is_empty())
        .map(StreamLine::Content)
        .unwrap_or(StreamLine::Skip))
}

fn stream_io_err(err: reqwest::Error) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::Interrupted, err.to_string())
}

/// OpenAI-compatible chat-completions client. Built once at startup.
pub struct OpenAiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl OpenAiClient {
    pub fn from_config(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(LLM_REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.openai_base_url.trim_end_matches('/').to_string(),
            api_key: config
                .openai_api_key
                .clone()
                .filter(|key| !key.trim().is_empty()),
            model: config.openai_model.clone(),
            max_tokens: config.llm_max_tokens,
            temperature: config.llm_temperature,
        })
    }

    async fn send(&self, request: &CompletionRequest<'_>) -> Result<reqwest::Response> {
        let api_key = self.api_key.as_deref().ok_or(AppError::LlmNotConfigured)?;
        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .http
            .post(url)
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), "LLM completion request failed");
            return Err(AppError::ExternalAPI(format!(
                "LLM returned {}: {}",
                status.as_u16(),
                body.chars().take(300).collect::<String>()
            )));
        }
        Ok(response)
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: Option<&[ToolDefinition]>,
    ) -> Result<LlmResponse> {
        let request = CompletionRequest {
            model: &self.model,
            messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            tools: tools.filter(|tools| !tools.is_empty()),
            stream: false,
        };
        let body: CompletionResponse = self.send(&request).await?.json().await?;
        let message = body
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or_else(|| AppError::ExternalAPI("LLM returned no choices".to_string()))?;

        tracing::debug!(
            tool_calls = message.tool_calls.len(),
            "LLM completion received"
        );
        Ok(LlmResponse {
            content: message.content,
            tool_calls: message.tool_calls,
        })
    }

    async fn stream_complete(
        &self,
        messages: &[ChatMessage],
    ) -> Result<BoxStream<'static, Result<String>>> {
        let request = CompletionRequest {
            model: &self.model,
            messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            tools: None,
            stream: true,
        };
        let response = self.send(&request).await?;
        let body = Box::pin(response.bytes_stream().map_err(stream_io_err));
        let lines = StreamReader::new(body).lines();

        let chunks = stream::unfold(Some(lines), |state| async move {
            let mut lines = state?;
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => match parse_stream_line(&line) {
                        Ok(StreamLine::Content(text)) => return Some((Ok(text), Some(lines))),
                        Ok(StreamLine::Skip) => continue,
                        Ok(StreamLine::Done) => return None,
                        Err(e) => return Some((Err(e), None)),
                    },
                    Ok(None) => return None,
                    Err(e) => {
                        return Some((Err(AppError::ExternalAPI(format!("Stream interrupted: {}", e))), None))
                    }
                }
            }
        });
        Ok(Box::pin(chunks))
    }
}
