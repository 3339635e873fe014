//! OpenAI-compatible chat-completions client.
//!
//! Works against any endpoint speaking the chat-completions wire format
//! (OpenAI, OpenRouter, a local vLLM serving UI-TARS). User turns carry the
//! screenshot as an `image_url` content part; structured side calls pin the
//! response format to a JSON object and extract the first object from the
//! reply as a fallback for endpoints that ignore the pin.

use std::time::Duration;

use agent_core::{AgentError, ChatMessage, ContentPart, ModelClient, Role};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub model: String,
    pub api_base: String,
    pub temperature: f32,
    pub timeout: Duration,
}

impl OpenAiConfig {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, api_base: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            api_base: api_base.into(),
            temperature: 0.2,
            timeout: Duration::from_secs(120),
        }
    }
}

pub struct OpenAiClient {
    client: Client,
    config: OpenAiConfig,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig) -> Result<Self, AgentError> {
        if config.api_key.is_empty() {
            return Err(AgentError::model("missing API key for the model endpoint"));
        }
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| AgentError::model(format!("failed to build HTTP client: {err}")))?;
        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.api_base.trim_end_matches('/')
        )
    }

    async fn invoke(&self, body: &ChatCompletionRequest) -> Result<String, AgentError> {
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(body)
            .send()
            .await
            .map_err(|err| AgentError::model(format!("model request failed: {err}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "<response unavailable>".to_string());
            return Err(AgentError::model(format!(
                "model endpoint returned {status}: {text}"
            )));
        }

        let response: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|err| AgentError::model(format!("model response invalid: {err}")))?;

        if let Some(usage) = &response.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "model call finished"
            );
        }

        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.as_text())
            .ok_or_else(|| AgentError::model("model response missing content"))
    }
}

#[async_trait]
impl ModelClient for OpenAiClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, AgentError> {
        let body = ChatCompletionRequest {
            model: self.config.model.clone(),
            temperature: self.config.temperature,
            response_format: None,
            messages: messages.iter().map(WireMessage::from).collect(),
        };
        self.invoke(&body).await
    }

    async fn complete_structured(&self, prompt: &str) -> Result<Value, AgentError> {
        let body = ChatCompletionRequest {
            model: self.config.model.clone(),
            temperature: self.config.temperature,
            response_format: Some(ResponseFormat {
                r#type: "json_object".to_string(),
            }),
            messages: vec![WireMessage::from(&ChatMessage::user(prompt))],
        };
        let content = self.invoke(&body).await?;
        let json = extract_json_object(&content)
            .ok_or_else(|| AgentError::invalid_response("model reply carried no JSON object"))?;
        serde_json::from_str(&json)
            .map_err(|err| AgentError::invalid_response(format!("model JSON did not parse: {err}")))
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
    messages: Vec<WireMessage>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    r#type: String,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    content: Vec<WirePart>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
enum WirePart {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: WireImageUrl },
}

#[derive(Debug, Serialize)]
struct WireImageUrl {
    url: String,
}

impl From<&ChatMessage> for WireMessage {
    fn from(message: &ChatMessage) -> Self {
        let role = match message.role {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        };
        let content = message
            .content
            .iter()
            .map(|part| match part {
                ContentPart::Text { text } => WirePart::Text { text: text.clone() },
                ContentPart::ImageUrl { url } => WirePart::ImageUrl {
                    image_url: WireImageUrl { url: url.clone() },
                },
            })
            .collect();
        Self { role, content }
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatCompletionChoice>,
    #[serde(default)]
    usage: Option<ChatCompletionUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChoice {
    message: ChatCompletionMessage,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionMessage {
    content: ChatCompletionContent,
}

/// Endpoints disagree on whether assistant content comes back as a bare
/// string or a part list; accept both.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ChatCompletionContent {
    Text(String),
    Parts(Vec<ChatCompletionPart>),
}

impl ChatCompletionContent {
    fn as_text(&self) -> Option<String> {
        match self {
            ChatCompletionContent::Text(value) => Some(value.clone()),
            ChatCompletionContent::Parts(parts) => {
                let text = parts
                    .iter()
                    .filter_map(|part| part.text.as_deref())
                    .collect::<Vec<_>>()
                    .join("\n");
                if text.is_empty() {
                    None
                } else {
                    Some(text)
                }
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionPart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

/// Slice the first balanced `{...}` object out of a reply, tolerating prose
/// or code fences around it. Brace counting ignores braces inside strings.
fn extract_json_object(text: &str) -> Option<String> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(text[start..start + offset + ch.len_utf8()].to_string());
                }
            }
            _ => {}
        }
    }
    None
}
