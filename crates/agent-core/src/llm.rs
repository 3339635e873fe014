//! Model client abstraction for the agent loop.
//!
//! The loop speaks to the vision model through [`ModelClient`] so multiple
//! vendors can plug in behind one seam. Messages are multimodal: a user turn
//! carries the page URL as text plus the screenshot as an image part.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::errors::AgentError;

/// Chat role of a message.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One part of a multimodal message body.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { url: String },
}

/// A single conversation turn.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: Vec<ContentPart>,
}

impl ChatMessage {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: vec![ContentPart::Text { text: text.into() }],
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: vec![ContentPart::Text { text: text.into() }],
        }
    }

    /// A user turn carrying text plus a screenshot data URI.
    pub fn user_with_image(text: impl Into<String>, image_url: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: vec![
                ContentPart::Text { text: text.into() },
                ContentPart::ImageUrl {
                    url: image_url.into(),
                },
            ],
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: vec![ContentPart::Text { text: text.into() }],
        }
    }

    /// Concatenated text parts, skipping images.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|part| match part {
                ContentPart::Text { text } => Some(text.as_str()),
                ContentPart::ImageUrl { .. } => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Whether any part of this message is an image.
    pub fn has_image(&self) -> bool {
        self.content
            .iter()
            .any(|part| matches!(part, ContentPart::ImageUrl { .. }))
    }
}

/// Abstraction over the vision model so multiple vendors can plug into the
/// agent core.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Free-text completion over a full conversation.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, AgentError>;

    /// Single-prompt completion constrained to a JSON object reply.
    async fn complete_structured(&self, prompt: &str) -> Result<Value, AgentError>;
}

/// Deterministic client used for tests and offline development.
///
/// Replies are scripted: `complete` pops the next queued text, and
/// `complete_structured` pops the next queued value (or an empty object once
/// the queue is drained).
#[derive(Debug, Default)]
pub struct MockModelClient {
    replies: Mutex<VecDeque<String>>,
    structured: Mutex<VecDeque<Value>>,
}

impl MockModelClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_reply(&self, reply: impl Into<String>) {
        self.replies.lock().unwrap().push_back(reply.into());
    }

    pub fn push_structured(&self, value: Value) {
        self.structured.lock().unwrap().push_back(value);
    }
}

#[async_trait]
impl ModelClient for MockModelClient {
    async fn complete(&self, _messages: &[ChatMessage]) -> Result<String, AgentError> {
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| AgentError::model("mock client has no scripted reply left"))
    }

    async fn complete_structured(&self, _prompt: &str) -> Result<Value, AgentError> {
        Ok(self
            .structured
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| json!({})))
    }
}
