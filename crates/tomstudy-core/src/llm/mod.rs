//! Boundary to the external language-model capability.
//!
//! The core only assumes: given a rendered prompt (system instructions,
//! message history, user turns), the model returns generated text plus
//! optional token usage. `ChatModel` is the seam the agent pipeline is
//! tested through, with a stub implementation per test.

pub mod openai;

use async_trait::async_trait;

use crate::error::StudyError;

pub use openai::{ModelConfig, OpenAiChatModel};

/// Role of one message in a chat completion request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// A rendered prompt for one model call.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub system: String,
    /// Conversation turns in chronological order, followed by the
    /// current user input and any extra instruction turns.
    pub messages: Vec<(ChatRole, String)>,
}

/// Token usage reported by the model, when available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Usage {
    pub input_tokens: Option<i64>,
    pub output_tokens: Option<i64>,
}

/// Generated text plus optional usage accounting.
#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub content: String,
    pub usage: Option<Usage>,
}

/// The external chat-completion capability. No partial results: a call
/// either yields a full response or fails.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, StudyError>;
}
