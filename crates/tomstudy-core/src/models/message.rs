use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role tag of a conversation message.
///
/// `Internal` messages are pipeline-intermediate artifacts (never shown
/// to non-admin viewers); `Ai` and `User` are the visible conversational
/// turns used as history context.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Ai,
    Internal,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Ai => "ai",
            Self::Internal => "internal",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Self::User),
            "ai" => Some(Self::Ai),
            "internal" => Some(Self::Internal),
            _ => None,
        }
    }
}

/// A persisted conversation message for one (user, task) pair.
///
/// `ord` is strictly increasing per (user, task) and assigned by the
/// conversation store at insert time; ordering by it reconstructs the
/// conversation chronology.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub user_id: String,
    pub task: String,
    pub role: MessageRole,
    pub content: String,
    pub ord: i64,
    pub token_count_input: Option<i64>,
    pub token_count_output: Option<i64>,
    pub time_ms: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// An unsaved message, as produced by the agent pipeline or the
/// orchestration layer before the batch is appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDraft {
    pub role: MessageRole,
    pub content: String,
    pub token_count_input: Option<i64>,
    pub token_count_output: Option<i64>,
    pub time_ms: Option<i64>,
}
