//! Wire formats for API responses.
//!
//! Internal messages and token accounting are only exposed to admins;
//! participants see the plain conversational turns.

use serde::Serialize;

use tomstudy_core::models::{Message, MessageRole, SurveyProject, User, UserStep};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub username: String,
    pub is_admin: bool,
}

pub fn user_response(user: &User) -> UserResponse {
    UserResponse {
        username: user.username.clone(),
        is_admin: user.is_admin,
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStepResponse {
    pub start_time: String,
}

pub fn user_step_response(record: &UserStep) -> UserStepResponse {
    UserStepResponse {
        start_time: record.start_time.to_rfc3339(),
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyResponse {
    pub url: String,
}

/// Personalize a survey link with the participant's username, so the
/// external survey rows can be joined back to study data.
pub fn survey_response(project: &SurveyProject, username: &str) -> SurveyResponse {
    let separator = if project.url.contains('?') { '&' } else { '?' };
    SurveyResponse {
        url: format!(
            "{}{}user={}",
            project.url,
            separator,
            urlencoding::encode(username)
        ),
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenCounts {
    pub input: Option<i64>,
    pub output: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub content: String,
    #[serde(rename = "type")]
    pub role: MessageRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens: Option<TokenCounts>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_ms: Option<i64>,
}

pub fn message_response(
    message: &Message,
    include_tokens: bool,
    include_internal: bool,
) -> Option<MessageResponse> {
    if message.role == MessageRole::Internal && !include_internal {
        return None;
    }

    Some(MessageResponse {
        content: message.content.clone(),
        role: message.role,
        tokens: include_tokens.then_some(TokenCounts {
            input: message.token_count_input,
            output: message.token_count_output,
        }),
        time_ms: message.time_ms,
    })
}

pub fn messages_response(
    messages: &[Message],
    include_tokens: bool,
    include_internal: bool,
) -> Vec<MessageResponse> {
    messages
        .iter()
        .filter_map(|message| message_response(message, include_tokens, include_internal))
        .collect()
}
