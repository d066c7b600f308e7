//! Orchestration: turn one participant message into a persisted batch.
//!
//! Glues the conversation store and the agent pipeline together: load
//! bounded history, invoke the agent, persist the participant's input and
//! the pipeline outputs as one atomic batch. On pipeline failure nothing
//! is persisted and the caller gets a retryable error, so the participant
//! is expected to resend their input.

use crate::agent::{Agent, AgentContext};
use crate::error::StudyError;
use crate::llm::ChatModel;
use crate::models::{MessageDraft, MessageRole, Snippet};
use crate::store::ConversationStore;

/// Process one participant message for a (user, task) conversation.
///
/// The persisted batch is the participant's `user` message followed by
/// one message per pipeline stage, in stage order. The `user` message's
/// token/time fields record the aggregate cost of producing the response
/// (summed across all stages).
#[allow(clippy::too_many_arguments)]
pub async fn send_message(
    conversations: &ConversationStore,
    model: &dyn ChatModel,
    agent: &Agent,
    user_id: &str,
    task: &str,
    snippet: &Snippet,
    input: &str,
    history_turn_limit: usize,
) -> Result<(), StudyError> {
    // A turn is one user message plus one assistant response.
    let history = conversations
        .history(user_id, task, history_turn_limit * 2)
        .await?;

    let responses = agent
        .invoke(
            model,
            &AgentContext {
                snippet,
                input,
                history: &history,
            },
        )
        .await?;

    let mut batch = Vec::with_capacity(responses.len() + 1);
    batch.push(MessageDraft {
        role: MessageRole::User,
        content: input.to_string(),
        token_count_input: Some(
            responses
                .iter()
                .map(|r| r.token_count_input.unwrap_or(0))
                .sum(),
        ),
        token_count_output: Some(
            responses
                .iter()
                .map(|r| r.token_count_output.unwrap_or(0))
                .sum(),
        ),
        time_ms: Some(responses.iter().map(|r| r.time_ms.unwrap_or(0)).sum()),
    });
    batch.extend(responses);

    conversations.append_batch(user_id, task, batch).await
}
