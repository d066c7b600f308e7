//! Agent pipeline: a named, ordered list of prompt-templated model
//! calls that turns (code snippet, user input, history) into one or more
//! new messages.
//!
//! Stages run strictly in sequence because each later stage's prompt can
//! reference earlier stages' textual output through named slots. A stage
//! failure aborts the whole invocation; there is no partial-pipeline
//! fallback.

pub mod prompts;
pub mod template;

use std::collections::HashMap;
use std::time::Instant;

use crate::error::StudyError;
use crate::llm::{ChatModel, ChatRequest, ChatRole};
use crate::models::{Message, MessageDraft, MessageRole, Snippet};

pub use prompts::{by_name, control, tom};
pub use template::PromptTemplate;

/// One model call in an agent pipeline. The stage's output is stored in
/// the context under `key` for later stages, and its visibility decides
/// whether the resulting message is shown to the participant.
#[derive(Debug, Clone)]
pub struct AgentStage {
    pub key: &'static str,
    /// `Ai` for assistant-visible output, `Internal` for pipeline
    /// artifacts hidden from non-admin viewers.
    pub role: MessageRole,
    pub template: PromptTemplate,
}

/// A named pipeline variant. Stateless across invocations except for the
/// conversation history it is given explicitly.
#[derive(Debug, Clone)]
pub struct Agent {
    pub name: &'static str,
    pub stages: Vec<AgentStage>,
}

/// Input to one pipeline invocation.
pub struct AgentContext<'a> {
    pub snippet: &'a Snippet,
    pub input: &'a str,
    pub history: &'a [Message],
}

impl Agent {
    /// Run all stages in order, returning one draft per stage.
    pub async fn invoke(
        &self,
        model: &dyn ChatModel,
        ctx: &AgentContext<'_>,
    ) -> Result<Vec<MessageDraft>, StudyError> {
        let mut vars = HashMap::from([
            ("code".to_string(), ctx.snippet.code.clone()),
            ("language".to_string(), ctx.snippet.language.clone()),
            ("input".to_string(), ctx.input.to_string()),
        ]);

        // Two-role transcript: internal artifacts never reach the model.
        let history: Vec<(ChatRole, String)> = ctx
            .history
            .iter()
            .filter_map(|message| match message.role {
                MessageRole::User => Some((ChatRole::User, message.content.clone())),
                MessageRole::Ai => Some((ChatRole::Assistant, message.content.clone())),
                MessageRole::Internal => None,
            })
            .collect();

        let mut drafts = Vec::with_capacity(self.stages.len());

        for stage in &self.stages {
            let mut messages = history.clone();
            messages.push((ChatRole::User, ctx.input.to_string()));
            for instruction in stage.template.instructions {
                messages.push((ChatRole::User, template::render(instruction, &vars)));
            }
            let request = ChatRequest {
                system: template::render(stage.template.system, &vars),
                messages,
            };

            let start = Instant::now();
            let response = model.complete(&request).await.map_err(|e| match e {
                StudyError::AgentFailed(_) => e,
                other => StudyError::AgentFailed(other.to_string()),
            })?;
            let time_ms = start.elapsed().as_millis() as i64;

            tracing::debug!(
                agent = self.name,
                stage = stage.key,
                time_ms,
                "pipeline stage completed"
            );

            vars.insert(stage.key.to_string(), response.content.clone());
            drafts.push(MessageDraft {
                role: stage.role,
                content: response.content,
                token_count_input: response.usage.and_then(|u| u.input_tokens),
                token_count_output: response.usage.and_then(|u| u.output_tokens),
                time_ms: Some(time_ms),
            });
        }

        Ok(drafts)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::llm::{ChatResponse, Usage};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Scripted stand-in for the model boundary: returns the queued
    /// responses in order and records every request it sees.
    pub(crate) struct StubModel {
        responses: Mutex<Vec<Result<ChatResponse, StudyError>>>,
        pub requests: Mutex<Vec<ChatRequest>>,
    }

    impl StubModel {
        pub(crate) fn new(responses: Vec<Result<ChatResponse, StudyError>>) -> Self {
            Self {
                responses: Mutex::new(responses),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn reply(content: &str, input_tokens: i64, output_tokens: i64) -> ChatResponse {
            ChatResponse {
                content: content.to_string(),
                usage: Some(Usage {
                    input_tokens: Some(input_tokens),
                    output_tokens: Some(output_tokens),
                }),
            }
        }
    }

    #[async_trait]
    impl ChatModel for StubModel {
        async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, StudyError> {
            self.requests.lock().unwrap().push(request.clone());
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                return Err(StudyError::AgentFailed("no scripted response".to_string()));
            }
            responses.remove(0)
        }
    }

    pub(crate) fn snippet() -> Snippet {
        Snippet {
            code: "def f(n):\n    return n + 1\n".to_string(),
            language: "python".to_string(),
        }
    }

    fn message(role: MessageRole, content: &str, ord: i64) -> Message {
        Message {
            id: format!("m{}", ord),
            user_id: "u".to_string(),
            task: "loop".to_string(),
            role,
            content: content.to_string(),
            ord,
            token_count_input: None,
            token_count_output: None,
            time_ms: None,
            created_at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn control_produces_one_visible_answer() {
        let model = StubModel::new(vec![Ok(StubModel::reply("It adds one.", 10, 5))]);
        let snippet = snippet();
        let ctx = AgentContext {
            snippet: &snippet,
            input: "What does this do?",
            history: &[],
        };

        let drafts = control().invoke(&model, &ctx).await.unwrap();
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].role, MessageRole::Ai);
        assert_eq!(drafts[0].content, "It adds one.");
        assert_eq!(drafts[0].token_count_input, Some(10));
        assert_eq!(drafts[0].token_count_output, Some(5));
        assert!(drafts[0].time_ms.is_some());

        // The rendered system prompt carries the snippet.
        let requests = model.requests.lock().unwrap();
        assert!(requests[0].system.contains("def f(n):"));
        assert!(requests[0].system.contains("python"));
        assert_eq!(
            requests[0].messages.last().unwrap(),
            &(ChatRole::User, "What does this do?".to_string())
        );
    }

    #[tokio::test]
    async fn tom_threads_stage_outputs_forward() {
        let model = StubModel::new(vec![
            Ok(StubModel::reply("Q1? Q2?", 10, 5)),
            Ok(StubModel::reply("The user is confused.", 20, 8)),
            Ok(StubModel::reply("Here is an answer.", 30, 12)),
        ]);
        let snippet = snippet();
        let ctx = AgentContext {
            snippet: &snippet,
            input: "Why recursion?",
            history: &[],
        };

        let drafts = tom().invoke(&model, &ctx).await.unwrap();
        assert_eq!(drafts.len(), 3);
        assert_eq!(drafts[0].role, MessageRole::Internal);
        assert_eq!(drafts[1].role, MessageRole::Internal);
        assert_eq!(drafts[2].role, MessageRole::Ai);

        let requests = model.requests.lock().unwrap();
        // Stage 2 sees stage 1's questions; stage 3 sees the mental state.
        assert!(requests[1]
            .messages
            .iter()
            .any(|(_, content)| content.contains("Q1? Q2?")));
        assert!(requests[2]
            .messages
            .iter()
            .any(|(_, content)| content.contains("The user is confused.")));
    }

    #[tokio::test]
    async fn internal_history_is_hidden_from_the_model() {
        let model = StubModel::new(vec![Ok(StubModel::reply("ok", 1, 1))]);
        let history = vec![
            message(MessageRole::User, "first question", 1),
            message(MessageRole::Internal, "hidden artifact", 2),
            message(MessageRole::Ai, "first answer", 3),
        ];
        let snippet = snippet();
        let ctx = AgentContext {
            snippet: &snippet,
            input: "follow-up",
            history: &history,
        };

        control().invoke(&model, &ctx).await.unwrap();

        let requests = model.requests.lock().unwrap();
        let roles: Vec<ChatRole> = requests[0].messages.iter().map(|(r, _)| *r).collect();
        assert_eq!(roles, vec![ChatRole::User, ChatRole::Assistant, ChatRole::User]);
        assert!(requests[0]
            .messages
            .iter()
            .all(|(_, content)| content != "hidden artifact"));
    }

    #[tokio::test]
    async fn stage_failure_aborts_the_invocation() {
        let model = StubModel::new(vec![
            Ok(StubModel::reply("Q1?", 1, 1)),
            Err(StudyError::AgentFailed("model unavailable".to_string())),
        ]);
        let snippet = snippet();
        let ctx = AgentContext {
            snippet: &snippet,
            input: "hello",
            history: &[],
        };

        let result = tom().invoke(&model, &ctx).await;
        assert!(matches!(result, Err(StudyError::AgentFailed(_))));
    }
}
