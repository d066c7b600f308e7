//! The two agent variants used in the study.
//!
//! `control` answers directly. `tom` ("theory of mind") first infers the
//! participant's mental state in two hidden stages, then answers
//! conditioned on that inference without revealing it.

use crate::agent::{Agent, AgentStage, PromptTemplate};
use crate::models::MessageRole;

const BASE_SYSTEM: &str = r#"You are a helpful assistant. The user is given a code snippet which they have to understand. Note that the user did not write the code or provide the code snippet themselves.

Code: """{language}
{code}
""""#;

const ANSWER_SYSTEM: &str = r#"You are a helpful assistant. The user is given a code snippet which they have to understand. Note that the user did not write the code or provide the code snippet themselves.

Code: """{language}
{code}
"""

Produce an appropriate response to the user's input."#;

const QUESTIONS_INSTRUCTION: &str = "Identify what aspects of the user's mental state are directly relevant to producing a response to the user's input. Phrase these aspects as open-ended questions. The questions should be different enough from each other to each provide valuable insights. Make sure the questions are about the user's mental state and are not leading.";

const MENTAL_STATE_INSTRUCTION: &str = r#"Take the perspective of the user. Answer the following questions about the user's mental state, and explain how this mental state has led to the user's messages. Note that the user did not write the code or provide the code snippet themselves. Therefore, you cannot base your answers on the code snippet or on any code the user copies and pastes, only on the conversation history. Phrase the answers as independent statements, not as responses to the questions.

Questions: """
{questions}
"""."#;

const TOM_ANSWER_INSTRUCTION: &str = r#"You have identified the mental state of the user. Use this mental state to produce an appropriate response. Do not mention how the response is based on the user's mental state.

Mental state: """
{mental_state}
""""#;

/// Single stage: a direct assistant-visible answer.
pub fn control() -> Agent {
    Agent {
        name: "control",
        stages: vec![AgentStage {
            key: "answer",
            role: MessageRole::Ai,
            template: PromptTemplate {
                system: ANSWER_SYSTEM,
                instructions: &[],
            },
        }],
    }
}

/// Three stages: open-ended questions about the participant's mental
/// state, an inferred mental-state description (from the conversation
/// only, never the snippet), and the final conditioned answer.
pub fn tom() -> Agent {
    Agent {
        name: "tom",
        stages: vec![
            AgentStage {
                key: "questions",
                role: MessageRole::Internal,
                template: PromptTemplate {
                    system: BASE_SYSTEM,
                    instructions: &[QUESTIONS_INSTRUCTION],
                },
            },
            AgentStage {
                key: "mental_state",
                role: MessageRole::Internal,
                template: PromptTemplate {
                    system: BASE_SYSTEM,
                    instructions: &[MENTAL_STATE_INSTRUCTION],
                },
            },
            AgentStage {
                key: "answer",
                role: MessageRole::Ai,
                template: PromptTemplate {
                    system: ANSWER_SYSTEM,
                    instructions: &[TOM_ANSWER_INSTRUCTION],
                },
            },
        ],
    }
}

/// Look up an agent variant by its configured name.
pub fn by_name(name: &str) -> Option<Agent> {
    match name {
        "control" => Some(control()),
        "tom" => Some(tom()),
        _ => None,
    }
}
