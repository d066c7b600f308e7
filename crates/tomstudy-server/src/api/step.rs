//! Step routes: progress overview and the per-step pages.
//!
//! Every handler runs behind the current-step rule: a participant may
//! only act on the step the progress tracker says is current; admins may
//! act on any step. Task routes additionally validate the (stage, index)
//! alias before touching any state.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use tomstudy_core::models::{Snippet, Stage, Step, TaskAlias, User};
use tomstudy_core::steps::{step_key, task_name};
use tomstudy_core::{agent, orchestration, StudyError};

use crate::auth::CurrentUser;
use crate::format::{
    messages_response, survey_response, user_step_response, MessageResponse, SurveyResponse,
    UserStepResponse,
};
use crate::state::ApiState;

/// Conversation turns included as context per agent invocation.
const HISTORY_TURN_LIMIT: usize = 10;

/// Longest accepted participant message.
const MAX_CONTENT_LENGTH: usize = 1000;

pub fn router() -> Router<ApiState> {
    Router::new()
        .route("/", get(overview))
        .route("/next", get(next))
        .route("/start", get(start))
        .route("/welcome", get(welcome))
        .route("/finished", get(finished))
        .route(
            "/stage/{stage}/task/{index}/interaction",
            get(get_interaction).post(post_interaction),
        )
        .route("/stage/{stage}/task/{index}/quiz", get(get_quiz))
        .route("/stage/{stage}/evaluation", get(get_evaluation))
}

/// Enforce the current-step access rule (admins bypass it).
async fn ensure_current_step(
    state: &ApiState,
    user: &User,
    step: Step,
) -> Result<(), StudyError> {
    if user.is_admin {
        return Ok(());
    }
    let overview = state
        .core
        .step_store
        .overview(&state.core.design, &user.id)
        .await?;
    if overview.current == step {
        Ok(())
    } else {
        Err(StudyError::StepNotCurrent)
    }
}

async fn details(
    state: &ApiState,
    user: &User,
    step: Step,
) -> Result<Option<UserStepResponse>, StudyError> {
    Ok(state
        .core
        .step_store
        .get(&state.core.design, &user.id, step)
        .await?
        .map(|record| user_step_response(&record)))
}

async fn survey(
    state: &ApiState,
    user: &User,
    key: &str,
) -> Result<Option<SurveyResponse>, StudyError> {
    Ok(state
        .core
        .survey_store
        .get(key)
        .await?
        .map(|project| survey_response(&project, &user.username)))
}

// ── Overview and progression ──────────────────────────────────────────────

async fn overview(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<tomstudy_core::models::Overview>, StudyError> {
    let overview = state
        .core
        .step_store
        .overview(&state.core.design, &user.id)
        .await?;
    Ok(Json(overview))
}

/// Complete the current step and return the updated overview.
async fn next(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<tomstudy_core::models::Overview>, StudyError> {
    let design = &state.core.design;
    let overview = state.core.step_store.overview(design, &user.id).await?;
    state
        .core
        .step_store
        .complete(design, &user.id, overview.current)
        .await?;

    let updated = state.core.step_store.overview(design, &user.id).await?;
    Ok(Json(updated))
}

/// Start the current step if it hasn't been started yet.
async fn start(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<UserStepResponse>, StudyError> {
    let design = &state.core.design;
    let overview = state.core.step_store.overview(design, &user.id).await?;
    let record = state
        .core
        .step_store
        .start_if_not_started(design, &user.id, overview.current)
        .await?;
    Ok(Json(user_step_response(&record)))
}

// ── Welcome and finished ──────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WelcomeResponse {
    survey: Option<SurveyResponse>,
    snippet: Snippet,
    details: Option<UserStepResponse>,
}

async fn welcome(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<WelcomeResponse>, StudyError> {
    let step = Step::Welcome;
    ensure_current_step(&state, &user, step).await?;

    let snippet = state.core.design.snippet(&state.core.design.example)?;
    Ok(Json(WelcomeResponse {
        survey: survey(&state, &user, "example").await?,
        snippet,
        details: details(&state, &user, step).await?,
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FinishedResponse {
    details: Option<UserStepResponse>,
}

async fn finished(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<FinishedResponse>, StudyError> {
    let step = Step::Finished;
    ensure_current_step(&state, &user, step).await?;

    Ok(Json(FinishedResponse {
        details: details(&state, &user, step).await?,
    }))
}

// ── Interaction ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InteractionResponse {
    snippet: Snippet,
    messages: Vec<MessageResponse>,
    details: Option<UserStepResponse>,
}

async fn get_interaction(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    Path((stage, index)): Path<(Stage, usize)>,
) -> Result<Json<InteractionResponse>, StudyError> {
    let design = &state.core.design;
    let alias = TaskAlias { stage, index };
    let task = task_name(design, alias)?.to_string();
    let step = Step::Interaction { task: alias };
    ensure_current_step(&state, &user, step).await?;

    let snippet = design.snippet(&task)?;
    let messages = state.core.conversation_store.messages(&user.id, &task).await?;

    Ok(Json(InteractionResponse {
        snippet,
        messages: messages_response(&messages, user.is_admin, user.is_admin),
        details: details(&state, &user, step).await?,
    }))
}

#[derive(Debug, Deserialize)]
struct AddMessageRequest {
    content: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AddMessageResponse {
    messages: Vec<MessageResponse>,
}

async fn post_interaction(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    Path((stage, index)): Path<(Stage, usize)>,
    Json(body): Json<AddMessageRequest>,
) -> Result<Json<AddMessageResponse>, StudyError> {
    if body.content.is_empty() || body.content.chars().count() > MAX_CONTENT_LENGTH {
        return Err(StudyError::BadRequest(format!(
            "content must be 1..={} characters",
            MAX_CONTENT_LENGTH
        )));
    }

    let design = &state.core.design;
    let alias = TaskAlias { stage, index };
    let task = task_name(design, alias)?.to_string();
    let step = Step::Interaction { task: alias };
    ensure_current_step(&state, &user, step).await?;

    let snippet = design.snippet(&task)?;
    let agent_name = design.agent_name(user.group, stage)?;
    let agent = agent::by_name(agent_name)
        .ok_or_else(|| StudyError::Internal(format!("unknown agent '{}'", agent_name)))?;

    orchestration::send_message(
        &state.core.conversation_store,
        state.core.model.as_ref(),
        &agent,
        &user.id,
        &task,
        &snippet,
        &body.content,
        HISTORY_TURN_LIMIT,
    )
    .await?;

    let messages = state.core.conversation_store.messages(&user.id, &task).await?;
    Ok(Json(AddMessageResponse {
        messages: messages_response(&messages, user.is_admin, user.is_admin),
    }))
}

// ── Quiz ──────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QuizResponse {
    snippet: Snippet,
    survey: Option<SurveyResponse>,
    details: Option<UserStepResponse>,
}

async fn get_quiz(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    Path((stage, index)): Path<(Stage, usize)>,
) -> Result<Json<QuizResponse>, StudyError> {
    let design = &state.core.design;
    let alias = TaskAlias { stage, index };
    let task = task_name(design, alias)?.to_string();
    let step = Step::Quiz { task: alias };
    ensure_current_step(&state, &user, step).await?;

    let snippet = design.snippet(&task)?;
    let key = step_key(design, step)?;

    Ok(Json(QuizResponse {
        snippet,
        survey: survey(&state, &user, &key).await?,
        details: details(&state, &user, step).await?,
    }))
}

// ── Evaluation ────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EvaluationResponse {
    survey: Option<SurveyResponse>,
    /// One conversation per task of the evaluated stage, in task order.
    interactions: Vec<Vec<MessageResponse>>,
    details: Option<UserStepResponse>,
}

async fn get_evaluation(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    Path(stage): Path<Stage>,
) -> Result<Json<EvaluationResponse>, StudyError> {
    let design = &state.core.design;
    let step = Step::Evaluation { stage };
    ensure_current_step(&state, &user, step).await?;

    let key = step_key(design, step)?;

    let tasks = design
        .stages
        .get(&stage)
        .map(|config| config.tasks.clone())
        .unwrap_or_default();
    let mut interactions = Vec::with_capacity(tasks.len());
    for task in &tasks {
        let messages = state.core.conversation_store.messages(&user.id, task).await?;
        interactions.push(messages_response(&messages, user.is_admin, user.is_admin));
    }

    Ok(Json(EvaluationResponse {
        survey: survey(&state, &user, &key).await?,
        interactions,
        details: details(&state, &user, step).await?,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tomstudy_core::design::{DesignConfig, GroupConfig, StageConfig};
    use tomstudy_core::llm::{ChatModel, ChatRequest, ChatResponse};
    use tomstudy_core::models::Group;
    use tomstudy_core::{AppStateInner, Database};

    struct FixedModel;

    #[async_trait]
    impl ChatModel for FixedModel {
        async fn complete(&self, _request: &ChatRequest) -> Result<ChatResponse, StudyError> {
            Ok(ChatResponse {
                content: "ok".to_string(),
                usage: None,
            })
        }
    }

    fn test_design() -> DesignConfig {
        let agents = |a: &str, b: &str| GroupConfig {
            agents: HashMap::from([
                (Stage::A, a.to_string()),
                (Stage::B, b.to_string()),
            ]),
        };
        DesignConfig {
            groups: HashMap::from([
                (Group::ControlFirst, agents("control", "tom")),
                (Group::TomFirst, agents("tom", "control")),
            ]),
            stages: HashMap::from([
                (
                    Stage::A,
                    StageConfig {
                        tasks: vec!["loop".to_string(), "recursion".to_string()],
                    },
                ),
                (
                    Stage::B,
                    StageConfig {
                        tasks: vec!["sort".to_string()],
                    },
                ),
            ]),
            example: "loop".to_string(),
            folder: std::path::PathBuf::from("."),
        }
    }

    async fn test_state() -> ApiState {
        let db = Database::open_in_memory().unwrap();
        ApiState {
            core: Arc::new(AppStateInner::new(db, test_design(), Arc::new(FixedModel))),
            jwt_secret: Arc::from("test-secret"),
        }
    }

    async fn seeded_user(state: &ApiState, is_admin: bool) -> User {
        let user = User::new(
            if is_admin { "admin" } else { "p01" }.to_string(),
            "pw".to_string(),
            Group::ControlFirst,
            is_admin,
        );
        state.core.user_store.save(&user).await.unwrap();
        user
    }

    #[tokio::test]
    async fn off_step_access_is_rejected_for_participants() {
        let state = test_state().await;
        let user = seeded_user(&state, false).await;

        // Fresh user: current step is welcome, so quiz A1 is off limits.
        let quiz = Step::Quiz {
            task: TaskAlias {
                stage: Stage::A,
                index: 1,
            },
        };
        assert!(matches!(
            ensure_current_step(&state, &user, quiz).await,
            Err(StudyError::StepNotCurrent)
        ));
        assert!(ensure_current_step(&state, &user, Step::Welcome)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn admins_bypass_the_current_step_rule() {
        let state = test_state().await;
        let admin = seeded_user(&state, true).await;

        let quiz = Step::Quiz {
            task: TaskAlias {
                stage: Stage::A,
                index: 1,
            },
        };
        assert!(ensure_current_step(&state, &admin, quiz).await.is_ok());
    }
}
