//! Shared application state for hosts (HTTP server, CLI).

use std::sync::Arc;

use crate::db::Database;
use crate::design::DesignConfig;
use crate::llm::ChatModel;
use crate::store::{ConversationStore, StepStore, SurveyStore, UserStore};

/// Shared state accessible by all API handlers.
pub struct AppStateInner {
    pub db: Database,
    pub design: DesignConfig,
    pub user_store: UserStore,
    pub step_store: StepStore,
    pub conversation_store: ConversationStore,
    pub survey_store: SurveyStore,
    pub model: Arc<dyn ChatModel>,
}

pub type AppState = Arc<AppStateInner>;

impl AppStateInner {
    pub fn new(db: Database, design: DesignConfig, model: Arc<dyn ChatModel>) -> Self {
        Self {
            user_store: UserStore::new(db.clone()),
            step_store: StepStore::new(db.clone()),
            conversation_store: ConversationStore::new(db.clone()),
            survey_store: SurveyStore::new(db.clone()),
            db,
            design,
            model,
        }
    }
}
