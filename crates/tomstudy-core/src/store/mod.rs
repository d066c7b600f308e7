pub mod conversation_store;
pub mod step_store;
pub mod survey_store;
pub mod user_store;

pub use conversation_store::ConversationStore;
pub use step_store::StepStore;
pub use survey_store::SurveyStore;
pub use user_store::UserStore;
