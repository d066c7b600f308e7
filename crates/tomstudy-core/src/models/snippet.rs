use serde::{Deserialize, Serialize};

/// The code snippet a task asks the participant to understand.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Snippet {
    pub code: String,
    pub language: String,
}
