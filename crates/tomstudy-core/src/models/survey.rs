use serde::{Deserialize, Serialize};

/// An external survey linked from a step, keyed by step key (or by the
/// literal key "example" for the welcome survey).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyProject {
    pub key: String,
    pub url: String,
}
