use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A top-level phase of the experiment. Stages are ordered; each stage
/// holds an ordered list of tasks in the design config.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Stage {
    A,
    B,
}

impl Stage {
    /// All stages, in experiment order.
    pub const ALL: [Stage; 2] = [Stage::A, Stage::B];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "A" => Some(Self::A),
            "B" => Some(Self::B),
            _ => None,
        }
    }
}

/// Identifies one task within a stage's ordered task list.
///
/// The task name is resolved from the design config, not stored here, so
/// renumbering tasks in the config changes step keys.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct TaskAlias {
    pub stage: Stage,
    pub index: usize,
}

/// One unit of participant progress.
///
/// A closed sum type: adding a new step kind forces every consumer to
/// handle it. Serializes to the tagged wire shape the client expects,
/// e.g. `{"type":"interaction","task":{"stage":"A","index":0}}`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Step {
    Welcome,
    Interaction { task: TaskAlias },
    Quiz { task: TaskAlias },
    Evaluation { stage: Stage },
    Finished,
}

/// Persisted progress record: one row per (user, step key).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStep {
    pub user_id: String,
    pub key: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub completed: bool,
}

/// A step together with its completion flag, as listed in an overview.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StepState {
    #[serde(flatten)]
    pub step: Step,
    pub completed: bool,
}

/// One stage's slice of the overview. `name` is `None` for the leading
/// welcome block and the trailing finished block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageOverview {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<Stage>,
    pub steps: Vec<StepState>,
}

/// The full progress picture for one participant: every step in catalog
/// order with its completion flag, plus the current step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Overview {
    pub stages: Vec<StageOverview>,
    pub current: Step,
}
