use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Experiment group a participant is assigned to. The group decides
/// which agent variant answers in each stage (see the design config).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Group {
    ControlFirst,
    TomFirst,
}

impl Group {
    pub const ALL: [Group; 2] = [Group::ControlFirst, Group::TomFirst];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ControlFirst => "control-first",
            Self::TomFirst => "tom-first",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "control-first" => Some(Self::ControlFirst),
            "tom-first" => Some(Self::TomFirst),
            _ => None,
        }
    }
}

/// A study participant (or admin) account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub group: Group,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(username: String, password: String, group: Group, is_admin: bool) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            username,
            password,
            group,
            is_admin,
            created_at: Utc::now(),
        }
    }
}
