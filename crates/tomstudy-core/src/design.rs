//! Experiment design configuration.
//!
//! The design file (`design.json`) maps each stage to its ordered task
//! list and each experiment group to the agent variant used per stage.
//! It is loaded once at process start by the host layer and threaded as
//! an explicit parameter through every core call, so the core stays free
//! of ambient state and is trivially testable with synthetic configs.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::agent;
use crate::error::StudyError;
use crate::models::{Group, Snippet, Stage};

/// Per-group configuration: which agent variant answers in each stage.
#[derive(Debug, Clone, Deserialize)]
pub struct GroupConfig {
    pub agents: HashMap<Stage, String>,
}

/// Per-stage configuration: the ordered task-name list.
#[derive(Debug, Clone, Deserialize)]
pub struct StageConfig {
    pub tasks: Vec<String>,
}

/// The validated experiment design. Immutable for the lifetime of the
/// process; changing it after data has been recorded silently
/// reinterprets history (accepted, documented limitation).
#[derive(Debug, Clone, Deserialize)]
pub struct DesignConfig {
    pub groups: HashMap<Group, GroupConfig>,
    pub stages: HashMap<Stage, StageConfig>,
    /// Task name of the example snippet shown on the welcome step.
    pub example: String,
    /// Folder the design file was loaded from; snippets live beneath it.
    #[serde(skip)]
    pub folder: PathBuf,
}

impl DesignConfig {
    /// Load and validate a design file.
    pub fn load(path: &Path) -> Result<Self, StudyError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| StudyError::Config(format!("failed to read {}: {}", path.display(), e)))?;
        let mut config: DesignConfig = serde_json::from_str(&raw)
            .map_err(|e| StudyError::Config(format!("failed to parse {}: {}", path.display(), e)))?;
        config.folder = path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));
        config.validate()?;
        Ok(config)
    }

    /// Check the design is complete: every stage configured with at
    /// least one task, every group bound to a known agent per stage.
    pub fn validate(&self) -> Result<(), StudyError> {
        for stage in Stage::ALL {
            let stage_config = self
                .stages
                .get(&stage)
                .ok_or_else(|| StudyError::Config(format!("missing stage {}", stage.as_str())))?;
            if stage_config.tasks.is_empty() {
                return Err(StudyError::Config(format!(
                    "stage {} has no tasks",
                    stage.as_str()
                )));
            }
        }

        for group in Group::ALL {
            let group_config = self
                .groups
                .get(&group)
                .ok_or_else(|| StudyError::Config(format!("missing group {}", group.as_str())))?;
            for stage in Stage::ALL {
                let name = group_config.agents.get(&stage).ok_or_else(|| {
                    StudyError::Config(format!(
                        "group {} has no agent for stage {}",
                        group.as_str(),
                        stage.as_str()
                    ))
                })?;
                if agent::by_name(name).is_none() {
                    return Err(StudyError::Config(format!(
                        "group {} stage {} names unknown agent '{}'",
                        group.as_str(),
                        stage.as_str(),
                        name
                    )));
                }
            }
        }

        Ok(())
    }

    /// Agent variant name for a (group, stage) combination. Always
    /// present on a validated config.
    pub fn agent_name(&self, group: Group, stage: Stage) -> Result<&str, StudyError> {
        self.groups
            .get(&group)
            .and_then(|g| g.agents.get(&stage))
            .map(|s| s.as_str())
            .ok_or_else(|| {
                StudyError::Config(format!(
                    "no agent configured for group {} stage {}",
                    group.as_str(),
                    stage.as_str()
                ))
            })
    }

    /// Read the code snippet for a task from `snippets/<task>.py`.
    pub fn snippet(&self, task: &str) -> Result<Snippet, StudyError> {
        let path = self.folder.join("snippets").join(format!("{}.py", task));
        let code = std::fs::read_to_string(&path)
            .map_err(|_| StudyError::NotFound(format!("snippet for task '{}'", task)))?;
        Ok(Snippet {
            code,
            language: "python".to_string(),
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;

    /// A synthetic design used across core tests:
    /// stage A has tasks ["loop", "recursion"], stage B has ["sort"].
    pub(crate) fn test_design() -> DesignConfig {
        let mut groups = HashMap::new();
        groups.insert(
            Group::ControlFirst,
            GroupConfig {
                agents: HashMap::from([
                    (Stage::A, "control".to_string()),
                    (Stage::B, "tom".to_string()),
                ]),
            },
        );
        groups.insert(
            Group::TomFirst,
            GroupConfig {
                agents: HashMap::from([
                    (Stage::A, "tom".to_string()),
                    (Stage::B, "control".to_string()),
                ]),
            },
        );

        let mut stages = HashMap::new();
        stages.insert(
            Stage::A,
            StageConfig {
                tasks: vec!["loop".to_string(), "recursion".to_string()],
            },
        );
        stages.insert(
            Stage::B,
            StageConfig {
                tasks: vec!["sort".to_string()],
            },
        );

        DesignConfig {
            groups,
            stages,
            example: "loop".to_string(),
            folder: PathBuf::from("."),
        }
    }

    #[test]
    fn load_parses_and_validates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("design.json");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(
            file,
            r#"{{
                "groups": {{
                    "control-first": {{ "agents": {{ "A": "control", "B": "tom" }} }},
                    "tom-first": {{ "agents": {{ "A": "tom", "B": "control" }} }}
                }},
                "stages": {{
                    "A": {{ "tasks": ["loop", "recursion"] }},
                    "B": {{ "tasks": ["sort"] }}
                }},
                "example": "loop"
            }}"#
        )
        .unwrap();

        let config = DesignConfig::load(&path).unwrap();
        assert_eq!(config.example, "loop");
        assert_eq!(config.stages[&Stage::A].tasks.len(), 2);
        assert_eq!(config.agent_name(Group::TomFirst, Stage::A).unwrap(), "tom");
        assert_eq!(config.folder, dir.path());
    }

    #[test]
    fn validate_rejects_unknown_agent() {
        let mut config = test_design();
        config
            .groups
            .get_mut(&Group::ControlFirst)
            .unwrap()
            .agents
            .insert(Stage::A, "oracle".to_string());
        assert!(matches!(config.validate(), Err(StudyError::Config(_))));
    }

    #[test]
    fn validate_rejects_empty_task_list() {
        let mut config = test_design();
        config.stages.get_mut(&Stage::B).unwrap().tasks.clear();
        assert!(matches!(config.validate(), Err(StudyError::Config(_))));
    }

    #[test]
    fn snippet_reads_from_design_folder() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("snippets")).unwrap();
        std::fs::write(dir.path().join("snippets").join("loop.py"), "print(1)\n").unwrap();

        let mut config = test_design();
        config.folder = dir.path().to_path_buf();

        let snippet = config.snippet("loop").unwrap();
        assert_eq!(snippet.code, "print(1)\n");
        assert_eq!(snippet.language, "python");

        assert!(matches!(
            config.snippet("missing"),
            Err(StudyError::NotFound(_))
        ));
    }
}
