//! Step catalog: the canonical ordered list of steps derived from the
//! experiment design.
//!
//! Pure and deterministic: identical configs produce identical catalogs.
//! Every "current step" computation walks this catalog, so it must stay
//! cheap; it is regenerated on each call rather than cached.

use crate::design::DesignConfig;
use crate::error::StudyError;
use crate::models::{Stage, Step, TaskAlias};

/// A block of steps in the catalog. Named blocks correspond to stages;
/// the welcome and finished blocks are unnamed.
#[derive(Debug, Clone)]
pub struct StepStage {
    pub name: Option<Stage>,
    pub steps: Vec<Step>,
}

/// The full ordered catalog, grouped by stage:
/// `[welcome]`, then per stage `interaction(t0), quiz(t0), ...,
/// evaluation(stage)`, then `[finished]`.
pub fn step_stages(config: &DesignConfig) -> Vec<StepStage> {
    let mut result = vec![StepStage {
        name: None,
        steps: vec![Step::Welcome],
    }];

    for stage in Stage::ALL {
        let mut steps = Vec::new();
        if let Some(stage_config) = config.stages.get(&stage) {
            for index in 0..stage_config.tasks.len() {
                let task = TaskAlias { stage, index };
                steps.push(Step::Interaction { task });
                steps.push(Step::Quiz { task });
            }
        }
        steps.push(Step::Evaluation { stage });
        result.push(StepStage {
            name: Some(stage),
            steps,
        });
    }

    result.push(StepStage {
        name: None,
        steps: vec![Step::Finished],
    });

    result
}

/// The catalog flattened into one ordered step sequence.
pub fn step_sequence(config: &DesignConfig) -> Vec<Step> {
    step_stages(config)
        .into_iter()
        .flat_map(|stage| stage.steps)
        .collect()
}

/// Resolve a task alias to its configured task name.
pub fn task_name(config: &DesignConfig, alias: TaskAlias) -> Result<&str, StudyError> {
    config
        .stages
        .get(&alias.stage)
        .and_then(|stage| stage.tasks.get(alias.index))
        .map(|name| name.as_str())
        .ok_or_else(|| {
            StudyError::InvalidTask(format!(
                "stage {} has no task at index {}",
                alias.stage.as_str(),
                alias.index
            ))
        })
}

/// Stable string identifier for a step, used for persistence lookups.
///
/// Task-bound keys embed the resolved task name, so renumbering tasks in
/// the design changes keys and silently reinterprets recorded history.
pub fn step_key(config: &DesignConfig, step: Step) -> Result<String, StudyError> {
    Ok(match step {
        Step::Welcome => "welcome".to_string(),
        Step::Interaction { task } => format!("interaction-{}", task_name(config, task)?),
        Step::Quiz { task } => format!("quiz-{}", task_name(config, task)?),
        Step::Evaluation { stage } => format!("evaluation-{}", stage.as_str()),
        Step::Finished => "finished".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::tests::test_design;

    #[test]
    fn sequence_orders_steps_per_stage() {
        let config = test_design();
        let sequence = step_sequence(&config);

        let a0 = TaskAlias {
            stage: Stage::A,
            index: 0,
        };
        let a1 = TaskAlias {
            stage: Stage::A,
            index: 1,
        };
        let b0 = TaskAlias {
            stage: Stage::B,
            index: 0,
        };

        assert_eq!(
            sequence,
            vec![
                Step::Welcome,
                Step::Interaction { task: a0 },
                Step::Quiz { task: a0 },
                Step::Interaction { task: a1 },
                Step::Quiz { task: a1 },
                Step::Evaluation { stage: Stage::A },
                Step::Interaction { task: b0 },
                Step::Quiz { task: b0 },
                Step::Evaluation { stage: Stage::B },
                Step::Finished,
            ]
        );
    }

    #[test]
    fn sequence_is_deterministic() {
        let config = test_design();
        assert_eq!(step_sequence(&config), step_sequence(&config));
    }

    #[test]
    fn keys_resolve_task_names() {
        let config = test_design();

        assert_eq!(step_key(&config, Step::Welcome).unwrap(), "welcome");
        assert_eq!(step_key(&config, Step::Finished).unwrap(), "finished");
        assert_eq!(
            step_key(
                &config,
                Step::Interaction {
                    task: TaskAlias {
                        stage: Stage::A,
                        index: 1
                    }
                }
            )
            .unwrap(),
            "interaction-recursion"
        );
        assert_eq!(
            step_key(
                &config,
                Step::Quiz {
                    task: TaskAlias {
                        stage: Stage::B,
                        index: 0
                    }
                }
            )
            .unwrap(),
            "quiz-sort"
        );
        assert_eq!(
            step_key(&config, Step::Evaluation { stage: Stage::A }).unwrap(),
            "evaluation-A"
        );
    }

    #[test]
    fn out_of_range_alias_is_invalid() {
        let config = test_design();
        let alias = TaskAlias {
            stage: Stage::B,
            index: 3,
        };
        assert!(matches!(
            task_name(&config, alias),
            Err(StudyError::InvalidTask(_))
        ));
        assert!(matches!(
            step_key(&config, Step::Quiz { task: alias }),
            Err(StudyError::InvalidTask(_))
        ));
    }
}
