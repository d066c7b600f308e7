use chrono::Utc;
use rusqlite::{OptionalExtension, Row};
use std::collections::HashSet;

use crate::db::Database;
use crate::design::DesignConfig;
use crate::error::StudyError;
use crate::models::{Overview, StageOverview, Step, StepState, UserStep};
use crate::steps::{step_key, step_stages};

/// Tracks participant progress through the step catalog.
///
/// Owns the `user_steps` lifecycle: one row per (user, step key), created
/// lazily on first start and updated (never duplicated) on completion.
#[derive(Clone)]
pub struct StepStore {
    db: Database,
}

impl StepStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Compute the progress overview: every catalog step with its
    /// completion flag, and the current step (the first not-completed
    /// step in catalog order, or `finished` when none remain).
    ///
    /// A linear scan over the catalog against the completed-key set; run
    /// on every overview request, no caching.
    pub async fn overview(
        &self,
        config: &DesignConfig,
        user_id: &str,
    ) -> Result<Overview, StudyError> {
        let uid = user_id.to_string();
        let completed: HashSet<String> = self
            .db
            .with_conn_async(move |conn| {
                let mut stmt = conn
                    .prepare("SELECT key FROM user_steps WHERE user_id = ?1 AND completed = 1")?;
                let rows = stmt
                    .query_map(rusqlite::params![uid], |row| row.get::<_, String>(0))?
                    .collect::<Result<HashSet<_>, _>>()?;
                Ok(rows)
            })
            .await?;

        let mut current: Option<Step> = None;
        let mut stages = Vec::new();

        for stage in step_stages(config) {
            let mut steps = Vec::new();
            for step in stage.steps {
                let done = completed.contains(&step_key(config, step)?);
                if !done && current.is_none() {
                    current = Some(step);
                }
                steps.push(StepState {
                    step,
                    completed: done,
                });
            }
            stages.push(StageOverview {
                name: stage.name,
                steps,
            });
        }

        Ok(Overview {
            stages,
            current: current.unwrap_or(Step::Finished),
        })
    }

    /// Fetch the progress record for one step, if any.
    pub async fn get(
        &self,
        config: &DesignConfig,
        user_id: &str,
        step: Step,
    ) -> Result<Option<UserStep>, StudyError> {
        let uid = user_id.to_string();
        let key = step_key(config, step)?;
        self.db
            .with_conn_async(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT user_id, key, start_time, end_time, completed
                     FROM user_steps WHERE user_id = ?1 AND key = ?2",
                )?;
                stmt.query_row(rusqlite::params![uid, key], |row| Ok(row_to_user_step(row)))
                    .optional()
            })
            .await
    }

    /// Record that a step was started, unless it already has a record.
    ///
    /// Idempotent: an existing row is returned unchanged. Concurrent
    /// duplicate calls race on the insert and the (user_id, key) primary
    /// key resolves the conflict; the loser reads back the winner's row.
    pub async fn start_if_not_started(
        &self,
        config: &DesignConfig,
        user_id: &str,
        step: Step,
    ) -> Result<UserStep, StudyError> {
        let uid = user_id.to_string();
        let key = step_key(config, step)?;
        let now = Utc::now().timestamp_millis();
        self.db
            .with_conn_async(move |conn| {
                conn.execute(
                    "INSERT INTO user_steps (user_id, key, start_time, completed)
                     VALUES (?1, ?2, ?3, 0)
                     ON CONFLICT(user_id, key) DO NOTHING",
                    rusqlite::params![uid, key, now],
                )?;
                let mut stmt = conn.prepare(
                    "SELECT user_id, key, start_time, end_time, completed
                     FROM user_steps WHERE user_id = ?1 AND key = ?2",
                )?;
                stmt.query_row(rusqlite::params![uid, key], |row| Ok(row_to_user_step(row)))
            })
            .await
    }

    /// Mark a step completed with end time now, creating the record if it
    /// was never started. Last write wins on concurrent completes.
    pub async fn complete(
        &self,
        config: &DesignConfig,
        user_id: &str,
        step: Step,
    ) -> Result<(), StudyError> {
        let uid = user_id.to_string();
        let key = step_key(config, step)?;
        let now = Utc::now().timestamp_millis();
        self.db
            .with_conn_async(move |conn| {
                conn.execute(
                    "INSERT INTO user_steps (user_id, key, start_time, end_time, completed)
                     VALUES (?1, ?2, ?3, ?3, 1)
                     ON CONFLICT(user_id, key) DO UPDATE SET
                       end_time = excluded.end_time,
                       completed = 1",
                    rusqlite::params![uid, key, now],
                )?;
                Ok(())
            })
            .await
    }

    /// All progress records for a user, in catalog-independent key order.
    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<UserStep>, StudyError> {
        let uid = user_id.to_string();
        self.db
            .with_conn_async(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT user_id, key, start_time, end_time, completed
                     FROM user_steps WHERE user_id = ?1 ORDER BY start_time ASC",
                )?;
                let rows = stmt
                    .query_map(rusqlite::params![uid], |row| Ok(row_to_user_step(row)))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
    }
}

fn row_to_user_step(row: &Row<'_>) -> UserStep {
    let start_ms: i64 = row.get(2).unwrap_or(0);
    let end_ms: Option<i64> = row.get(3).unwrap_or(None);

    UserStep {
        user_id: row.get(0).unwrap_or_default(),
        key: row.get(1).unwrap_or_default(),
        start_time: chrono::DateTime::from_timestamp_millis(start_ms).unwrap_or_else(Utc::now),
        end_time: end_ms.and_then(chrono::DateTime::from_timestamp_millis),
        completed: row.get(4).unwrap_or(false),
    }
}
