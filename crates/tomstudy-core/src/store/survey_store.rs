use rusqlite::{OptionalExtension, Row};

use crate::db::Database;
use crate::error::StudyError;
use crate::models::SurveyProject;

/// External survey links keyed by step key.
#[derive(Clone)]
pub struct SurveyStore {
    db: Database,
}

impl SurveyStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn get(&self, key: &str) -> Result<Option<SurveyProject>, StudyError> {
        let key = key.to_string();
        self.db
            .with_conn_async(move |conn| {
                let mut stmt =
                    conn.prepare("SELECT key, url FROM survey_projects WHERE key = ?1")?;
                stmt.query_row(rusqlite::params![key], |row| Ok(row_to_survey(row)))
                    .optional()
            })
            .await
    }

    pub async fn set(&self, project: &SurveyProject) -> Result<(), StudyError> {
        let p = project.clone();
        self.db
            .with_conn_async(move |conn| {
                conn.execute(
                    "INSERT INTO survey_projects (key, url) VALUES (?1, ?2)
                     ON CONFLICT(key) DO UPDATE SET url = excluded.url",
                    rusqlite::params![p.key, p.url],
                )?;
                Ok(())
            })
            .await
    }
}

fn row_to_survey(row: &Row<'_>) -> SurveyProject {
    SurveyProject {
        key: row.get(0).unwrap_or_default(),
        url: row.get(1).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_then_get() {
        let db = Database::open_in_memory().unwrap();
        let store = SurveyStore::new(db);

        store
            .set(&SurveyProject {
                key: "quiz-loop".to_string(),
                url: "https://survey.example/loop".to_string(),
            })
            .await
            .unwrap();

        let project = store.get("quiz-loop").await.unwrap().unwrap();
        assert_eq!(project.url, "https://survey.example/loop");
        assert!(store.get("quiz-sort").await.unwrap().is_none());
    }
}
