use chrono::Utc;
use rusqlite::{OptionalExtension, Row};

use crate::db::Database;
use crate::error::StudyError;
use crate::models::{Group, User};

#[derive(Clone)]
pub struct UserStore {
    db: Database,
}

impl UserStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn save(&self, user: &User) -> Result<(), StudyError> {
        let u = user.clone();
        self.db
            .with_conn_async(move |conn| {
                conn.execute(
                    "INSERT INTO users (id, username, password, study_group, is_admin, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                     ON CONFLICT(id) DO UPDATE SET
                       username = excluded.username,
                       password = excluded.password,
                       study_group = excluded.study_group,
                       is_admin = excluded.is_admin",
                    rusqlite::params![
                        u.id,
                        u.username,
                        u.password,
                        u.group.as_str(),
                        u.is_admin,
                        u.created_at.timestamp_millis(),
                    ],
                )?;
                Ok(())
            })
            .await
    }

    pub async fn get(&self, user_id: &str) -> Result<Option<User>, StudyError> {
        let id = user_id.to_string();
        self.db
            .with_conn_async(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, username, password, study_group, is_admin, created_at
                     FROM users WHERE id = ?1",
                )?;
                stmt.query_row(rusqlite::params![id], |row| Ok(row_to_user(row)))
                    .optional()
            })
            .await
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>, StudyError> {
        let name = username.to_string();
        self.db
            .with_conn_async(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, username, password, study_group, is_admin, created_at
                     FROM users WHERE username = ?1",
                )?;
                stmt.query_row(rusqlite::params![name], |row| Ok(row_to_user(row)))
                    .optional()
            })
            .await
    }

    pub async fn list(&self) -> Result<Vec<User>, StudyError> {
        self.db
            .with_conn_async(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, username, password, study_group, is_admin, created_at
                     FROM users ORDER BY created_at ASC",
                )?;
                let rows = stmt
                    .query_map([], |row| Ok(row_to_user(row)))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
    }
}

fn row_to_user(row: &Row<'_>) -> User {
    let created_ms: i64 = row.get(5).unwrap_or(0);

    User {
        id: row.get(0).unwrap_or_default(),
        username: row.get(1).unwrap_or_default(),
        password: row.get(2).unwrap_or_default(),
        group: Group::from_str(&row.get::<_, String>(3).unwrap_or_default())
            .unwrap_or(Group::ControlFirst),
        is_admin: row.get(4).unwrap_or(false),
        created_at: chrono::DateTime::from_timestamp_millis(created_ms)
            .unwrap_or_else(Utc::now),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_and_lookup_by_username() {
        let db = Database::open_in_memory().unwrap();
        let store = UserStore::new(db);

        let user = User::new(
            "p01".to_string(),
            "secret".to_string(),
            Group::TomFirst,
            false,
        );
        store.save(&user).await.unwrap();

        let found = store.get_by_username("p01").await.unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert_eq!(found.group, Group::TomFirst);
        assert!(!found.is_admin);

        assert!(store.get_by_username("p02").await.unwrap().is_none());
    }
}
