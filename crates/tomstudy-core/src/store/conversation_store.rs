use chrono::Utc;
use rusqlite::Row;

use crate::db::Database;
use crate::error::StudyError;
use crate::models::{Message, MessageDraft, MessageRole};

/// Append-only, per-(user, task) ordered log of conversation messages.
///
/// Owns the order sequencing: `ord` values are assigned server-side as
/// max(existing) + 1 under the same transaction that persists the batch,
/// so concurrent batches serialize at the connection.
#[derive(Clone)]
pub struct ConversationStore {
    db: Database,
}

impl ConversationStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// All messages for a (user, task) pair in chronological order.
    pub async fn messages(&self, user_id: &str, task: &str) -> Result<Vec<Message>, StudyError> {
        let uid = user_id.to_string();
        let task = task.to_string();
        self.db
            .with_conn_async(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, user_id, task, role, content, ord,
                            token_count_input, token_count_output, time_ms, created_at
                     FROM interaction_messages
                     WHERE user_id = ?1 AND task = ?2
                     ORDER BY ord ASC",
                )?;
                let rows = stmt
                    .query_map(rusqlite::params![uid, task], |row| Ok(row_to_message(row)))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
    }

    /// The most recent `limit` ai/user messages, returned in
    /// chronological order.
    ///
    /// Fetched newest-first so the bound keeps the latest messages, then
    /// reversed before returning.
    pub async fn history(
        &self,
        user_id: &str,
        task: &str,
        limit: usize,
    ) -> Result<Vec<Message>, StudyError> {
        let uid = user_id.to_string();
        let task = task.to_string();
        self.db
            .with_conn_async(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, user_id, task, role, content, ord,
                            token_count_input, token_count_output, time_ms, created_at
                     FROM interaction_messages
                     WHERE user_id = ?1 AND task = ?2 AND role IN ('ai', 'user')
                     ORDER BY ord DESC
                     LIMIT ?3",
                )?;
                let mut rows = stmt
                    .query_map(rusqlite::params![uid, task, limit as i64], |row| {
                        Ok(row_to_message(row))
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                rows.reverse();
                Ok(rows)
            })
            .await
    }

    /// Persist a batch of drafts atomically with consecutive orders
    /// starting at max(existing) + 1. All-or-nothing: a failure partway
    /// leaves no partial batch visible to readers.
    pub async fn append_batch(
        &self,
        user_id: &str,
        task: &str,
        drafts: Vec<MessageDraft>,
    ) -> Result<(), StudyError> {
        if drafts.is_empty() {
            return Ok(());
        }

        let uid = user_id.to_string();
        let task = task.to_string();
        let now = Utc::now().timestamp_millis();
        self.db
            .with_conn_async(move |conn| {
                let tx = conn.unchecked_transaction()?;

                let max_ord: i64 = tx.query_row(
                    "SELECT COALESCE(MAX(ord), 0) FROM interaction_messages
                     WHERE user_id = ?1 AND task = ?2",
                    rusqlite::params![uid, task],
                    |row| row.get(0),
                )?;

                for (i, draft) in drafts.iter().enumerate() {
                    tx.execute(
                        "INSERT INTO interaction_messages
                           (id, user_id, task, role, content, ord,
                            token_count_input, token_count_output, time_ms, created_at)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                        rusqlite::params![
                            uuid::Uuid::new_v4().to_string(),
                            uid,
                            task,
                            draft.role.as_str(),
                            draft.content,
                            max_ord + i as i64 + 1,
                            draft.token_count_input,
                            draft.token_count_output,
                            draft.time_ms,
                            now,
                        ],
                    )?;
                }

                tx.commit()
            })
            .await
    }

    /// All messages for a user across tasks (data export).
    pub async fn all_for_user(&self, user_id: &str) -> Result<Vec<Message>, StudyError> {
        let uid = user_id.to_string();
        self.db
            .with_conn_async(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, user_id, task, role, content, ord,
                            token_count_input, token_count_output, time_ms, created_at
                     FROM interaction_messages
                     WHERE user_id = ?1
                     ORDER BY task ASC, ord ASC",
                )?;
                let rows = stmt
                    .query_map(rusqlite::params![uid], |row| Ok(row_to_message(row)))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
    }
}

fn row_to_message(row: &Row<'_>) -> Message {
    let created_ms: i64 = row.get(9).unwrap_or(0);

    Message {
        id: row.get(0).unwrap_or_default(),
        user_id: row.get(1).unwrap_or_default(),
        task: row.get(2).unwrap_or_default(),
        role: MessageRole::from_str(&row.get::<_, String>(3).unwrap_or_default())
            .unwrap_or(MessageRole::Internal),
        content: row.get(4).unwrap_or_default(),
        ord: row.get(5).unwrap_or(0),
        token_count_input: row.get(6).unwrap_or(None),
        token_count_output: row.get(7).unwrap_or(None),
        time_ms: row.get(8).unwrap_or(None),
        created_at: chrono::DateTime::from_timestamp_millis(created_ms).unwrap_or_else(Utc::now),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Group, User};
    use crate::store::UserStore;

    async fn seeded_store() -> (ConversationStore, String) {
        let db = Database::open_in_memory().unwrap();
        let user = User::new(
            "participant".to_string(),
            "pw".to_string(),
            Group::ControlFirst,
            false,
        );
        UserStore::new(db.clone()).save(&user).await.unwrap();
        (ConversationStore::new(db), user.id)
    }

    fn draft(role: MessageRole, content: &str) -> MessageDraft {
        MessageDraft {
            role,
            content: content.to_string(),
            token_count_input: None,
            token_count_output: None,
            time_ms: None,
        }
    }

    #[tokio::test]
    async fn batches_get_contiguous_orders() {
        let (store, uid) = seeded_store().await;

        store
            .append_batch(
                &uid,
                "loop",
                vec![
                    draft(MessageRole::User, "q1"),
                    draft(MessageRole::Ai, "a1"),
                ],
            )
            .await
            .unwrap();
        store
            .append_batch(
                &uid,
                "loop",
                vec![
                    draft(MessageRole::User, "q2"),
                    draft(MessageRole::Internal, "thinking"),
                    draft(MessageRole::Ai, "a2"),
                ],
            )
            .await
            .unwrap();

        let messages = store.messages(&uid, "loop").await.unwrap();
        let orders: Vec<i64> = messages.iter().map(|m| m.ord).collect();
        assert_eq!(orders, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn orders_are_scoped_per_task() {
        let (store, uid) = seeded_store().await;

        store
            .append_batch(&uid, "loop", vec![draft(MessageRole::User, "q")])
            .await
            .unwrap();
        store
            .append_batch(&uid, "sort", vec![draft(MessageRole::User, "q")])
            .await
            .unwrap();

        assert_eq!(store.messages(&uid, "loop").await.unwrap()[0].ord, 1);
        assert_eq!(store.messages(&uid, "sort").await.unwrap()[0].ord, 1);
    }

    #[tokio::test]
    async fn history_keeps_latest_in_chronological_order() {
        let (store, uid) = seeded_store().await;

        for i in 0..4 {
            store
                .append_batch(
                    &uid,
                    "loop",
                    vec![
                        draft(MessageRole::User, &format!("q{}", i)),
                        draft(MessageRole::Internal, "hidden"),
                        draft(MessageRole::Ai, &format!("a{}", i)),
                    ],
                )
                .await
                .unwrap();
        }

        let history = store.history(&uid, "loop", 4).await.unwrap();
        assert_eq!(history.len(), 4);
        // The most recent two turns, oldest first, internal rows skipped.
        let contents: Vec<&str> = history.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["q2", "a2", "q3", "a3"]);
        assert!(history.windows(2).all(|w| w[0].ord < w[1].ord));
    }

    #[tokio::test]
    async fn history_of_empty_conversation_is_empty() {
        let (store, uid) = seeded_store().await;
        assert!(store.history(&uid, "loop", 20).await.unwrap().is_empty());
    }
}
