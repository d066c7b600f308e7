//! Data export for analysis.
//!
//! Emits one record per participant (admins excluded) with their task
//! step timings and full message log, as pretty-printed JSON.

use serde::Serialize;

use tomstudy_core::store::{ConversationStore, StepStore, UserStore};
use tomstudy_core::Database;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StepExport {
    key: String,
    start_time: String,
    end_time: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MessageExport {
    task: String,
    order: i64,
    content: String,
    role: String,
    time_ms: Option<i64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UserExport {
    username: String,
    group: String,
    steps: Vec<StepExport>,
    messages: Vec<MessageExport>,
}

pub async fn run(db_path: &str, out: Option<&str>) -> Result<(), String> {
    let db = Database::open(db_path).map_err(|e| e.to_string())?;
    let users = UserStore::new(db.clone());
    let steps = StepStore::new(db.clone());
    let conversations = ConversationStore::new(db);

    let mut export = Vec::new();
    for user in users.list().await.map_err(|e| e.to_string())? {
        if user.is_admin {
            continue;
        }

        let step_records = steps
            .list_for_user(&user.id)
            .await
            .map_err(|e| e.to_string())?
            .into_iter()
            // Only the task-bound steps carry timing of interest.
            .filter(|s| s.key.starts_with("interaction-") || s.key.starts_with("quiz-"))
            .map(|s| StepExport {
                key: s.key,
                start_time: s.start_time.to_rfc3339(),
                end_time: s.end_time.map(|t| t.to_rfc3339()),
            })
            .collect();

        let messages = conversations
            .all_for_user(&user.id)
            .await
            .map_err(|e| e.to_string())?
            .into_iter()
            .map(|m| MessageExport {
                task: m.task,
                order: m.ord,
                content: m.content,
                role: m.role.as_str().to_string(),
                time_ms: m.time_ms,
            })
            .collect();

        export.push(UserExport {
            username: user.username,
            group: user.group.as_str().to_string(),
            steps: step_records,
            messages,
        });
    }

    let json = serde_json::to_string_pretty(&export).map_err(|e| e.to_string())?;
    match out {
        Some(path) => std::fs::write(path, json).map_err(|e| e.to_string())?,
        None => println!("{}", json),
    }
    Ok(())
}
