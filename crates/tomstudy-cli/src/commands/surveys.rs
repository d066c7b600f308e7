//! Survey link registration.
//!
//! Loads a JSON map of step key to external survey URL and upserts the
//! entries, so links can be swapped between pilot runs without touching
//! recorded data.

use std::collections::BTreeMap;

use tomstudy_core::models::SurveyProject;
use tomstudy_core::store::SurveyStore;
use tomstudy_core::Database;

fn parse_entries(raw: &str) -> Result<BTreeMap<String, String>, String> {
    serde_json::from_str(raw).map_err(|e| format!("invalid survey file: {}", e))
}

pub async fn run(db_path: &str, file: &str) -> Result<(), String> {
    let raw = std::fs::read_to_string(file).map_err(|e| format!("failed to read {}: {}", file, e))?;
    let entries = parse_entries(&raw)?;

    let db = Database::open(db_path).map_err(|e| e.to_string())?;
    let store = SurveyStore::new(db);

    for (key, url) in &entries {
        store
            .set(&SurveyProject {
                key: key.clone(),
                url: url.clone(),
            })
            .await
            .map_err(|e| e.to_string())?;
        println!("{} -> {}", key, url);
    }
    println!("{} survey link(s) registered", entries.len());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_rejects_malformed_json() {
        assert!(parse_entries("{\"quiz-loop\": 1}").is_err());
        assert!(parse_entries("not json").is_err());
    }

    #[tokio::test]
    async fn registered_links_are_readable() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("surveys.json");
        std::fs::write(
            &file,
            r#"{
                "example": "https://survey.example/intro",
                "quiz-loop": "https://survey.example/loop?lang=en"
            }"#,
        )
        .unwrap();
        let db_path = dir.path().join("study.db");

        run(db_path.to_str().unwrap(), file.to_str().unwrap())
            .await
            .unwrap();

        let store = SurveyStore::new(Database::open(db_path.to_str().unwrap()).unwrap());
        let project = store.get("quiz-loop").await.unwrap().unwrap();
        assert_eq!(project.url, "https://survey.example/loop?lang=en");
        assert!(store.get("example").await.unwrap().is_some());
        assert!(store.get("quiz-sort").await.unwrap().is_none());
    }
}
