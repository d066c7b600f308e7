//! Participant account creation.
//!
//! Credentials use a reduced alphabet without 0/o or 1/l to avoid
//! confusion when handed out on paper. Groups alternate so each seeding
//! run stays balanced across the experiment conditions.

use tomstudy_core::models::{Group, User};
use tomstudy_core::store::UserStore;
use tomstudy_core::Database;

const CHARACTERS: &[u8] = b"abcdefghijkmnpqrstuvwxyz23456789";
const CREDENTIAL_LENGTH: usize = 6;

fn random_string(length: usize) -> String {
    // The v4 UUID's 16 random bytes are plenty for a 6-char credential.
    let bytes = *uuid::Uuid::new_v4().as_bytes();
    bytes
        .iter()
        .take(length)
        .map(|b| CHARACTERS[*b as usize % CHARACTERS.len()] as char)
        .collect()
}

fn next_group(i: usize) -> Group {
    Group::ALL[i % Group::ALL.len()]
}

pub async fn run(db_path: &str, count: usize, admin: bool) -> Result<(), String> {
    let db = Database::open(db_path).map_err(|e| e.to_string())?;
    let store = UserStore::new(db);

    println!("username,password,group,admin");
    for i in 0..count {
        let user = User::new(
            random_string(CREDENTIAL_LENGTH),
            random_string(CREDENTIAL_LENGTH),
            next_group(i),
            admin,
        );
        store.save(&user).await.map_err(|e| e.to_string())?;
        println!(
            "{},{},{},{}",
            user.username,
            user.password,
            user.group.as_str(),
            user.is_admin
        );
    }

    Ok(())
}
