use anyhow::Result;
use serde::Deserialize;
use sqlseed::{Batch, SqlValue, TaskSpec};
use std::path::PathBuf;
use std::sync::Arc;

use super::parse_line;

const UPSERT_USER: &str = r#"
INSERT INTO "User" ("id", "name")
VALUES ($1, $2)
ON CONFLICT ("id") DO UPDATE SET
    "name" = $2
"#;

#[derive(Debug, Deserialize)]
struct User {
    id: i32,
    name: String,
}

/// Seeds `"User"` from `{"id": 1, "name": "..."}` lines
pub fn users(path: impl Into<PathBuf>) -> TaskSpec {
    TaskSpec::new(path, Arc::new(handle_user))
}

pub fn handle_user(batch: &mut Batch, line: &[u8]) -> Result<()> {
    let user: User = parse_line(line, "user")?;

    batch.queue(UPSERT_USER, [SqlValue::from(user.id), SqlValue::from(user.name)]);
    Ok(())
}
