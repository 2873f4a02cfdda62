use anyhow::Result;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

pub(super) async fn initialize_schema(pool: &Pool<SqliteConnectionManager>) -> Result<()> {
    let conn = pool.get()?;

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS slack_tokens (
            team_id TEXT PRIMARY KEY,
            access_token TEXT NOT NULL,
            team_name TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_slack_tokens_created_at
            ON slack_tokens(created_at);",
    )?;

    Ok(())
}
