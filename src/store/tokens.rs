use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{OptionalExtension, Row, params};

use super::sqlite_store::SqliteCredentialStore;
use super::{CredentialStore, WorkspaceCredential};

fn credential_from_row(row: &Row<'_>) -> rusqlite::Result<WorkspaceCredential> {
    Ok(WorkspaceCredential {
        team_id: row.get(0)?,
        access_token: row.get(1)?,
        team_name: row.get(2)?,
        created_at: row.get(3)?,
    })
}

#[async_trait]
impl CredentialStore for SqliteCredentialStore {
    async fn find(&self, team_id: &str) -> Result<Option<WorkspaceCredential>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare_cached(
            "SELECT team_id, access_token, team_name, created_at
             FROM slack_tokens WHERE team_id = ?1",
        )?;

        let credential = stmt
            .query_row(params![team_id], credential_from_row)
            .optional()?;

        Ok(credential)
    }

    async fn upsert(
        &self,
        team_id: &str,
        access_token: &str,
        team_name: &str,
    ) -> Result<WorkspaceCredential> {
        if team_id.trim().is_empty() {
            return Err(anyhow::anyhow!("team_id must not be empty"));
        }

        let conn = self.pool.get()?;
        let now = Utc::now();

        // Single statement, so concurrent re-authorizations resolve last-writer-wins
        let mut stmt = conn.prepare_cached(
            "INSERT INTO slack_tokens (team_id, access_token, team_name, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)
             ON CONFLICT(team_id) DO UPDATE SET
                access_token = excluded.access_token,
                team_name = excluded.team_name,
                updated_at = excluded.updated_at
             RETURNING team_id, access_token, team_name, created_at",
        )?;

        let credential = stmt.query_row(
            params![team_id, access_token, team_name, now],
            credential_from_row,
        )?;

        Ok(credential)
    }

    async fn list_all(&self) -> Result<Vec<WorkspaceCredential>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare_cached(
            "SELECT team_id, access_token, team_name, created_at
             FROM slack_tokens ORDER BY created_at, team_id",
        )?;

        let credentials = stmt
            .query_map([], credential_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(credentials)
    }
}
