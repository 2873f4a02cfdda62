mod schema;
pub mod sqlite_store;
mod tokens;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;

pub use sqlite_store::SqliteCredentialStore;

/// One connected workspace and the token it was authorized with.
#[derive(Clone, PartialEq)]
pub struct WorkspaceCredential {
    pub team_id: String,
    pub access_token: String,
    pub team_name: String,
    pub created_at: DateTime<Utc>,
}

impl fmt::Debug for WorkspaceCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkspaceCredential")
            .field("team_id", &self.team_id)
            .field("access_token", &"<redacted>")
            .field("team_name", &self.team_name)
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Durable mapping from team id to workspace credential.
///
/// Upserting an existing team id replaces its token and name but keeps the
/// first `created_at`. Records are never deleted.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find(&self, team_id: &str) -> Result<Option<WorkspaceCredential>>;

    async fn upsert(
        &self,
        team_id: &str,
        access_token: &str,
        team_name: &str,
    ) -> Result<WorkspaceCredential>;

    /// All credentials, oldest connection first.
    async fn list_all(&self) -> Result<Vec<WorkspaceCredential>>;
}
