use std::sync::Arc;
use tracing::debug;

use super::BrokerContext;
use crate::error::{IntoMcpError, McpError, McpResult};
use crate::store::CredentialStore;

/// Maps a team id to the access token stored for it.
pub struct TokenResolver {
    store: Arc<dyn CredentialStore>,
    auth_url: String,
}

impl TokenResolver {
    pub fn new(ctx: &BrokerContext) -> Self {
        Self {
            store: ctx.store.clone(),
            auth_url: ctx.settings.auth_url.clone(),
        }
    }

    pub async fn resolve(&self, team_id: &str) -> McpResult<String> {
        let credential = self
            .store
            .find(team_id)
            .await
            .mcp_context("Failed to look up workspace credential")?;

        match credential {
            Some(credential) => {
                debug!(team_id = %team_id, "resolved workspace token");
                Ok(credential.access_token)
            }
            None => Err(McpError::CredentialNotFound {
                team_id: team_id.to_string(),
                auth_url: self.auth_url.clone(),
            }),
        }
    }
}
