use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

use super::types::{
    ConversationsHistory, ConversationsList, Envelope, OAuthAccess, SearchMessages,
};
use crate::config::Config;
use crate::error::{McpError, McpResult};

const INVALID_RESPONSE: &str = "invalid_response";
const UNKNOWN_ERROR: &str = "unknown_error";

/// Query parameters for a Web API call; `None` entries are left out of the request.
pub type Params<'a> = [(&'a str, Option<String>)];

/// HTTP client for the Slack Web API.
///
/// Holds no credentials: every call takes the workspace token it should run
/// under, so one client serves all connected workspaces.
#[derive(Debug, Clone)]
pub struct SlackClient {
    http: Client,
    base_url: String,
}

impl SlackClient {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.connection.timeout_seconds))
            .pool_idle_timeout(Duration::from_secs(
                config.connection.pool_idle_timeout_seconds,
            ))
            .pool_max_idle_per_host(config.connection.max_idle_per_host.max(0) as usize)
            .build()?;

        Ok(Self {
            http,
            base_url: config.slack.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Client pointing at a custom base URL (mock servers in tests).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issue one authenticated GET and decode the envelope payload into `T`.
    pub async fn call<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        token: &str,
        params: &Params<'_>,
    ) -> McpResult<T> {
        let query: Vec<(&str, &str)> = params
            .iter()
            .filter_map(|(key, value)| value.as_deref().map(|v| (*key, v)))
            .collect();

        debug!(endpoint = %endpoint, params = query.len(), "calling Slack API");

        let response = self
            .http
            .get(format!("{}/{}", self.base_url, endpoint))
            .bearer_auth(token)
            .query(&query)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        decode_envelope(endpoint, status, &body)
    }

    /// `conversations.list`: one page of channels of the given types.
    pub async fn list_conversations(
        &self,
        token: &str,
        types: &str,
        limit: u32,
        cursor: Option<&str>,
        exclude_archived: bool,
    ) -> McpResult<ConversationsList> {
        self.call(
            "conversations.list",
            token,
            &[
                ("types", Some(types.to_string())),
                ("exclude_archived", Some(exclude_archived.to_string())),
                ("limit", Some(limit.to_string())),
                ("cursor", cursor.map(str::to_string)),
            ],
        )
        .await
    }

    /// `conversations.history`: messages of one channel newer than `oldest`.
    pub async fn conversation_history(
        &self,
        token: &str,
        channel: &str,
        oldest: Option<i64>,
        limit: u32,
    ) -> McpResult<ConversationsHistory> {
        self.call(
            "conversations.history",
            token,
            &[
                ("channel", Some(channel.to_string())),
                ("oldest", oldest.map(|o| o.to_string())),
                ("limit", Some(limit.to_string())),
            ],
        )
        .await
    }

    /// `search.messages` sorted by timestamp, newest first.
    pub async fn search_messages(
        &self,
        token: &str,
        query: &str,
        count: u32,
    ) -> McpResult<SearchMessages> {
        self.call(
            "search.messages",
            token,
            &[
                ("query", Some(query.to_string())),
                ("count", Some(count.to_string())),
                ("sort", Some("timestamp".to_string())),
                ("sort_dir", Some("desc".to_string())),
            ],
        )
        .await
    }

    /// `oauth.v2.access`: exchange an authorization code for a workspace token.
    pub async fn oauth_access(
        &self,
        client_id: &str,
        client_secret: &str,
        code: &str,
        redirect_uri: &str,
    ) -> McpResult<OAuthAccess> {
        let endpoint = "oauth.v2.access";
        debug!(endpoint = %endpoint, "exchanging OAuth code");

        let response = self
            .http
            .post(format!("{}/{}", self.base_url, endpoint))
            .form(&[
                ("client_id", client_id),
                ("client_secret", client_secret),
                ("code", code),
                ("redirect_uri", redirect_uri),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        decode_envelope(endpoint, status, &body)
    }
}

fn decode_envelope<T: DeserializeOwned>(
    endpoint: &str,
    status: StatusCode,
    body: &str,
) -> McpResult<T> {
    let envelope: Envelope = serde_json::from_str(body).map_err(|e| {
        warn!(endpoint = %endpoint, status = %status, "undecodable Slack response: {}", e);
        if status.is_success() {
            McpError::upstream(endpoint, INVALID_RESPONSE)
        } else {
            McpError::upstream(endpoint, format!("http_{}", status.as_u16()))
        }
    })?;

    if !envelope.ok {
        let code = envelope.error.unwrap_or_else(|| UNKNOWN_ERROR.to_string());
        warn!(endpoint = %endpoint, code = %code, "Slack API rejected request");
        return Err(McpError::upstream(endpoint, code));
    }

    serde_json::from_value(envelope.payload).map_err(|e| {
        warn!(endpoint = %endpoint, "unexpected Slack payload shape: {}", e);
        McpError::upstream(endpoint, format!("{}: {}", INVALID_RESPONSE, e))
    })
}
