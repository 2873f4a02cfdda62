use thiserror::Error;

#[derive(Error, Debug)]
pub enum McpError {
    #[error("No Slack token found for team '{team_id}'. Authenticate the workspace at {auth_url}")]
    CredentialNotFound { team_id: String, auth_url: String },

    #[error("Channel '{channel}' not found{}", format_suggestions(.suggestions))]
    ChannelNotFound {
        channel: String,
        suggestions: Vec<String>,
    },

    #[error("Slack API error from {endpoint}: {code}")]
    UpstreamApi { endpoint: String, code: String },

    #[error("Network error while contacting Slack")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Credential store error: {0}")]
    Store(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

fn format_suggestions(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else {
        format!(". Did you mean: {}?", suggestions.join(", "))
    }
}

impl McpError {
    pub fn upstream(endpoint: &str, code: impl Into<String>) -> Self {
        McpError::UpstreamApi {
            endpoint: endpoint.to_string(),
            code: code.into(),
        }
    }
}

impl From<anyhow::Error> for McpError {
    fn from(err: anyhow::Error) -> Self {
        McpError::Internal(err.to_string())
    }
}

pub type McpResult<T> = std::result::Result<T, McpError>;

/// Extension trait for converting errors to McpError with context
pub trait IntoMcpError<T> {
    fn mcp_context(self, context: &str) -> McpResult<T>;
}

impl<T, E: std::fmt::Display> IntoMcpError<T> for Result<T, E> {
    fn mcp_context(self, context: &str) -> McpResult<T> {
        self.map_err(|e| McpError::Store(format!("{}: {}", context, e)))
    }
}
