use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Uniform Slack Web API response wrapper.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    pub ok: bool,
    pub error: Option<String>,
    #[serde(flatten)]
    pub payload: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlackChannel {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub is_archived: bool,
    pub num_members: Option<i32>,
    pub topic: Option<ChannelText>,
    pub purpose: Option<ChannelText>,
}

/// Topic or purpose of a channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelText {
    #[serde(default)]
    pub value: String,
}

impl SlackChannel {
    pub fn topic(&self) -> &str {
        self.topic.as_ref().map(|t| t.value.as_str()).unwrap_or("")
    }

    pub fn purpose(&self) -> &str {
        self.purpose.as_ref().map(|p| p.value.as_str()).unwrap_or("")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlackMessage {
    pub ts: String,
    pub user: Option<String>,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchMatch {
    pub ts: String,
    pub user: Option<String>,
    pub username: Option<String>,
    #[serde(default)]
    pub text: String,
    pub channel: Option<MatchChannel>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchChannel {
    pub id: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseMetadata {
    pub next_cursor: Option<String>,
}

/// Payload of `conversations.list`.
#[derive(Debug, Clone, Deserialize)]
pub struct ConversationsList {
    #[serde(default)]
    pub channels: Vec<SlackChannel>,
    #[serde(default)]
    pub response_metadata: Option<ResponseMetadata>,
}

impl ConversationsList {
    pub fn next_cursor(&self) -> Option<&str> {
        self.response_metadata
            .as_ref()
            .and_then(|m| m.next_cursor.as_deref())
            .filter(|c| !c.is_empty())
    }
}

/// Payload of `conversations.history`.
#[derive(Debug, Clone, Deserialize)]
pub struct ConversationsHistory {
    #[serde(default)]
    pub messages: Vec<SlackMessage>,
}

/// Payload of `search.messages`.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchMessages {
    pub messages: SearchResults,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResults {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub matches: Vec<SearchMatch>,
}

/// Payload of `oauth.v2.access`.
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthAccess {
    pub access_token: String,
    pub team: OAuthTeam,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OAuthTeam {
    pub id: String,
    pub name: String,
}
