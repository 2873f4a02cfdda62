use chrono::{DateTime, Utc};
use futures::future::join_all;
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::format;
use super::{BrokerContext, BrokerSettings, Channel, ChannelMessage, ChannelRef, TokenResolver};
use crate::error::{IntoMcpError, McpError, McpResult};
use crate::slack::SlackClient;
use crate::slack::types::{SlackChannel, SlackMessage};
use crate::store::CredentialStore;

pub const DEFAULT_HOURS: f64 = 24.0;
pub const DEFAULT_SUMMARY_LIMIT: u32 = 100;
pub const DEFAULT_SEARCH_COUNT: u32 = 20;

/// Page size of the listing the default summary channels are picked from.
const DEFAULT_CHANNEL_PAGE: u32 = 5;
/// How many channels a summary covers when none is named.
const DEFAULT_CHANNEL_COUNT: usize = 3;
const CHANNEL_LIST_LIMIT: u32 = 100;
const RESOLVE_PAGE_SIZE: u32 = 200;
const MAX_LISTING_PAGES: usize = 50;
const MAX_SUGGESTIONS: usize = 3;

const PUBLIC_CHANNELS: &str = "public_channel";
const ALL_CHANNELS: &str = "public_channel,private_channel";

/// Parameters of a summary, already normalised to their defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRequest {
    pub team_id: String,
    pub channel: Option<ChannelRef>,
    pub hours: f64,
    pub limit: u32,
}

impl SummaryRequest {
    pub fn new(team_id: impl Into<String>) -> Self {
        Self {
            team_id: team_id.into(),
            channel: None,
            hours: DEFAULT_HOURS,
            limit: DEFAULT_SUMMARY_LIMIT,
        }
    }
}

/// A channel a summary reads history from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelTarget {
    pub id: String,
    pub name: String,
}

impl From<&SlackChannel> for ChannelTarget {
    fn from(channel: &SlackChannel) -> Self {
        Self {
            id: channel.id.clone(),
            name: channel.name.clone(),
        }
    }
}

/// Outcome of one channel's history fetch during a multi-channel summary.
#[derive(Debug, Clone)]
pub enum ChannelFetch {
    Fetched {
        channel: ChannelTarget,
        messages: Vec<SlackMessage>,
    },
    Failed {
        channel: ChannelTarget,
        reason: String,
    },
}

impl ChannelFetch {
    /// Messages this fetch contributes; a failed fetch contributes none.
    fn into_messages(self) -> Vec<ChannelMessage> {
        match self {
            ChannelFetch::Fetched { channel, messages } => tag_messages(&channel, messages),
            ChannelFetch::Failed { channel, reason } => {
                warn!(
                    channel = %channel.name,
                    "Skipping channel in summary, history fetch failed: {}",
                    reason
                );
                Vec::new()
            }
        }
    }
}

fn tag_messages(channel: &ChannelTarget, messages: Vec<SlackMessage>) -> Vec<ChannelMessage> {
    messages
        .into_iter()
        .map(|m| ChannelMessage {
            ts: m.ts,
            user: m.user,
            text: m.text,
            channel_id: channel.id.clone(),
            channel_name: channel.name.clone(),
        })
        .collect()
}

/// Fold settled fetches into one list, newest first by numeric timestamp.
pub fn merge_fetches(fetches: Vec<ChannelFetch>) -> Vec<ChannelMessage> {
    let mut merged: Vec<ChannelMessage> = fetches
        .into_iter()
        .flat_map(ChannelFetch::into_messages)
        .collect();
    sort_newest_first(&mut merged);
    merged
}

pub fn sort_newest_first(messages: &mut [ChannelMessage]) {
    messages.sort_by(|a, b| b.sort_key().total_cmp(&a.sort_key()));
}

/// Lower bound of the history window, in whole seconds.
pub fn oldest_timestamp(now: DateTime<Utc>, hours: f64) -> i64 {
    // Float-to-int casts saturate; huge windows reach back to the epoch floor
    let window_ms = (hours * 3_600_000.0) as i64;
    now.timestamp_millis()
        .saturating_sub(window_ms)
        .div_euclid(1000)
        .max(0)
}

/// Per-channel history limit when `limit` is shared by `channels` channels.
pub fn per_channel_limit(limit: u32, channels: usize) -> u32 {
    if channels == 0 {
        return limit.max(1);
    }
    (limit / channels as u32).max(1)
}

fn project_channel(channel: SlackChannel) -> Channel {
    Channel {
        topic: channel.topic().to_string(),
        purpose: channel.purpose().to_string(),
        member_count: channel
            .num_members
            .and_then(|n| u32::try_from(n).ok()),
        id: channel.id,
        name: channel.name,
        is_private: channel.is_private,
        is_archived: channel.is_archived,
    }
}

fn suggest_channels(name: &str, channels: &[SlackChannel]) -> Vec<String> {
    let matcher = SkimMatcherV2::default();
    let mut scored: Vec<(i64, &str)> = channels
        .iter()
        .filter_map(|c| {
            matcher
                .fuzzy_match(&c.name, name)
                .map(|score| (score, c.name.as_str()))
        })
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1)));
    scored
        .into_iter()
        .take(MAX_SUGGESTIONS)
        .map(|(_, name)| name.to_string())
        .collect()
}

/// The four Slack read operations, each scoped to one workspace. Resolves the
/// workspace token, fans out to the Web API, merges the results and renders
/// them through [`format`](super::format).
pub struct Aggregator {
    resolver: TokenResolver,
    store: Arc<dyn CredentialStore>,
    slack: Arc<SlackClient>,
    settings: BrokerSettings,
}

impl Aggregator {
    pub fn new(ctx: &BrokerContext) -> Self {
        Self {
            resolver: TokenResolver::new(ctx),
            store: ctx.store.clone(),
            slack: ctx.slack.clone(),
            settings: ctx.settings.clone(),
        }
    }

    pub async fn summarize(&self, request: &SummaryRequest) -> McpResult<String> {
        let token = self.resolver.resolve(&request.team_id).await?;
        let oldest = oldest_timestamp(Utc::now(), request.hours);

        let (messages, scope) = match &request.channel {
            Some(channel_ref) => {
                let target = self.resolve_channel(&token, channel_ref).await?;
                let history = self
                    .slack
                    .conversation_history(&token, &target.id, Some(oldest), request.limit)
                    .await?;

                let mut messages = tag_messages(&target, history.messages);
                sort_newest_first(&mut messages);
                (messages, Some(target.name))
            }
            None => {
                let targets = self.default_channels(&token).await?;
                let limit = per_channel_limit(request.limit, targets.len());
                debug!(
                    team_id = %request.team_id,
                    channels = targets.len(),
                    limit,
                    "fanning out summary"
                );

                let fetches = join_all(
                    targets
                        .into_iter()
                        .map(|target| self.fetch_history(&token, target, oldest, limit)),
                )
                .await;

                (merge_fetches(fetches), None)
            }
        };

        info!(
            team_id = %request.team_id,
            messages = messages.len(),
            "summary assembled"
        );

        Ok(format::format_summary(
            &messages,
            request.hours,
            scope.as_deref(),
            &self.settings.utc_offset,
        ))
    }

    pub async fn search(&self, team_id: &str, query: &str, count: u32) -> McpResult<String> {
        let token = self.resolver.resolve(team_id).await?;
        let results = self.slack.search_messages(&token, query, count).await?;

        Ok(format::format_search(
            query,
            results.messages.total,
            &results.messages.matches,
            &self.settings.utc_offset,
        ))
    }

    pub async fn list_channels(&self, team_id: &str) -> McpResult<String> {
        let token = self.resolver.resolve(team_id).await?;
        let listing = self
            .slack
            .list_conversations(&token, ALL_CHANNELS, CHANNEL_LIST_LIMIT, None, false)
            .await?;

        let channels: Vec<Channel> = listing.channels.into_iter().map(project_channel).collect();
        Ok(format::format_channels(&channels))
    }

    pub async fn list_workspaces(&self) -> McpResult<String> {
        let workspaces = self
            .store
            .list_all()
            .await
            .mcp_context("Failed to list connected workspaces")?;

        Ok(format::format_workspaces(
            &workspaces,
            &self.settings.auth_url,
            &self.settings.utc_offset,
        ))
    }

    /// First channels of the public listing.
    async fn default_channels(&self, token: &str) -> McpResult<Vec<ChannelTarget>> {
        let listing = self
            .slack
            .list_conversations(token, PUBLIC_CHANNELS, DEFAULT_CHANNEL_PAGE, None, true)
            .await?;

        Ok(listing
            .channels
            .iter()
            .take(DEFAULT_CHANNEL_COUNT)
            .map(ChannelTarget::from)
            .collect())
    }

    async fn resolve_channel(
        &self,
        token: &str,
        channel_ref: &ChannelRef,
    ) -> McpResult<ChannelTarget> {
        let name = match channel_ref {
            ChannelRef::Id(id) => {
                return Ok(ChannelTarget {
                    id: id.clone(),
                    name: id.clone(),
                });
            }
            ChannelRef::Name(name) => name,
        };

        let channels = self.all_channels(token).await?;
        if let Some(channel) = channels
            .iter()
            .find(|c| c.name.to_lowercase() == name.to_lowercase())
        {
            return Ok(ChannelTarget::from(channel));
        }

        Err(McpError::ChannelNotFound {
            channel: name.clone(),
            suggestions: suggest_channels(name, &channels),
        })
    }

    /// Every public and private channel, archived ones included, following
    /// pagination cursors. Stops at [`MAX_LISTING_PAGES`] or on a cursor seen before.
    async fn all_channels(&self, token: &str) -> McpResult<Vec<SlackChannel>> {
        let mut channels = Vec::new();
        let mut cursor: Option<String> = None;
        let mut seen = HashSet::new();

        for _ in 0..MAX_LISTING_PAGES {
            let page = self
                .slack
                .list_conversations(
                    token,
                    ALL_CHANNELS,
                    RESOLVE_PAGE_SIZE,
                    cursor.as_deref(),
                    false,
                )
                .await?;

            let next = page.next_cursor().map(str::to_string);
            channels.extend(page.channels);

            match next {
                Some(next) if seen.insert(next.clone()) => cursor = Some(next),
                Some(next) => {
                    warn!(cursor = %next, "Slack repeated a listing cursor, stopping pagination");
                    return Ok(channels);
                }
                None => return Ok(channels),
            }
        }

        warn!(
            pages = MAX_LISTING_PAGES,
            channels = channels.len(),
            "channel listing truncated at page limit"
        );
        Ok(channels)
    }

    async fn fetch_history(
        &self,
        token: &str,
        channel: ChannelTarget,
        oldest: i64,
        limit: u32,
    ) -> ChannelFetch {
        match self
            .slack
            .conversation_history(token, &channel.id, Some(oldest), limit)
            .await
        {
            Ok(history) => ChannelFetch::Fetched {
                channel,
                messages: history.messages,
            },
            Err(e) => ChannelFetch::Failed {
                channel,
                reason: e.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteCredentialStore;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use rstest::rstest;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn slack_message(ts: &str, user: &str, text: &str) -> SlackMessage {
        SlackMessage {
            ts: ts.to_string(),
            user: Some(user.to_string()),
            text: text.to_string(),
        }
    }

    fn target(id: &str, name: &str) -> ChannelTarget {
        ChannelTarget {
            id: id.to_string(),
            name: name.to_string(),
        }
    }

    async fn aggregator_for(server: &MockServer) -> Aggregator {
        let store = SqliteCredentialStore::new(":memory:").await.unwrap();
        store.upsert("T123", "xoxp-test", "Acme").await.unwrap();

        let ctx = BrokerContext::new(
            Arc::new(store),
            Arc::new(SlackClient::with_base_url(server.uri())),
            BrokerSettings::default(),
        );
        Aggregator::new(&ctx)
    }

    fn channels_body(names: &[(&str, &str)]) -> serde_json::Value {
        let channels: Vec<_> = names
            .iter()
            .map(|(id, name)| json!({"id": id, "name": name}))
            .collect();
        json!({"ok": true, "channels": channels})
    }

    fn history_body(messages: &[(&str, &str, &str)]) -> serde_json::Value {
        let messages: Vec<_> = messages
            .iter()
            .map(|(ts, user, text)| json!({"ts": ts, "user": user, "text": text}))
            .collect();
        json!({"ok": true, "messages": messages})
    }

    #[test]
    fn test_oldest_timestamp_whole_seconds() {
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        assert_eq!(oldest_timestamp(now, 24.0), now.timestamp() - 86_400);
        assert_eq!(oldest_timestamp(now, 0.5), now.timestamp() - 1_800);
    }

    #[test]
    fn test_oldest_timestamp_huge_window_does_not_overflow() {
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        assert_eq!(oldest_timestamp(now, 1e20), 0);
    }

    #[rstest]
    #[case(100, 3, 33)]
    #[case(100, 1, 100)]
    #[case(2, 3, 1)]
    #[case(10, 0, 10)]
    fn test_per_channel_limit(#[case] limit: u32, #[case] channels: usize, #[case] expected: u32) {
        assert_eq!(per_channel_limit(limit, channels), expected);
    }

    #[test]
    fn test_merge_sorts_numerically_and_drops_failures() {
        let fetches = vec![
            ChannelFetch::Fetched {
                channel: target("C1", "general"),
                messages: vec![
                    slack_message("999.5", "U1", "nine hundred"),
                    slack_message("1000.1", "U1", "one thousand"),
                ],
            },
            ChannelFetch::Failed {
                channel: target("C2", "broken"),
                reason: "channel_not_found".to_string(),
            },
            ChannelFetch::Fetched {
                channel: target("C3", "random"),
                messages: vec![slack_message("1000.05", "U2", "between")],
            },
        ];

        let merged = merge_fetches(fetches);
        let order: Vec<&str> = merged.iter().map(|m| m.ts.as_str()).collect();

        // Lexicographic order would put "999.5" first
        assert_eq!(order, vec!["1000.1", "1000.05", "999.5"]);
        assert!(merged.iter().all(|m| m.channel_id != "C2"));
        assert_eq!(merged[1].channel_name, "random");
    }

    #[test]
    fn test_suggest_channels_prefers_close_names() {
        let channels: Vec<SlackChannel> = ["general", "random", "gen-eng"]
            .iter()
            .map(|name| SlackChannel {
                id: format!("C_{}", name),
                name: name.to_string(),
                is_private: false,
                is_archived: false,
                num_members: None,
                topic: None,
                purpose: None,
            })
            .collect();

        let suggestions = suggest_channels("genrl", &channels);
        assert_eq!(suggestions.first().map(String::as_str), Some("general"));
        assert!(!suggestions.contains(&"random".to_string()));
    }

    #[tokio::test]
    async fn test_summarize_tolerates_one_failed_channel() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/conversations.list"))
            .and(query_param("limit", "5"))
            .and(query_param("exclude_archived", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(channels_body(&[
                ("C1", "general"),
                ("C2", "broken"),
                ("C3", "random"),
                ("C4", "ignored"),
            ])))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/conversations.history"))
            .and(query_param("channel", "C1"))
            .and(query_param("limit", "33"))
            .respond_with(ResponseTemplate::new(200).set_body_json(history_body(&[(
                "1705333500.000100",
                "U1",
                "from general",
            )])))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/conversations.history"))
            .and(query_param("channel", "C2"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"ok": false, "error": "not_in_channel"})),
            )
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/conversations.history"))
            .and(query_param("channel", "C3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(history_body(&[(
                "1705333512.000200",
                "U2",
                "from random",
            )])))
            .mount(&server)
            .await;

        let aggregator = aggregator_for(&server).await;
        let text = aggregator
            .summarize(&SummaryRequest::new("T123"))
            .await
            .unwrap();

        assert!(text.contains("#random (1 message)"));
        assert!(text.contains("#general (1 message)"));
        assert!(!text.contains("broken"));
        assert!(!text.contains("ignored"));
        assert!(text.find("from random").unwrap() < text.find("from general").unwrap());
    }

    #[tokio::test]
    async fn test_summarize_named_channel_case_insensitive() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/conversations.list"))
            .and(query_param("types", "public_channel,private_channel"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(channels_body(&[("C1", "general"), ("C2", "random")])),
            )
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/conversations.history"))
            .and(query_param("channel", "C1"))
            .and(query_param("limit", "100"))
            .respond_with(ResponseTemplate::new(200).set_body_json(history_body(&[(
                "1705333512.000200",
                "U1",
                "hello",
            )])))
            .expect(2)
            .mount(&server)
            .await;

        let aggregator = aggregator_for(&server).await;

        let mut request = SummaryRequest::new("T123");
        request.channel = Some(ChannelRef::parse("General"));
        let upper = aggregator.summarize(&request).await.unwrap();

        request.channel = Some(ChannelRef::parse("general"));
        let lower = aggregator.summarize(&request).await.unwrap();

        assert_eq!(upper, lower);
        assert!(upper.starts_with("Slack summary for #general"));
    }

    #[tokio::test]
    async fn test_summarize_unknown_channel_name() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/conversations.list"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(channels_body(&[("C1", "general")])),
            )
            .mount(&server)
            .await;

        let aggregator = aggregator_for(&server).await;
        let mut request = SummaryRequest::new("T123");
        request.channel = Some(ChannelRef::parse("nonexistent"));

        let err = aggregator.summarize(&request).await.unwrap_err();
        assert!(matches!(err, McpError::ChannelNotFound { .. }));
    }

    #[tokio::test]
    async fn test_resolve_channel_follows_cursor() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/conversations.list"))
            .and(query_param("cursor", "page2"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(channels_body(&[("C9", "deep-channel")])),
            )
            .with_priority(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/conversations.list"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "channels": [{"id": "C1", "name": "general"}],
                "response_metadata": {"next_cursor": "page2"}
            })))
            .with_priority(2)
            .mount(&server)
            .await;

        let aggregator = aggregator_for(&server).await;
        let resolved = aggregator
            .resolve_channel("xoxp-test", &ChannelRef::Name("Deep-Channel".to_string()))
            .await
            .unwrap();

        assert_eq!(resolved, target("C9", "deep-channel"));
    }

    #[tokio::test]
    async fn test_resolve_channel_stops_on_repeated_cursor() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/conversations.list"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "channels": [{"id": "C1", "name": "general"}],
                "response_metadata": {"next_cursor": "same"}
            })))
            .mount(&server)
            .await;

        let aggregator = aggregator_for(&server).await;
        let mut request = SummaryRequest::new("T123");
        request.channel = Some(ChannelRef::parse("nope"));

        let err = tokio::time::timeout(Duration::from_secs(3), aggregator.summarize(&request))
            .await
            .expect("listing should stop on a repeated cursor")
            .unwrap_err();

        assert!(matches!(err, McpError::ChannelNotFound { .. }));
        assert_eq!(server.received_requests().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_resolve_channel_caps_listing_pages() {
        let server = MockServer::start().await;
        let page = Arc::new(AtomicUsize::new(0));

        let counter = page.clone();
        Mock::given(method("GET"))
            .and(path("/conversations.list"))
            .respond_with(move |_: &wiremock::Request| {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                ResponseTemplate::new(200).set_body_json(json!({
                    "ok": true,
                    "channels": [{"id": format!("C{}", n), "name": format!("chan-{}", n)}],
                    "response_metadata": {"next_cursor": format!("cursor-{}", n)}
                }))
            })
            .mount(&server)
            .await;

        let aggregator = aggregator_for(&server).await;
        let err = aggregator
            .resolve_channel("xoxp-test", &ChannelRef::Name("nope".to_string()))
            .await
            .unwrap_err();

        assert!(matches!(err, McpError::ChannelNotFound { .. }));
        assert_eq!(page.load(Ordering::SeqCst), MAX_LISTING_PAGES);
    }

    #[tokio::test]
    async fn test_archived_channel_resolves_by_name() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/conversations.list"))
            .and(query_param("exclude_archived", "false"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "channels": [{"id": "C7", "name": "launch-2023", "is_archived": true}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/conversations.history"))
            .and(query_param("channel", "C7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(history_body(&[(
                "1705333500.000100",
                "U1",
                "retro notes",
            )])))
            .mount(&server)
            .await;

        let aggregator = aggregator_for(&server).await;
        let mut request = SummaryRequest::new("T123");
        request.channel = Some(ChannelRef::parse("launch-2023"));

        let text = aggregator.summarize(&request).await.unwrap();
        assert!(text.starts_with("Slack summary for #launch-2023"));
        assert!(text.contains("retro notes"));
    }

    #[tokio::test]
    async fn test_summarize_channel_id_skips_listing() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/conversations.list"))
            .respond_with(ResponseTemplate::new(200).set_body_json(channels_body(&[])))
            .expect(0)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/conversations.history"))
            .and(query_param("channel", "C024BE91L"))
            .respond_with(ResponseTemplate::new(200).set_body_json(history_body(&[])))
            .expect(1)
            .mount(&server)
            .await;

        let aggregator = aggregator_for(&server).await;
        let mut request = SummaryRequest::new("T123");
        request.channel = Some(ChannelRef::parse("C024BE91L"));

        let text = aggregator.summarize(&request).await.unwrap();
        assert_eq!(text, "No messages found in #C024BE91L in the last 24 hours.");
    }

    #[tokio::test]
    async fn test_named_channel_history_failure_propagates() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/conversations.history"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"ok": false, "error": "channel_not_found"})),
            )
            .mount(&server)
            .await;

        let aggregator = aggregator_for(&server).await;
        let mut request = SummaryRequest::new("T123");
        request.channel = Some(ChannelRef::parse("C024BE91L"));

        let err = aggregator.summarize(&request).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Slack API error from conversations.history: channel_not_found"
        );
    }

    #[tokio::test]
    async fn test_unknown_team_aborts_before_upstream_calls() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(0)
            .mount(&server)
            .await;

        let aggregator = aggregator_for(&server).await;

        let err = aggregator
            .summarize(&SummaryRequest::new("T404"))
            .await
            .unwrap_err();
        assert!(matches!(err, McpError::CredentialNotFound { .. }));

        let err = aggregator.search("T404", "deploy", 20).await.unwrap_err();
        assert!(matches!(err, McpError::CredentialNotFound { .. }));

        let err = aggregator.list_channels("T404").await.unwrap_err();
        assert!(matches!(err, McpError::CredentialNotFound { .. }));
    }

    #[tokio::test]
    async fn test_search_requests_count_sorted_by_timestamp() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search.messages"))
            .and(query_param("query", "deploy"))
            .and(query_param("count", "20"))
            .and(query_param("sort", "timestamp"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "messages": {"total": 0, "matches": []}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let aggregator = aggregator_for(&server).await;
        let text = aggregator
            .search("T123", "deploy", DEFAULT_SEARCH_COUNT)
            .await
            .unwrap();

        assert_eq!(text, "No messages found matching \"deploy\".");
    }

    #[tokio::test]
    async fn test_list_channels_projection() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/conversations.list"))
            .and(query_param("limit", "100"))
            .and(query_param("types", "public_channel,private_channel"))
            .and(query_param("exclude_archived", "false"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "channels": [
                    {
                        "id": "C1", "name": "general", "num_members": 12,
                        "topic": {"value": "All hands", "creator": "U1", "last_set": 0}
                    },
                    {"id": "G1", "name": "secret", "is_private": true},
                    {"id": "C2", "name": "old-news", "is_archived": true}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let aggregator = aggregator_for(&server).await;
        let text = aggregator.list_channels("T123").await.unwrap();

        assert!(text.contains("• #general [public] - 12 members - Topic: All hands"));
        assert!(text.contains("• 🔒secret [private]"));
        assert!(text.contains("• #old-news [public, archived]"));
    }

    #[tokio::test]
    async fn test_list_workspaces_needs_no_token() {
        let store = SqliteCredentialStore::new(":memory:").await.unwrap();
        let ctx = BrokerContext::new(
            Arc::new(store),
            Arc::new(SlackClient::with_base_url("http://127.0.0.1:9")),
            BrokerSettings::default(),
        );

        let text = Aggregator::new(&ctx).list_workspaces().await.unwrap();
        assert!(text.starts_with("Connected Slack workspaces (0):"));
    }
}
