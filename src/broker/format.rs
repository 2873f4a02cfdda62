use chrono::{DateTime, FixedOffset, TimeZone, Utc};

use super::{Channel, ChannelMessage};
use crate::slack::types::SearchMatch;
use crate::store::WorkspaceCredential;

pub const SUMMARY_TEXT_LIMIT: usize = 100;
pub const SEARCH_TEXT_LIMIT: usize = 150;
pub const MESSAGES_PER_CHANNEL: usize = 10;
pub const SEARCH_RESULTS_SHOWN: usize = 10;
pub const ELLIPSIS: &str = "...";

const UNKNOWN_AUTHOR: &str = "Unknown";

/// Cut `text` to `max` characters, marking the cut with [`ELLIPSIS`].
pub fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((byte_idx, _)) => format!("{}{}", &text[..byte_idx], ELLIPSIS),
        None => text.to_string(),
    }
}

fn parse_ts(ts: &str, offset: &FixedOffset) -> Option<DateTime<FixedOffset>> {
    let value = ts.parse::<f64>().ok()?;
    let seconds = value.trunc() as i64;
    let nanos = ((value - value.trunc()) * 1_000_000_000.0) as u32;
    Utc.timestamp_opt(seconds, nanos)
        .single()
        .map(|dt| dt.with_timezone(offset))
}

/// `3:45:12 PM`
pub fn time_of_day(ts: &str, offset: &FixedOffset) -> String {
    parse_ts(ts, offset)
        .map(|dt| dt.format("%-I:%M:%S %p").to_string())
        .unwrap_or_else(|| ts.to_string())
}

/// `1/15/2024, 3:45:12 PM`
pub fn date_time(ts: &str, offset: &FixedOffset) -> String {
    parse_ts(ts, offset)
        .map(|dt| dt.format("%-m/%-d/%Y, %-I:%M:%S %p").to_string())
        .unwrap_or_else(|| ts.to_string())
}

/// `1/15/2024`
pub fn date(dt: &DateTime<Utc>, offset: &FixedOffset) -> String {
    dt.with_timezone(offset).format("%-m/%-d/%Y").to_string()
}

// Whole numbers print without a fraction while they fit an i64 exactly
fn format_hours(hours: f64) -> String {
    if hours.fract() == 0.0 && hours.abs() < 1e15 {
        format!("{}", hours as i64)
    } else {
        format!("{}", hours)
    }
}

fn plural(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{} {}", count, singular)
    } else {
        format!("{} {}", count, plural)
    }
}

fn summary_line(msg: &ChannelMessage, offset: &FixedOffset) -> String {
    format!(
        "• [{}] {}: {}",
        time_of_day(&msg.ts, offset),
        msg.user.as_deref().unwrap_or(UNKNOWN_AUTHOR),
        truncate(&msg.text, SUMMARY_TEXT_LIMIT)
    )
}

fn push_block(out: &mut String, messages: &[&ChannelMessage], offset: &FixedOffset) {
    for msg in messages.iter().take(MESSAGES_PER_CHANNEL) {
        out.push_str(&summary_line(msg, offset));
        out.push('\n');
    }
    if messages.len() > MESSAGES_PER_CHANNEL {
        out.push_str(&format!(
            "  ...and {} more\n",
            messages.len() - MESSAGES_PER_CHANNEL
        ));
    }
}

/// Render a merged, newest-first message list. Like every renderer here it is
/// a pure function; dates use the US English layout (`1/15/2024, 3:45:12 PM`)
/// at the given offset.
///
/// `scope` names the channel the caller asked for, if any. Messages are
/// grouped under per-channel headers only when more than one channel
/// contributed; groups are ordered by their newest message.
pub fn format_summary(
    messages: &[ChannelMessage],
    hours: f64,
    scope: Option<&str>,
    offset: &FixedOffset,
) -> String {
    let visible: Vec<&ChannelMessage> = messages
        .iter()
        .filter(|m| !m.text.trim().is_empty())
        .collect();
    let window = format_hours(hours);

    if visible.is_empty() {
        return match scope {
            Some(channel) => format!(
                "No messages found in #{} in the last {} hours.",
                channel, window
            ),
            None => format!("No messages found in the last {} hours.", window),
        };
    }

    let mut groups: Vec<(&str, Vec<&ChannelMessage>)> = Vec::new();
    for msg in &visible {
        match groups.iter_mut().find(|(id, _)| *id == msg.channel_id) {
            Some((_, group)) => group.push(*msg),
            None => groups.push((msg.channel_id.as_str(), vec![*msg])),
        }
    }

    let mut out = String::new();

    if groups.len() == 1 {
        let channel = scope.unwrap_or(visible[0].channel_name.as_str());
        out.push_str(&format!(
            "Slack summary for #{} (last {} hours, {}):\n\n",
            channel,
            window,
            plural(visible.len(), "message", "messages")
        ));
        push_block(&mut out, &visible, offset);
    } else {
        out.push_str(&format!(
            "Slack summary for the last {} hours ({} across {} channels):\n",
            window,
            plural(visible.len(), "message", "messages"),
            groups.len()
        ));
        for (_, group) in &groups {
            out.push_str(&format!(
                "\n#{} ({}):\n",
                group[0].channel_name,
                plural(group.len(), "message", "messages")
            ));
            push_block(&mut out, group, offset);
        }
    }

    out.trim_end().to_string()
}

/// Render search hits as a numbered list of at most [`SEARCH_RESULTS_SHOWN`] entries.
pub fn format_search(
    query: &str,
    total: u64,
    matches: &[SearchMatch],
    offset: &FixedOffset,
) -> String {
    if matches.is_empty() {
        return format!("No messages found matching \"{}\".", query);
    }

    let total = total.max(matches.len() as u64);
    let shown = matches.len().min(SEARCH_RESULTS_SHOWN);
    let mut out = format!(
        "Found {} for \"{}\" (showing {}):\n",
        plural(total as usize, "result", "results"),
        query,
        shown
    );

    for (i, m) in matches.iter().take(SEARCH_RESULTS_SHOWN).enumerate() {
        let channel = m
            .channel
            .as_ref()
            .map(|c| c.name.as_deref().unwrap_or(&c.id))
            .unwrap_or("unknown");
        let author = m
            .user
            .as_deref()
            .or(m.username.as_deref())
            .unwrap_or(UNKNOWN_AUTHOR);

        out.push_str(&format!(
            "\n{}. #{} | {} | {}\n   {}\n",
            i + 1,
            channel,
            author,
            date_time(&m.ts, offset),
            truncate(&m.text, SEARCH_TEXT_LIMIT)
        ));
    }

    out.trim_end().to_string()
}

pub fn format_channels(channels: &[Channel]) -> String {
    if channels.is_empty() {
        return "No channels found.".to_string();
    }

    let mut out = format!("Found {}:\n\n", plural(channels.len(), "channel", "channels"));

    for channel in channels {
        let marker = if channel.is_private { "🔒" } else { "#" };
        let visibility = if channel.is_private { "private" } else { "public" };
        let archived = if channel.is_archived { ", archived" } else { "" };
        out.push_str(&format!(
            "• {}{} [{}{}]",
            marker, channel.name, visibility, archived
        ));

        if let Some(count) = channel.member_count
            && count > 0
        {
            out.push_str(&format!(" - {}", plural(count as usize, "member", "members")));
        }
        if !channel.topic.trim().is_empty() {
            out.push_str(&format!(" - Topic: {}", channel.topic));
        }
        out.push('\n');
    }

    out.trim_end().to_string()
}

pub fn format_workspaces(
    workspaces: &[WorkspaceCredential],
    auth_url: &str,
    offset: &FixedOffset,
) -> String {
    let header = format!("Connected Slack workspaces ({}):", workspaces.len());

    if workspaces.is_empty() {
        return format!(
            "{}\n\nNo Slack workspaces are connected yet. Authorize one at {} and use its team ID with the other tools.",
            header, auth_url
        );
    }

    let mut out = format!("{}\n\n", header);
    for workspace in workspaces {
        out.push_str(&format!(
            "• {} ({}) - connected {}\n",
            workspace.team_name,
            workspace.team_id,
            date(&workspace.created_at, offset)
        ));
    }

    out.trim_end().to_string()
}
