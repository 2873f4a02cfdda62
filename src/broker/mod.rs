pub mod aggregator;
mod channel_ref;
mod context;
pub mod format;
mod resolver;

pub use aggregator::{Aggregator, ChannelFetch, ChannelTarget, SummaryRequest};
pub use channel_ref::ChannelRef;
pub use context::{BrokerContext, BrokerSettings};
pub use resolver::TokenResolver;

/// Reduced projection of a Slack channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    pub id: String,
    pub name: String,
    pub is_private: bool,
    pub is_archived: bool,
    pub member_count: Option<u32>,
    pub topic: String,
    pub purpose: String,
}

/// A history message tagged with the channel it was fetched from.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelMessage {
    pub ts: String,
    pub user: Option<String>,
    pub text: String,
    pub channel_id: String,
    pub channel_name: String,
}

impl ChannelMessage {
    /// Numeric value of the Slack timestamp; unparseable stamps sort last.
    pub fn sort_key(&self) -> f64 {
        self.ts.parse::<f64>().unwrap_or(f64::NEG_INFINITY)
    }
}
