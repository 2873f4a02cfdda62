use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use super::Tool;
use crate::broker::{Aggregator, ChannelRef, SummaryRequest};
use crate::broker::aggregator::{DEFAULT_HOURS, DEFAULT_SUMMARY_LIMIT};
use crate::error::McpResult;
use crate::utils::{lenient_number, non_empty, parse_params, positive_count_or, positive_or};

pub struct GetSlackSummaryTool {
    aggregator: Arc<Aggregator>,
}

impl GetSlackSummaryTool {
    pub fn new(aggregator: Arc<Aggregator>) -> Self {
        Self { aggregator }
    }
}

#[derive(Debug, Deserialize)]
struct GetSlackSummaryParams {
    team_id: String,
    #[serde(default)]
    channel: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    hours: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    limit: Option<f64>,
}

impl GetSlackSummaryParams {
    fn into_request(self) -> SummaryRequest {
        SummaryRequest {
            team_id: self.team_id.trim().to_string(),
            channel: non_empty(self.channel).map(|c| ChannelRef::parse(&c)),
            hours: positive_or(self.hours, DEFAULT_HOURS),
            limit: positive_count_or(self.limit, DEFAULT_SUMMARY_LIMIT),
        }
    }
}

#[async_trait]
impl Tool for GetSlackSummaryTool {
    fn description(&self) -> &str {
        "Summarize recent messages of a channel, or of the first few public channels"
    }

    async fn execute(&self, params: Value) -> McpResult<String> {
        let params: GetSlackSummaryParams = parse_params(params)?;
        self.aggregator.summarize(&params.into_request()).await
    }
}
