use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use super::Tool;
use crate::broker::Aggregator;
use crate::error::McpResult;
use crate::utils::parse_params;

pub struct ListSlackChannelsTool {
    aggregator: Arc<Aggregator>,
}

impl ListSlackChannelsTool {
    pub fn new(aggregator: Arc<Aggregator>) -> Self {
        Self { aggregator }
    }
}

#[derive(Debug, Deserialize)]
struct ListSlackChannelsParams {
    team_id: String,
}

#[async_trait]
impl Tool for ListSlackChannelsTool {
    fn description(&self) -> &str {
        "List public and private channels of a workspace"
    }

    async fn execute(&self, params: Value) -> McpResult<String> {
        let params: ListSlackChannelsParams = parse_params(params)?;
        self.aggregator.list_channels(params.team_id.trim()).await
    }
}
