use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use super::Tool;
use crate::broker::Aggregator;
use crate::error::McpResult;

pub struct ListConnectedTeamsTool {
    aggregator: Arc<Aggregator>,
}

impl ListConnectedTeamsTool {
    pub fn new(aggregator: Arc<Aggregator>) -> Self {
        Self { aggregator }
    }
}

#[async_trait]
impl Tool for ListConnectedTeamsTool {
    fn description(&self) -> &str {
        "List Slack workspaces connected to this server and their team IDs"
    }

    async fn execute(&self, _params: Value) -> McpResult<String> {
        self.aggregator.list_workspaces().await
    }
}
