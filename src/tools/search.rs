use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use super::Tool;
use crate::broker::Aggregator;
use crate::broker::aggregator::DEFAULT_SEARCH_COUNT;
use crate::error::McpResult;
use crate::utils::{lenient_number, parse_params, positive_count_or, require_non_empty};

pub struct SearchSlackMessagesTool {
    aggregator: Arc<Aggregator>,
}

impl SearchSlackMessagesTool {
    pub fn new(aggregator: Arc<Aggregator>) -> Self {
        Self { aggregator }
    }
}

#[derive(Debug, Deserialize)]
struct SearchSlackMessagesParams {
    team_id: String,
    query: String,
    #[serde(default, deserialize_with = "lenient_number")]
    count: Option<f64>,
}

#[async_trait]
impl Tool for SearchSlackMessagesTool {
    fn description(&self) -> &str {
        "Search messages across a workspace, newest first"
    }

    async fn execute(&self, params: Value) -> McpResult<String> {
        let params: SearchSlackMessagesParams = parse_params(params)?;
        let query = require_non_empty(params.query, "query")?;
        let count = positive_count_or(params.count, DEFAULT_SEARCH_COUNT);

        self.aggregator
            .search(params.team_id.trim(), &query, count)
            .await
    }
}
