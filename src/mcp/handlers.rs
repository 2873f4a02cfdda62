use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{error, info};

use crate::broker::{Aggregator, BrokerContext};
use crate::broker::aggregator::{DEFAULT_HOURS, DEFAULT_SEARCH_COUNT, DEFAULT_SUMMARY_LIMIT};
use crate::error::McpError;
use crate::tools::{Tool, channels, search, summary, teams};

use super::types::{CallToolResult, Property, Tool as McpTool, ToolInputSchema};

pub const GET_SLACK_SUMMARY: &str = "get_slack_summary";
pub const SEARCH_SLACK_MESSAGES: &str = "search_slack_messages";
pub const LIST_SLACK_CHANNELS: &str = "list_slack_channels";
pub const LIST_CONNECTED_TEAMS: &str = "list_connected_teams";

/// Routes tool calls by name. Every failure is rendered into the result, never returned.
pub struct RequestHandler {
    tools: BTreeMap<String, Box<dyn Tool + Send + Sync>>,
}

macro_rules! register_tool {
    ($tools:expr, $name:expr, $tool:expr) => {
        let previous = $tools.insert($name.to_string(), Box::new($tool) as Box<dyn Tool + Send + Sync>);
        debug_assert!(previous.is_none(), "tool {} registered twice", $name);
    };
}

impl RequestHandler {
    pub fn new(ctx: &BrokerContext) -> Self {
        let aggregator = Arc::new(Aggregator::new(ctx));
        let mut tools: BTreeMap<String, Box<dyn Tool + Send + Sync>> = BTreeMap::new();

        register_tool!(
            tools,
            GET_SLACK_SUMMARY,
            summary::GetSlackSummaryTool::new(aggregator.clone())
        );
        register_tool!(
            tools,
            SEARCH_SLACK_MESSAGES,
            search::SearchSlackMessagesTool::new(aggregator.clone())
        );
        register_tool!(
            tools,
            LIST_SLACK_CHANNELS,
            channels::ListSlackChannelsTool::new(aggregator.clone())
        );
        register_tool!(
            tools,
            LIST_CONNECTED_TEAMS,
            teams::ListConnectedTeamsTool::new(aggregator)
        );

        Self { tools }
    }

    pub fn list_tools(&self) -> Vec<McpTool> {
        self.tools
            .iter()
            .map(|(name, tool)| self.tool_to_mcp_tool(name, tool.as_ref()))
            .collect()
    }

    pub async fn call_tool(&self, name: &str, arguments: Value) -> CallToolResult {
        let Some(tool) = self.tools.get(name) else {
            let err = McpError::NotFound(format!("Unknown tool: {}", name));
            error!("Tool call rejected: {}", err);
            return CallToolResult::error(err);
        };

        match tool.execute(arguments).await {
            Ok(text) => {
                info!(tool = %name, "tool call succeeded");
                CallToolResult::text(text)
            }
            Err(e) => {
                error!(tool = %name, "Tool execution failed: {}", e);
                CallToolResult::error(e)
            }
        }
    }

    // Helper functions for creating tool schemas
    fn create_string_prop(description: &str) -> Property {
        Property {
            property_type: "string".to_string(),
            description: Some(description.to_string()),
            default: None,
            enum_values: None,
        }
    }

    fn create_number_prop(description: &str, default: Value) -> Property {
        Property {
            property_type: "number".to_string(),
            description: Some(description.to_string()),
            default: Some(default),
            enum_values: None,
        }
    }

    fn team_id_prop() -> Property {
        Self::create_string_prop("Slack team (workspace) ID, as shown by list_connected_teams")
    }

    fn tool_to_mcp_tool(&self, name: &str, tool: &(dyn Tool + Send + Sync)) -> McpTool {
        // Create input schema based on tool name
        let (properties, required) = match name {
            GET_SLACK_SUMMARY => {
                let mut props = HashMap::new();
                props.insert("team_id".to_string(), Self::team_id_prop());
                props.insert(
                    "channel".to_string(),
                    Self::create_string_prop(
                        "Channel ID (C..., G..., D...) or channel name; omit to summarize the first public channels",
                    ),
                );
                props.insert(
                    "hours".to_string(),
                    Self::create_number_prop(
                        "How many hours back to look (default: 24)",
                        serde_json::json!(DEFAULT_HOURS as u32),
                    ),
                );
                props.insert(
                    "limit".to_string(),
                    Self::create_number_prop(
                        "Maximum number of messages to fetch (default: 100)",
                        serde_json::json!(DEFAULT_SUMMARY_LIMIT),
                    ),
                );
                (props, vec!["team_id".to_string()])
            }
            SEARCH_SLACK_MESSAGES => {
                let mut props = HashMap::new();
                props.insert("team_id".to_string(), Self::team_id_prop());
                props.insert(
                    "query".to_string(),
                    Self::create_string_prop("Slack search query"),
                );
                props.insert(
                    "count".to_string(),
                    Self::create_number_prop(
                        "Number of results to request (default: 20, at most 10 are shown)",
                        serde_json::json!(DEFAULT_SEARCH_COUNT),
                    ),
                );
                (props, vec!["team_id".to_string(), "query".to_string()])
            }
            LIST_SLACK_CHANNELS => {
                let mut props = HashMap::new();
                props.insert("team_id".to_string(), Self::team_id_prop());
                (props, vec!["team_id".to_string()])
            }
            _ => (HashMap::new(), vec![]),
        };

        McpTool {
            name: name.to_string(),
            description: tool.description().to_string(),
            input_schema: ToolInputSchema {
                schema_type: "object".to_string(),
                properties,
                required,
            },
        }
    }
}
