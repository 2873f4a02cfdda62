pub mod channels;
pub mod search;
pub mod summary;
pub mod teams;

use crate::error::McpResult;
use async_trait::async_trait;
use serde_json::Value;

/// A named operation callable by the MCP client; renders its result as text.
#[async_trait]
pub trait Tool {
    fn description(&self) -> &str;
    async fn execute(&self, params: Value) -> McpResult<String>;
}
