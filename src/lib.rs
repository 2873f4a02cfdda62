pub mod auth;
pub mod broker;
pub mod config;
pub mod error;
pub mod mcp;
pub mod slack;
pub mod store;
pub mod tools;
pub mod utils;

pub use config::Config;
pub use error::{McpError, McpResult};
