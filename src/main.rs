use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::{error, info};

use mcp_slack_broker::auth::{self, AuthState, OAuthSettings};
use mcp_slack_broker::broker::{BrokerContext, BrokerSettings};
use mcp_slack_broker::config::Config;
use mcp_slack_broker::mcp::{McpServer, RequestHandler};
use mcp_slack_broker::slack::SlackClient;
use mcp_slack_broker::store::{CredentialStore, SqliteCredentialStore};

/// Slack token broker: one MCP server for many Slack workspaces.
#[derive(Parser)]
#[command(name = "mcp-slack-broker", version, about)]
struct Cli {
    /// Configuration file (TOML, YAML or JSON).
    #[arg(short, long, global = true, env = "MCP_SLACK_CONFIG")]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the MCP server over stdio (default).
    Serve,

    /// Run the OAuth server that connects workspaces.
    AuthServer,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    init_logging()?;

    let cli = Cli::parse();

    // All broker processes share one token database
    let data_path = std::env::var("DATA_PATH").unwrap_or_else(|_| {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
        format!("{}/.mcp-slack-broker", home)
    });

    let config = Config::load(cli.config.as_deref(), &data_path)?;

    let store: Arc<dyn CredentialStore> = Arc::new(
        SqliteCredentialStore::new(&config.store.database_path)
            .await
            .with_context(|| {
                format!(
                    "Failed to open credential store at {}",
                    config.store.database_path
                )
            })?,
    );
    let slack = Arc::new(SlackClient::new(&config)?);

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => run_mcp(&config, store, slack).await,
        Commands::AuthServer => {
            let state = AuthState::new(store, slack, OAuthSettings::from_config(&config));
            auth::serve(state, &config.auth_server.bind_address).await
        }
    }
}

async fn run_mcp(
    config: &Config,
    store: Arc<dyn CredentialStore>,
    slack: Arc<SlackClient>,
) -> Result<()> {
    let ctx = BrokerContext::new(store, slack, BrokerSettings::from_config(config)?);
    let server = McpServer::new(RequestHandler::new(&ctx));

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                error!("MCP server error: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl-C, shutting down");
        }
    }

    Ok(())
}

fn init_logging() -> Result<()> {
    // Support both LOG_LEVEL and RUST_LOG environment variables
    let filter = if let Ok(rust_log) = std::env::var("RUST_LOG") {
        tracing_subscriber::EnvFilter::try_new(rust_log)
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"))
    } else if let Ok(log_level) = std::env::var("LOG_LEVEL") {
        let level_str = match log_level.to_lowercase().as_str() {
            "trace" => "trace",
            "debug" => "debug",
            "info" => "info",
            "warn" | "warning" => "warn",
            "error" => "error",
            _ => "warn",
        };
        tracing_subscriber::EnvFilter::new(level_str)
    } else {
        tracing_subscriber::EnvFilter::new("warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr) // stdout carries the MCP protocol
        .compact()
        .with_target(false)
        .init();

    Ok(())
}
