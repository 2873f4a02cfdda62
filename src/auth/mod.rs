mod oauth_state;
mod routes;

pub use oauth_state::{PendingStates, STATE_TTL};

use anyhow::{Context, Result};
use axum::Router;
use axum::routing::get;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::{CALLBACK_PATH, Config, LOGIN_PATH};
use crate::slack::SlackClient;
use crate::store::CredentialStore;

/// Slack app settings used by the login and callback routes.
#[derive(Debug, Clone)]
pub struct OAuthSettings {
    pub authorize_url: String,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub redirect_uri: String,
    pub scopes: String,
    pub public_url: String,
}

impl OAuthSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            authorize_url: config.slack.authorize_url.clone(),
            client_id: config.slack.client_id.clone(),
            client_secret: config.slack.client_secret.clone(),
            redirect_uri: config.redirect_uri(),
            scopes: config.slack.scopes.clone(),
            public_url: config.auth_server.public_url.trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Clone)]
pub struct AuthState {
    pub store: Arc<dyn CredentialStore>,
    pub slack: Arc<SlackClient>,
    pub oauth: Arc<OAuthSettings>,
    pub pending: Arc<PendingStates>,
}

impl AuthState {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        slack: Arc<SlackClient>,
        oauth: OAuthSettings,
    ) -> Self {
        Self {
            store,
            slack,
            oauth: Arc::new(oauth),
            pending: Arc::new(PendingStates::default()),
        }
    }
}

/// OAuth routes that connect Slack workspaces. The server runs apart from the
/// MCP stdio server and writes into the same credential store the tools read.
pub fn router(state: AuthState) -> Router {
    Router::new()
        .route("/", get(routes::status))
        .route(LOGIN_PATH, get(routes::login))
        .route(CALLBACK_PATH, get(routes::callback))
        .route("/teams", get(routes::teams))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the authorization routes on `bind_address` until Ctrl-C.
pub async fn serve(state: AuthState, bind_address: &str) -> Result<()> {
    let listener = TcpListener::bind(bind_address)
        .await
        .with_context(|| format!("Failed to bind auth server to {}", bind_address))?;

    info!(
        "Slack auth server listening on http://{}; authorize at {}{}",
        listener.local_addr()?,
        state.oauth.public_url,
        LOGIN_PATH
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Slack auth server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
