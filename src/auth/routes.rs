use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info, warn};

use super::AuthState;
use crate::config::{CALLBACK_PATH, LOGIN_PATH};
use crate::error::McpError;

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    code: Option<String>,
    error: Option<String>,
    state: Option<String>,
}

pub async fn status(State(state): State<AuthState>) -> Json<serde_json::Value> {
    let base = &state.oauth.public_url;
    Json(json!({
        "status": "ok",
        "message": "Slack token broker auth server",
        "endpoints": {
            "login": format!("{}{}", base, LOGIN_PATH),
            "callback": format!("{}{}", base, CALLBACK_PATH),
            "teams": format!("{}/teams", base),
        }
    }))
}

pub async fn login(State(state): State<AuthState>) -> Response {
    let Some(client_id) = state.oauth.client_id.as_deref() else {
        return not_configured();
    };

    let oauth_state = state.pending.issue().await;
    let query = match serde_urlencoded::to_string([
        ("client_id", client_id),
        ("scope", state.oauth.scopes.as_str()),
        ("redirect_uri", state.oauth.redirect_uri.as_str()),
        ("state", oauth_state.as_str()),
    ]) {
        Ok(query) => query,
        Err(e) => {
            error!("Failed to encode authorize URL: {}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, format!("Error: {}", e)).into_response();
        }
    };

    Redirect::to(&format!("{}?{}", state.oauth.authorize_url, query)).into_response()
}

pub async fn callback(
    State(state): State<AuthState>,
    Query(params): Query<CallbackParams>,
) -> Response {
    if let Some(oauth_error) = params.error {
        warn!("Slack returned OAuth error: {}", oauth_error);
        return (
            StatusCode::BAD_REQUEST,
            format!("OAuth error: {}", oauth_error),
        )
            .into_response();
    }

    let Some(code) = params.code.filter(|c| !c.is_empty()) else {
        return (StatusCode::BAD_REQUEST, "Missing authorization code").into_response();
    };

    let state_valid = match params.state.as_deref() {
        Some(value) => state.pending.consume(value).await,
        None => false,
    };
    if !state_valid {
        warn!("Rejected OAuth callback with invalid state");
        return (StatusCode::BAD_REQUEST, "Invalid or expired OAuth state").into_response();
    }

    let (Some(client_id), Some(client_secret)) = (
        state.oauth.client_id.as_deref(),
        state.oauth.client_secret.as_deref(),
    ) else {
        return not_configured();
    };

    let access = match state
        .slack
        .oauth_access(client_id, client_secret, &code, &state.oauth.redirect_uri)
        .await
    {
        Ok(access) => access,
        Err(McpError::UpstreamApi { code, .. }) => {
            error!("Slack OAuth exchange rejected: {}", code);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error: Slack OAuth error: {}", code),
            )
                .into_response();
        }
        Err(e) => {
            error!("Slack OAuth exchange failed: {}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, format!("Error: {}", e)).into_response();
        }
    };

    let saved = match state
        .store
        .upsert(&access.team.id, &access.access_token, &access.team.name)
        .await
    {
        Ok(saved) => saved,
        Err(e) => {
            error!("Failed to store workspace token: {}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, format!("Error: {}", e)).into_response();
        }
    };

    info!(team_id = %saved.team_id, "workspace connected");
    Html(success_page(&saved.team_name, &saved.team_id)).into_response()
}

pub async fn teams(State(state): State<AuthState>) -> Response {
    match state.store.list_all().await {
        Ok(credentials) => {
            let teams: Vec<_> = credentials
                .iter()
                .map(|c| {
                    json!({
                        "team_id": c.team_id,
                        "team_name": c.team_name,
                        "created_at": c.created_at.to_rfc3339(),
                    })
                })
                .collect();
            Json(json!({ "teams": teams })).into_response()
        }
        Err(e) => {
            error!("Failed to list workspaces: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Failed to fetch teams",
                    "details": e.to_string(),
                })),
            )
                .into_response()
        }
    }
}

fn not_configured() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Error: Slack OAuth is not configured (set SLACK_CLIENT_ID and SLACK_CLIENT_SECRET)",
    )
        .into_response()
}

fn success_page(team_name: &str, team_id: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head><title>Slack connected</title></head>\n<body>\n\
         <h1>Workspace connected</h1>\n\
         <p><strong>{}</strong> (team ID <code>{}</code>) is now available to the Slack tools.</p>\n\
         <p>You can close this window.</p>\n</body>\n</html>\n",
        escape_html(team_name),
        escape_html(team_id)
    )
}

fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
