//! Session inspection commands.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use tagtag_auth::{SessionController, SessionState};
use tagtag_core::error::AppError;
use tagtag_core::result::AppResult;

use crate::output::{self, OutputFormat};

/// Session status view
#[derive(Debug, Serialize)]
struct StatusView {
    state: SessionState,
    username: Option<String>,
    obtained_at: Option<DateTime<Utc>>,
    expires_at: Option<DateTime<Utc>>,
    has_refresh_token: bool,
}

/// Execute `whoami`
pub async fn whoami(session: &SessionController, format: OutputFormat) -> AppResult<()> {
    let principal = super::require_session(session).await?;

    let roles: Vec<&str> = principal.roles.iter().map(String::as_str).collect();
    let pairs = [
        ("ID", principal.id.to_string()),
        ("Username", principal.username.clone()),
        ("Display name", principal.display_name.clone()),
        ("Email", output::or_dash(principal.profile.email.as_deref())),
        ("Roles", roles.join(", ")),
        ("Access codes", principal.access_codes.len().to_string()),
    ];
    output::print_details(&pairs, &principal, format);
    Ok(())
}

/// Execute `status`
pub async fn status(session: &SessionController, format: OutputFormat) -> AppResult<()> {
    if let Err(e) = session.init().await {
        warn!(error = %e, "Session could not be restored");
    }

    let token = session.token().await;
    let view = StatusView {
        state: session.state(),
        username: session.principal().await.map(|p| p.username),
        obtained_at: token.as_ref().map(|t| t.obtained_at),
        expires_at: token.as_ref().and_then(|t| t.expires_at()),
        has_refresh_token: token
            .as_ref()
            .is_some_and(|t| t.pair.refresh_token.is_some()),
    };

    let pairs = [
        ("State", view.state.to_string()),
        ("User", output::or_dash(view.username.as_deref())),
        ("Token obtained", format_instant(view.obtained_at)),
        ("Token expires", format_instant(view.expires_at)),
        (
            "Refresh token",
            if view.has_refresh_token { "yes" } else { "no" }.to_string(),
        ),
    ];
    output::print_details(&pairs, &view, format);
    Ok(())
}

/// Execute `refresh`
pub async fn refresh(session: &SessionController) -> AppResult<()> {
    super::require_session(session).await?;

    let current = session
        .access_token()
        .await
        .ok_or_else(|| AppError::unauthenticated("Not logged in"))?;
    session.handle_token_expired(&current).await?;

    let expires = session.token().await.and_then(|t| t.expires_at());
    output::print_success(&format!(
        "Access token refreshed (expires {})",
        format_instant(expires)
    ));
    Ok(())
}

fn format_instant(instant: Option<DateTime<Utc>>) -> String {
    instant
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "-".to_string())
}
