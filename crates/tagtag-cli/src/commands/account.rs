//! Login, logout, and registration commands.

use std::time::Instant;

use clap::Args;
use tracing::warn;

use tagtag_auth::SessionController;
use tagtag_core::error::{AppError, ErrorKind};
use tagtag_core::result::AppResult;
use tagtag_core::types::{CaptchaVerifyRequest, Credentials, RegisterRequest};

use crate::output::{self, OutputFormat};

/// Arguments for `login`
#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Username (will prompt if not provided)
    #[arg(short, long)]
    pub username: Option<String>,
    /// Password (will prompt if not provided)
    #[arg(short, long)]
    pub password: Option<String>,
    /// Solve a captcha before the first attempt
    #[arg(long)]
    pub captcha: bool,
}

/// Arguments for `register`
#[derive(Debug, Args)]
pub struct RegisterArgs {
    /// Username (will prompt if not provided)
    #[arg(short, long)]
    pub username: Option<String>,
    /// Password (will prompt if not provided)
    #[arg(short, long)]
    pub password: Option<String>,
}

/// Execute `login`
pub async fn login(
    session: &SessionController,
    args: &LoginArgs,
    format: OutputFormat,
) -> AppResult<()> {
    let username = prompt_username(args.username.as_deref())?;
    let password = match &args.password {
        Some(p) => p.clone(),
        None => dialoguer::Password::new()
            .with_prompt("Password")
            .interact()
            .map_err(|e| AppError::internal(format!("Input error: {}", e)))?,
    };

    let mut credentials = Credentials::new(username, password);
    if args.captcha {
        credentials = credentials.with_captcha(solve_captcha(session).await?);
    }

    let attempt = session.login(&credentials).await;
    let principal = match attempt {
        Err(e) if e.kind == ErrorKind::CaptchaRequired && !args.captcha => {
            output::print_warning("The server asks for a captcha");
            let token = solve_captcha(session).await?;
            session.login(&credentials.with_captcha(token)).await?
        }
        other => other?,
    };

    output::print_success(&format!(
        "Logged in as {} ({})",
        principal.display_name, principal.username
    ));
    if format == OutputFormat::Json {
        output::print_details(&[], &principal, format);
    }
    Ok(())
}

/// Execute `logout`
pub async fn logout(session: &SessionController) -> AppResult<()> {
    if let Err(e) = session.init().await {
        warn!(error = %e, "Could not restore session before logout");
    }

    let had_token = session.access_token().await.is_some();
    if let Some(notify) = session.logout().await {
        // Let the revoke call finish before the process exits.
        if let Err(e) = notify.await {
            warn!(error = %e, "Logout notify task failed");
        }
    }

    if had_token {
        output::print_success("Logged out");
    } else {
        output::print_warning("No session to log out of");
    }
    Ok(())
}

/// Execute `register`
pub async fn register(session: &SessionController, args: &RegisterArgs) -> AppResult<()> {
    let username = prompt_username(args.username.as_deref())?;
    let password = match &args.password {
        Some(p) => p.clone(),
        None => dialoguer::Password::new()
            .with_prompt("Password")
            .with_confirmation("Confirm password", "Passwords do not match")
            .interact()
            .map_err(|e| AppError::internal(format!("Input error: {}", e)))?,
    };

    session
        .register(&RegisterRequest {
            username: username.clone(),
            password,
        })
        .await?;

    output::print_success(&format!("Account '{}' created; run `tagtag login` to sign in", username));
    Ok(())
}

fn prompt_username(given: Option<&str>) -> AppResult<String> {
    match given {
        Some(u) => Ok(u.to_string()),
        None => dialoguer::Input::new()
            .with_prompt("Username")
            .interact_text()
            .map_err(|e| AppError::internal(format!("Input error: {}", e))),
    }
}

/// Walks the user through the slider captcha and returns the login captcha token.
async fn solve_captcha(session: &SessionController) -> AppResult<String> {
    let challenge = session.captcha_challenge().await?;

    output::print_kv("Challenge image", &challenge.image_url);
    output::print_kv(
        "Piece position",
        &format!("x={} y={}", challenge.piece_x, challenge.piece_y),
    );

    let started = Instant::now();
    let move_x: f64 = dialoguer::Input::new()
        .with_prompt("Slider offset")
        .interact_text()
        .map_err(|e| AppError::internal(format!("Input error: {}", e)))?;

    let verification = session
        .verify_captcha(&CaptchaVerifyRequest {
            challenge_id: challenge.challenge_id,
            piece_x: challenge.piece_x,
            move_x,
            time: started.elapsed().as_millis() as u64,
        })
        .await?;

    match verification.captcha_token {
        Some(token) if verification.passed => Ok(token),
        _ => Err(AppError::captcha_required("Captcha not passed")),
    }
}
