//! Auth routes: register, login, logout.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use sweet_delights_core::UserId;

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::models::user::User;
use crate::services::AuthService;
use crate::state::AppState;

/// Credentials for register and login.
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

/// The session user returned after register/login.
#[derive(Debug, Serialize)]
pub struct SessionUserResponse {
    pub id: UserId,
    pub email: String,
    pub is_admin: bool,
}

impl From<&User> for SessionUserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.to_string(),
            is_admin: user.is_admin,
        }
    }
}

async fn start_session(session: &Session, user: &User) -> Result<()> {
    let current = CurrentUser {
        id: user.id,
        email: user.email.clone(),
        is_admin: user.is_admin,
    };
    set_current_user(session, &current)
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    Ok(())
}

/// Create an account and log in.
///
/// POST /api/auth/register
///
/// # Errors
///
/// Returns `AppError` on invalid input or a duplicate email.
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<CredentialsRequest>,
) -> Result<Json<SessionUserResponse>> {
    let auth = AuthService::new(state.pool());
    let user = auth.register(&req.email, &req.password).await?;

    tracing::info!(user_id = %user.id, "user registered");
    start_session(&session, &user).await?;

    Ok(Json(SessionUserResponse::from(&user)))
}

/// Log in with email and password.
///
/// POST /api/auth/login
///
/// # Errors
///
/// Returns `AppError` on bad credentials.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<CredentialsRequest>,
) -> Result<Json<SessionUserResponse>> {
    let auth = AuthService::new(state.pool());
    let user = auth.login(&req.email, &req.password).await?;

    // A fresh session id on login keeps fixation attacks out
    session
        .cycle_id()
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;
    start_session(&session, &user).await?;

    Ok(Json(SessionUserResponse::from(&user)))
}

/// End the session.
///
/// POST /api/auth/logout
///
/// # Errors
///
/// Returns `AppError` if the session store fails.
pub async fn logout(session: Session) -> Result<Json<serde_json::Value>> {
    clear_current_user(&session)
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;
    clear_sentry_user();

    Ok(Json(serde_json::json!({"ok": true})))
}
