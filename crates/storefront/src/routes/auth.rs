//! Authentication route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::auth::{clear_current_user, set_current_user};
use crate::models::SessionUser;
use crate::services::auth::{AuthError, AuthService};
use crate::state::AppState;

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
}

/// Signup page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/signup.html")]
pub struct SignupTemplate {
    pub error: Option<String>,
}

/// Login form body.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Signup form body.
#[derive(Debug, Deserialize)]
pub struct SignupForm {
    pub email: String,
    pub password: String,
}

/// Display the login page.
pub async fn login_page() -> LoginTemplate {
    LoginTemplate { error: None }
}

/// Display the signup page.
pub async fn signup_page() -> SignupTemplate {
    SignupTemplate { error: None }
}

/// Handle a login attempt.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let service = AuthService::new(state.db());

    let user = match service.login(&form.email, &form.password).await {
        Ok(user) => user,
        Err(AuthError::InvalidCredentials | AuthError::InvalidEmail(_)) => {
            return Ok(LoginTemplate {
                error: Some("Invalid email or password".to_string()),
            }
            .into_response());
        }
        Err(e) => return Err(e.into()),
    };

    start_session(&session, &user.email, user.user_id().as_str()).await?;
    tracing::info!(user_id = %user.id, "user logged in");

    Ok(Redirect::to("/").into_response())
}

/// Handle a signup attempt.
pub async fn signup(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<SignupForm>,
) -> Result<Response> {
    let service = AuthService::new(state.db());

    let user = match service.register(&form.email, &form.password).await {
        Ok(user) => user,
        Err(e @ (AuthError::InvalidEmail(_) | AuthError::WeakPassword(_))) => {
            return Ok(SignupTemplate {
                error: Some(signup_error_message(&e)),
            }
            .into_response());
        }
        Err(e @ AuthError::UserAlreadyExists) => {
            return Ok(SignupTemplate {
                error: Some(signup_error_message(&e)),
            }
            .into_response());
        }
        Err(e) => return Err(e.into()),
    };

    start_session(&session, &user.email, user.user_id().as_str()).await?;
    tracing::info!(user_id = %user.id, "user signed up");

    Ok(Redirect::to("/").into_response())
}

/// Handle logout.
pub async fn logout(session: Session) -> Result<Redirect> {
    clear_current_user(&session)
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;
    clear_sentry_user();

    Ok(Redirect::to("/"))
}

/// Store the user in the session and tag Sentry events with their id.
async fn start_session(session: &Session, email: &str, user_id: &str) -> Result<()> {
    let email = clementine_core::Email::parse(email)
        .map_err(|e| AppError::Internal(format!("stored email invalid: {e}")))?;
    let session_user = SessionUser {
        id: clementine_core::UserId::new(user_id.to_string()),
        email,
    };

    set_current_user(session, &session_user)
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;
    set_sentry_user(&user_id.to_string(), Some(session_user.email.as_str()));

    Ok(())
}

/// User-facing message for a rejected signup.
fn signup_error_message(err: &AuthError) -> String {
    match err {
        AuthError::InvalidEmail(_) => "Please enter a valid email address".to_string(),
        AuthError::WeakPassword(msg) => msg.clone(),
        AuthError::UserAlreadyExists => "An account with this email already exists".to_string(),
        _ => "Signup failed".to_string(),
    }
}
