//! Authentication route handlers.
//!
//! Login checks credentials against the backend, then merges the guest cart
//! and wishlist into the user's rows before responding.

use axum::{Json, extract::State, http::StatusCode};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{Result, add_breadcrumb};
use crate::middleware::RequireAuth;
use crate::models::CurrentUser;
use crate::services::auth::AuthService;
use crate::services::{LoginSummary, Shopper};
use crate::state::AppState;

/// Login request body.
#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login response body.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: CurrentUser,
    pub merge: LoginSummary,
    pub synced: bool,
}

/// Handle login.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    mut shopper: Shopper,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let password = SecretString::from(body.password);
    let user = AuthService::new(state.remote().as_ref())
        .login(&body.username, &password)
        .await?;

    let merge = shopper.sign_in(user.clone()).await?;
    add_breadcrumb("auth", "Signed in", Some(&[("user", user.name.as_str())]));

    let response = LoginResponse {
        user,
        merge,
        synced: shopper.synced(),
    };
    Ok(Json(response))
}

/// Handle logout.
#[instrument(skip_all)]
pub async fn logout(mut shopper: Shopper) -> Result<StatusCode> {
    shopper.sign_out().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// The signed-in user.
pub async fn me(RequireAuth(user): RequireAuth) -> Json<CurrentUser> {
    Json(user)
}
