//! Sign-in and session handlers.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use clipgen_models::User;
use clipgen_store::StoreError;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiJson, ApiResult};
use crate::handlers::non_blank;
use crate::metrics;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleSignInRequest {
    #[serde(default)]
    pub id_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SignInResponse {
    pub token: String,
    pub user: User,
}

/// Exchange a Google ID token for a session.
///
/// Accounts are matched by email. The first sign-in creates the account
/// keyed by the Google subject.
pub async fn google_sign_in(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<GoogleSignInRequest>,
) -> ApiResult<Json<SignInResponse>> {
    let id_token = non_blank(req.id_token.as_deref())
        .ok_or_else(|| ApiError::bad_request("idToken is required"))?;

    let claims = state.id_tokens.verify(id_token).await?;
    let email = non_blank(claims.email.as_deref())
        .ok_or_else(|| ApiError::unauthorized("Google account has no email"))?
        .to_string();
    // Accounts are matched by email, so it must be one Google has verified
    if claims.email_verified != Some(true) {
        return Err(ApiError::unauthorized("Google account email is not verified"));
    }

    let (user, created) = match state.users.find_by_email(&email).await? {
        Some(user) => (user, false),
        None => {
            let user = User::from_google(&claims.sub, &email, claims.name, claims.picture);
            match state.users.create(&user).await {
                Ok(()) => (user, true),
                // Lost a race with a concurrent first sign-in
                Err(StoreError::AlreadyExists(_)) => {
                    let existing = state
                        .users
                        .get(&claims.sub)
                        .await?
                        .ok_or_else(|| ApiError::internal("User vanished after create conflict"))?;
                    (existing, false)
                }
                Err(e) => return Err(e.into()),
            }
        }
    };

    let token = state.sessions.issue(&user.id, &user.email)?;
    metrics::record_sign_in(created);
    info!(user_id = %user.id, new_user = created, "User signed in");

    Ok(Json(SignInResponse { token, user }))
}

/// The signed-in user's record.
pub async fn get_session(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<User>> {
    let record = state
        .users
        .get(&user.user_id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Session user no longer exists"))?;
    Ok(Json(record))
}
