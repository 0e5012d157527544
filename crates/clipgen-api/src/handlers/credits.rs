use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CreditsResponse {
    pub credits: i64,
}

/// Remaining credits of the caller. Unknown users have none.
pub async fn get_user_credits(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<CreditsResponse>> {
    let credits = state.users.get_credits(&user.user_id).await?;
    Ok(Json(CreditsResponse { credits }))
}
