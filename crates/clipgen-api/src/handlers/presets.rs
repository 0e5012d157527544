//! Preset handlers.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use clipgen_models::Preset;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiJson, ApiResult};
use crate::handlers::non_blank;
use crate::metrics;
use crate::security::{sanitize_text, MAX_DESCRIPTION_LENGTH, MAX_NAME_LENGTH};
use crate::state::AppState;

const REQUIRED_FIELDS_MESSAGE: &str = "Name, compositionId and inputProps are required";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePresetRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub composition_id: Option<String>,
    #[serde(default)]
    pub input_props: Option<Value>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreatePresetResponse {
    pub success: bool,
    pub preset: Preset,
    pub message: String,
}

pub async fn create_preset(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<CreatePresetRequest>,
) -> ApiResult<Json<CreatePresetResponse>> {
    let name = non_blank(req.name.as_deref());
    let composition_id = non_blank(req.composition_id.as_deref());
    // `Option<Value>` deserializes an explicit null as None
    let (Some(name), Some(composition_id), Some(input_props)) =
        (name, composition_id, req.input_props)
    else {
        return Err(ApiError::bad_request(REQUIRED_FIELDS_MESSAGE));
    };

    if !input_props.is_object() {
        return Err(ApiError::bad_request("inputProps must be a JSON object"));
    }

    let description = req
        .description
        .as_deref()
        .map(|d| sanitize_text(d, MAX_DESCRIPTION_LENGTH));
    let preset = Preset::new(
        &user.user_id,
        composition_id,
        sanitize_text(name, MAX_NAME_LENGTH),
        description,
        input_props,
    );
    state.presets.create(&preset).await?;

    metrics::record_preset_created();
    info!(preset_id = %preset.id.as_str(), user_id = %user.user_id, "Preset created");

    Ok(Json(CreatePresetResponse {
        success: true,
        preset,
        message: "Preset created successfully".to_string(),
    }))
}

#[derive(Debug, Serialize)]
pub struct ListPresetsResponse {
    pub presets: Vec<Preset>,
}

pub async fn list_presets(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<ListPresetsResponse>> {
    let presets = state.presets.list_by_user(&user.user_id).await?;
    Ok(Json(ListPresetsResponse { presets }))
}
