use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;

use super::types::WizardRequest;
use super::validation::{ValidJson, parse_id};
use super::{ApiError, ApiResponse, AppState};
use crate::domain::WizardId;
use crate::models::wizard::{Wizard, WizardInput};
use crate::services::WizardError;

impl From<WizardError> for ApiError {
    fn from(err: WizardError) -> Self {
        match err {
            WizardError::NotFound(_) | WizardError::ArtifactNotFound(_) => {
                Self::NotFound(err.to_string())
            }
            WizardError::Database(msg) => Self::internal(msg),
        }
    }
}

fn wizard_id(raw: &str) -> Result<WizardId, ApiError> {
    parse_id(raw, "wizardId").map(WizardId::new)
}

fn into_input(payload: WizardRequest) -> WizardInput {
    WizardInput {
        name: payload.name.unwrap_or_default(),
    }
}

/// GET /wizards
pub async fn list_wizards(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<Wizard>>>, ApiError> {
    let wizards = state.wizard_service.find_all().await?;
    Ok(Json(ApiResponse::success("Find All Success", wizards)))
}

/// GET /wizards/{id}
pub async fn get_wizard(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Wizard>>, ApiError> {
    let wizard = state.wizard_service.find_by_id(wizard_id(&id)?).await?;
    Ok(Json(ApiResponse::success("Find One Success", wizard)))
}

/// POST /wizards
pub async fn add_wizard(
    State(state): State<Arc<AppState>>,
    ValidJson(payload): ValidJson<WizardRequest>,
) -> Result<Json<ApiResponse<Wizard>>, ApiError> {
    let wizard = state.wizard_service.create(into_input(payload)).await?;
    Ok(Json(ApiResponse::success("Add Success", wizard)))
}

/// PUT /wizards/{id}
pub async fn update_wizard(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ValidJson(payload): ValidJson<WizardRequest>,
) -> Result<Json<ApiResponse<Wizard>>, ApiError> {
    let id = wizard_id(&id)?;
    let wizard = state
        .wizard_service
        .update(id, into_input(payload))
        .await?;
    Ok(Json(ApiResponse::success("Update Success", wizard)))
}

/// DELETE /wizards/{id}
pub async fn delete_wizard(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state.wizard_service.delete(wizard_id(&id)?).await?;
    Ok(Json(ApiResponse::message("Delete Success")))
}

/// PUT /wizards/{id}/artifacts/{artifact_id}
pub async fn assign_artifact(
    State(state): State<Arc<AppState>>,
    Path((wizard, artifact)): Path<(String, String)>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state
        .wizard_service
        .assign_artifact(wizard_id(&wizard)?, &artifact)
        .await?;
    Ok(Json(ApiResponse::message("Artifact Assignment Success")))
}
