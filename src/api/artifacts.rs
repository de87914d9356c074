use axum::{
    Json,
    extract::{Multipart, Path, Query, State, multipart::MultipartRejection},
};
use std::collections::HashMap;
use std::sync::Arc;

use super::types::{ArtifactRequest, ImageUploadParams, PageParams};
use super::validation::ValidJson;
use super::{ApiError, ApiResponse, AppState};
use crate::clients::chat::ChatError;
use crate::clients::image_storage::StorageError;
use crate::domain::{Page, PageRequest};
use crate::models::artifact::{Artifact, ArtifactCriteria, ArtifactInput};
use crate::services::ArtifactError;

/// Largest accepted image upload.
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

impl From<ArtifactError> for ApiError {
    fn from(err: ArtifactError) -> Self {
        match err {
            ArtifactError::NotFound(_) => Self::NotFound(err.to_string()),
            ArtifactError::Chat(chat) => chat.into(),
            ArtifactError::IdGeneration(_)
            | ArtifactError::Serialization(_)
            | ArtifactError::Database(_) => Self::internal(err.to_string()),
        }
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        let status = match &err {
            ChatError::Upstream { status, .. } => Some(*status),
            ChatError::Transport(_) | ChatError::NoChoices => None,
        };
        Self::ExternalApiError {
            service: "Chat",
            status,
            message: err.to_string(),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidContainer(_) => Self::validation("containerName", err.to_string()),
            StorageError::Upstream { status, message } => Self::ExternalApiError {
                service: "Blob storage",
                status: Some(status),
                message,
            },
            StorageError::Transport(message) => Self::ExternalApiError {
                service: "Blob storage",
                status: None,
                message,
            },
            StorageError::Io(e) => Self::internal(format!("Failed to store image: {e}")),
        }
    }
}

fn into_input(payload: ArtifactRequest) -> ArtifactInput {
    ArtifactInput {
        name: payload.name.unwrap_or_default(),
        description: payload.description.unwrap_or_default(),
        image_url: payload.image_url.unwrap_or_default(),
    }
}

/// GET /artifacts/{id}
pub async fn get_artifact(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Artifact>>, ApiError> {
    let artifact = state.artifact_service.find_by_id(&id).await?;
    Ok(Json(ApiResponse::success("Find One Success", artifact)))
}

/// GET /artifacts?page=&size=
pub async fn list_artifacts(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PageParams>,
) -> Result<Json<ApiResponse<Page<Artifact>>>, ApiError> {
    let page = state
        .artifact_service
        .find_all_paged(PageRequest::from(params))
        .await?;
    Ok(Json(ApiResponse::success("Find All Success", page)))
}

/// POST /artifacts
pub async fn add_artifact(
    State(state): State<Arc<AppState>>,
    ValidJson(payload): ValidJson<ArtifactRequest>,
) -> Result<Json<ApiResponse<Artifact>>, ApiError> {
    let artifact = state.artifact_service.save(into_input(payload)).await?;
    Ok(Json(ApiResponse::success("Add Success", artifact)))
}

/// PUT /artifacts/{id}
///
/// The path id wins over any id in the body.
pub async fn update_artifact(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ValidJson(payload): ValidJson<ArtifactRequest>,
) -> Result<Json<ApiResponse<Artifact>>, ApiError> {
    let artifact = state
        .artifact_service
        .update(&id, into_input(payload))
        .await?;
    Ok(Json(ApiResponse::success("Update Success", artifact)))
}

/// DELETE /artifacts/{id}
pub async fn delete_artifact(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state.artifact_service.delete(&id).await?;
    Ok(Json(ApiResponse::message("Delete Success")))
}

/// GET /artifacts/summary
pub async fn summarize_artifacts(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    let artifacts = state.artifact_service.find_all().await?;
    let summary = state.artifact_service.summarize(&artifacts).await?;
    Ok(Json(ApiResponse::success("Summarize Success", summary)))
}

/// POST /artifacts/search?page=&size=
///
/// The body is a flat string map; recognised keys are `id`, `name`,
/// `description` and `ownerName`.
pub async fn search_artifacts(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PageParams>,
    body: Result<Json<HashMap<String, String>>, axum::extract::rejection::JsonRejection>,
) -> Result<Json<ApiResponse<Page<Artifact>>>, ApiError> {
    let Json(map) = body.map_err(|rejection| ApiError::validation("body", rejection.body_text()))?;
    let criteria = ArtifactCriteria::from_map(&map);

    let page = state
        .artifact_service
        .find_by_criteria(&criteria, PageRequest::from(params))
        .await?;
    Ok(Json(ApiResponse::success("Search Success", page)))
}

/// POST /artifacts/images?containerName=
/// Multipart upload with the image in the `file` part
pub async fn upload_image(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ImageUploadParams>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    let container = params
        .container_name
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| ApiError::validation("containerName", "containerName is required."))?;

    let mut multipart =
        multipart.map_err(|rejection| ApiError::validation("file", rejection.body_text()))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation("file", e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or("image").to_string();
        let content_type = field.content_type().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::validation("file", e.body_text()))?;

        let url = state
            .image_storage
            .upload(&container, &filename, content_type.as_deref(), data.to_vec())
            .await?;

        tracing::info!(container = %container, filename = %filename, "Image uploaded");
        return Ok(Json(ApiResponse::success("Image Upload Success", url)));
    }

    Err(ApiError::validation("file", "file is required."))
}
