use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;

use super::types::{CreateUserRequest, UpdateUserRequest};
use super::validation::{ValidJson, parse_id};
use super::{ApiError, ApiResponse, AppState};
use crate::domain::UserId;
use crate::models::user::{User, UserInput, UserUpdate};
use crate::services::UserError;

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound(_) | UserError::UsernameNotFound(_) => {
                Self::NotFound(err.to_string())
            }
            UserError::Database(msg) => Self::internal(msg),
        }
    }
}

fn user_id(raw: &str) -> Result<UserId, ApiError> {
    parse_id(raw, "userId").map(UserId::new)
}

/// GET /users
pub async fn list_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<User>>>, ApiError> {
    let users = state.user_service.find_all().await?;
    Ok(Json(ApiResponse::success("Find All Success", users)))
}

/// GET /users/{id}
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let user = state.user_service.find_by_id(user_id(&id)?).await?;
    Ok(Json(ApiResponse::success("Find One Success", user)))
}

/// POST /users
pub async fn add_user(
    State(state): State<Arc<AppState>>,
    ValidJson(payload): ValidJson<CreateUserRequest>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let input = UserInput {
        username: payload.username.unwrap_or_default(),
        password: payload.password.unwrap_or_default(),
        enabled: payload.enabled,
        roles: payload.roles.unwrap_or_default(),
    };

    let user = state.user_service.save(input).await?;
    Ok(Json(ApiResponse::success("Add Success", user)))
}

/// PUT /users/{id}
///
/// Passwords cannot be changed here.
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ValidJson(payload): ValidJson<UpdateUserRequest>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let id = user_id(&id)?;
    let update = UserUpdate {
        username: payload.username.unwrap_or_default(),
        enabled: payload.enabled,
        roles: payload.roles.unwrap_or_default(),
    };

    let user = state.user_service.update(id, update).await?;
    Ok(Json(ApiResponse::success("Update Success", user)))
}

/// DELETE /users/{id}
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state.user_service.delete(user_id(&id)?).await?;
    Ok(Json(ApiResponse::message("Delete Success")))
}
