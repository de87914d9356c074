use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::sync::Arc;

use super::error::{MSG_ACCOUNT_DISABLED, MSG_BAD_CREDENTIALS, MSG_MISSING_CREDENTIALS};
use super::{ApiError, ApiResponse, AppState};
use crate::auth::{Decision, RouteRule, authorize, classify};
use crate::services::{AuthError, LoginResult};

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        let detail = err.to_string();
        match err {
            AuthError::MissingCredentials => Self::Unauthorized {
                message: MSG_MISSING_CREDENTIALS,
                detail,
                basic_challenge: false,
            },
            AuthError::BadCredentials => Self::Unauthorized {
                message: MSG_BAD_CREDENTIALS,
                detail,
                basic_challenge: false,
            },
            AuthError::AccountDisabled => Self::Unauthorized {
                message: MSG_ACCOUNT_DISABLED,
                detail,
                basic_challenge: false,
            },
            AuthError::InvalidToken(detail) => Self::invalid_token(detail),
            AuthError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

/// Failures at the Basic login endpoint also carry the Basic challenge.
fn with_basic_challenge(err: ApiError) -> ApiError {
    match err {
        ApiError::Unauthorized {
            message, detail, ..
        } => ApiError::Unauthorized {
            message,
            detail,
            basic_challenge: true,
        },
        other => other,
    }
}

// ============================================================================
// Middleware
// ============================================================================

/// Resolves the bearer token (if any) into a [`crate::auth::Principal`] and applies the
/// route's access rule.
///
/// A token that is present but invalid is rejected even on public routes.
/// On success the principal is stored in the request extensions.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let rule = classify(request.method(), request.uri().path(), state.base_path());

    if rule == RouteRule::BasicLogin {
        return Ok(next.run(request).await);
    }

    let principal = match extract_bearer_token(request.headers()) {
        Some(token) => Some(state.auth_service.authenticate(token)?),
        None => None,
    };

    match authorize(principal.as_ref(), rule) {
        Decision::Allow => {
            if let Some(principal) = principal {
                tracing::Span::current().record("user_id", &principal.username);
                request.extensions_mut().insert(principal);
            }
            Ok(next.run(request).await)
        }
        Decision::Unauthenticated => Err(AuthError::MissingCredentials.into()),
        Decision::Forbidden => {
            let username = principal.map(|p| p.username).unwrap_or_default();
            tracing::warn!(username = %username, path = %request.uri().path(), "Access denied");
            Err(ApiError::forbidden("Access Denied"))
        }
    }
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
}

/// Decodes `Authorization: Basic base64(username:password)`.
fn extract_basic_credentials(headers: &HeaderMap) -> Result<(String, String), AuthError> {
    let encoded = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Basic "))
        .ok_or(AuthError::MissingCredentials)?;

    let decoded = STANDARD
        .decode(encoded.trim())
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .ok_or(AuthError::BadCredentials)?;

    let (username, password) = decoded
        .split_once(':')
        .ok_or(AuthError::BadCredentials)?;

    Ok((username.to_string(), password.to_string()))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /users/login
/// Authenticate with HTTP Basic credentials, returns the account and a token
pub async fn login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<LoginResult>>, ApiError> {
    let (username, password) = extract_basic_credentials(&headers)
        .map_err(|e| with_basic_challenge(e.into()))?;

    let result = state
        .auth_service
        .login(&username, &password)
        .await
        .map_err(|e| with_basic_challenge(e.into()))?;

    Ok(Json(ApiResponse::success(
        "User Info and JSON Web Token",
        result,
    )))
}
