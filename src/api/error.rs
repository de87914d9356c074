use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use super::ApiResponse;

pub const BASIC_CHALLENGE: &str = r#"Basic realm="Realm""#;

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),

    /// Field name to message.
    ValidationError(BTreeMap<String, String>),

    Unauthorized {
        message: &'static str,
        detail: String,
        basic_challenge: bool,
    },

    Forbidden(String),

    /// A collaborator answered with an error. `status` is passed through when known.
    ExternalApiError {
        service: &'static str,
        status: Option<u16>,
        message: String,
    },

    InternalError(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(msg) => write!(f, "Not found: {msg}"),
            Self::ValidationError(fields) => write!(f, "Validation error: {fields:?}"),
            Self::Unauthorized { message, detail, .. } => {
                write!(f, "Unauthorized: {message} ({detail})")
            }
            Self::Forbidden(msg) => write!(f, "Forbidden: {msg}"),
            Self::ExternalApiError {
                service, message, ..
            } => write!(f, "{service} error: {message}"),
            Self::InternalError(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

pub const MSG_VALIDATION: &str = "provided argument are invalid, see data for details.";
pub const MSG_FORBIDDEN: &str = "No permission";
pub const MSG_UPSTREAM: &str = "A rest client error occurs, see data for details.";
pub const MSG_INTERNAL: &str = "A server internal error occurs.";

pub const MSG_MISSING_CREDENTIALS: &str = "Login credentials are missing";
pub const MSG_BAD_CREDENTIALS: &str = "username or password is incorrect";
pub const MSG_ACCOUNT_DISABLED: &str = "User account is abnormal";
pub const MSG_INVALID_TOKEN: &str =
    "The access token provided is expired, revoked, malformed, or invalid for other reasons.";

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut challenge = false;

        let (status, message, data) = match self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg, Value::Null),
            Self::ValidationError(fields) => (
                StatusCode::BAD_REQUEST,
                MSG_VALIDATION.to_string(),
                serde_json::to_value(fields).unwrap_or(Value::Null),
            ),
            Self::Unauthorized {
                message,
                detail,
                basic_challenge,
            } => {
                challenge = basic_challenge;
                (
                    StatusCode::UNAUTHORIZED,
                    message.to_string(),
                    Value::String(detail),
                )
            }
            Self::Forbidden(detail) => (
                StatusCode::FORBIDDEN,
                MSG_FORBIDDEN.to_string(),
                Value::String(detail),
            ),
            Self::ExternalApiError {
                service,
                status,
                message,
            } => {
                tracing::warn!("{} API error: {}", service, message);
                let status = status
                    .and_then(|s| StatusCode::from_u16(s).ok())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                (status, MSG_UPSTREAM.to_string(), Value::String(message))
            }
            Self::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    MSG_INTERNAL.to_string(),
                    Value::String(msg),
                )
            }
        };

        let body = ApiResponse::error(status, message, Some(data));
        let mut response = (status, Json(body)).into_response();
        if challenge {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static(BASIC_CHALLENGE),
            );
        }
        response
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::InternalError(err.to_string())
    }
}

impl ApiError {
    pub fn validation(field: impl Into<String>, msg: impl Into<String>) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(field.into(), msg.into());
        Self::ValidationError(fields)
    }

    pub fn forbidden(detail: impl Into<String>) -> Self {
        Self::Forbidden(detail.into())
    }

    pub fn invalid_token(detail: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: MSG_INVALID_TOKEN,
            detail: detail.into(),
            basic_challenge: false,
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::InternalError(msg.into())
    }
}
