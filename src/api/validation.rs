use axum::{
    Json,
    extract::{FromRequest, Request},
};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;

use super::ApiError;
use super::types::{ArtifactRequest, CreateUserRequest, UpdateUserRequest, WizardRequest};

/// Collected per-field validation failures.
#[derive(Debug, Default)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    /// Records `"{field} is required."` when `value` is missing or blank.
    pub fn require(&mut self, field: &str, value: Option<&String>) {
        if value.is_none_or(|v| v.trim().is_empty()) {
            self.0
                .insert(field.to_string(), format!("{field} is required."));
        }
    }

    pub fn into_result(self) -> Result<(), ApiError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(ApiError::ValidationError(self.0))
        }
    }
}

/// Request bodies that can check their own required fields.
pub trait Validate {
    fn validate(&self, errors: &mut FieldErrors);
}

/// JSON body that has been parsed and validated.
///
/// Malformed JSON is reported as a validation error on `body` so every
/// rejection goes through the response envelope.
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::validation("body", rejection.body_text()))?;

        let mut errors = FieldErrors::default();
        value.validate(&mut errors);
        errors.into_result()?;

        Ok(Self(value))
    }
}

impl Validate for ArtifactRequest {
    fn validate(&self, errors: &mut FieldErrors) {
        errors.require("name", self.name.as_ref());
        errors.require("description", self.description.as_ref());
        errors.require("imageUrl", self.image_url.as_ref());
    }
}

impl Validate for WizardRequest {
    fn validate(&self, errors: &mut FieldErrors) {
        errors.require("name", self.name.as_ref());
    }
}

impl Validate for CreateUserRequest {
    fn validate(&self, errors: &mut FieldErrors) {
        errors.require("username", self.username.as_ref());
        errors.require("password", self.password.as_ref());
        errors.require("roles", self.roles.as_ref());
    }
}

impl Validate for UpdateUserRequest {
    fn validate(&self, errors: &mut FieldErrors) {
        errors.require("username", self.username.as_ref());
        errors.require("roles", self.roles.as_ref());
    }
}

/// Parses a numeric path id, reporting failures under `field`.
pub fn parse_id(raw: &str, field: &str) -> Result<i32, ApiError> {
    raw.parse::<i32>().map_err(|_| {
        ApiError::validation(
            field,
            format!("Invalid {field}: {raw}. ID must be an integer"),
        )
    })
}
