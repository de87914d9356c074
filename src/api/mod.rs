use axum::{
    Router,
    body::Body,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Request},
    middleware,
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::StorageBackend;

mod actuator;
mod artifacts;
pub mod auth;
mod error;
mod types;
mod users;
mod validation;
mod wizards;

pub use crate::state::AppState;
pub use error::ApiError;
pub use types::*;

pub fn router(state: Arc<AppState>) -> Router {
    let config = state.config.clone();

    let api_router = create_api_router();
    let app = if config.base_path().is_empty() {
        Router::new().merge(api_router)
    } else {
        Router::new().nest(config.base_path(), api_router)
    };

    let mut app = app.nest("/actuator", create_actuator_router());

    if config.storage.backend == StorageBackend::Local {
        app = app.nest_service("/images", ServeDir::new(&config.storage.images_path));
    }

    let cors_origins = &config.server.cors_allowed_origins;
    let cors_layer = if cors_origins.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    app.layer(middleware::from_fn_with_state(
        state.clone(),
        auth::auth_middleware,
    ))
    .layer(cors_layer.allow_methods(Any).allow_headers(Any))
    .layer(TraceLayer::new_for_http().make_span_with(request_span))
    .with_state(state)
}

/// Request span; `user_id` is filled in by the auth middleware once a bearer
/// token has been verified.
fn request_span(req: &Request<Body>) -> tracing::Span {
    tracing::info_span!(
        "request",
        method = %req.method(),
        path = %req.uri(),
        user_id = tracing::field::Empty,
    )
}

fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/artifacts", get(artifacts::list_artifacts))
        .route("/artifacts", post(artifacts::add_artifact))
        .route("/artifacts/summary", get(artifacts::summarize_artifacts))
        .route("/artifacts/search", post(artifacts::search_artifacts))
        .route(
            "/artifacts/images",
            post(artifacts::upload_image)
                .layer(DefaultBodyLimit::max(artifacts::MAX_IMAGE_BYTES)),
        )
        .route("/artifacts/{id}", get(artifacts::get_artifact))
        .route("/artifacts/{id}", put(artifacts::update_artifact))
        .route("/artifacts/{id}", delete(artifacts::delete_artifact))
        .route("/wizards", get(wizards::list_wizards))
        .route("/wizards", post(wizards::add_wizard))
        .route("/wizards/{id}", get(wizards::get_wizard))
        .route("/wizards/{id}", put(wizards::update_wizard))
        .route("/wizards/{id}", delete(wizards::delete_wizard))
        .route(
            "/wizards/{id}/artifacts/{artifact_id}",
            put(wizards::assign_artifact),
        )
        .route("/users/login", post(auth::login))
        .route("/users", get(users::list_users))
        .route("/users", post(users::add_user))
        .route("/users/{id}", get(users::get_user))
        .route("/users/{id}", put(users::update_user))
        .route("/users/{id}", delete(users::delete_user))
}

fn create_actuator_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(actuator::health))
        .route("/info", get(actuator::info))
        .route("/config", get(actuator::config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_span_declares_user_id() {
        let req = Request::builder()
            .uri("/api/v1/wizards")
            .body(Body::empty())
            .unwrap();

        let span = request_span(&req);
        assert!(span.field("user_id").is_some());
    }
}
