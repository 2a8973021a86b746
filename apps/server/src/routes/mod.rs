//! HTTP endpoints.

pub mod coordinates;
pub mod projects;
pub mod tasks;

use axum::{
    routing::{delete, get, patch},
    Router,
};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};

/// Body returned by successful deletes.
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

/// Parses a path id. An id that is not a UUID cannot exist, so it is
/// reported as not found.
pub(crate) fn parse_id(raw: &str, entity_type: &str) -> ApiResult<Uuid> {
    raw.parse()
        .map_err(|_| ApiError::not_found(entity_type, raw))
}

/// Creates the router with every endpoint.
pub fn create_router() -> Router<AppState> {
    Router::new()
        // Coordinates
        .route(
            "/api/coordinates",
            get(coordinates::list_coordinates).post(coordinates::create_coordinate),
        )
        .route("/api/coordinates/{id}", delete(coordinates::delete_coordinate))
        // Projects
        .route(
            "/api/projects",
            get(projects::list_projects).post(projects::create_project),
        )
        .route(
            "/api/projects/{id}",
            patch(projects::update_project).delete(projects::delete_project),
        )
        // Tasks
        .route("/api/tasks", get(tasks::list_tasks).post(tasks::create_task))
        .route("/api/tasks/orphans", delete(tasks::delete_orphaned_tasks))
        .route(
            "/api/tasks/{id}",
            patch(tasks::update_task).delete(tasks::delete_task),
        )
        // Health check
        .route("/health", get(health_check))
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
