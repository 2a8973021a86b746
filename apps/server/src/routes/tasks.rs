//! Task endpoints.

use atlas_store::{StoreError, TaskFilter};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use entities::{Task, TaskDraft, TaskPatch};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::{parse_id, SuccessResponse};
use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskQuery {
    pub project_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub project_id: Option<Uuid>,
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Serialize)]
pub struct PurgeResponse {
    pub removed: u64,
}

/// Lists tasks oldest first, optionally of one project.
pub async fn list_tasks(
    State(state): State<AppState>,
    query: Result<Query<TaskQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Task>>> {
    let Query(query) = query?;

    let mut filter = TaskFilter::new();
    if let Some(raw) = query.project_id.as_deref().filter(|s| !s.trim().is_empty()) {
        let project_id: Uuid = raw
            .trim()
            .parse()
            .map_err(|_| ApiError::InvalidRequest(format!("invalid projectId: {raw}")))?;
        filter = filter.with_project(project_id);
    }

    Ok(Json(state.repositories.projects.list_tasks(filter).await?))
}

/// Creates a task under an existing project.
pub async fn create_task(
    State(state): State<AppState>,
    payload: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let Json(request) = payload?;
    let project_id = request
        .project_id
        .ok_or_else(|| StoreError::missing_fields(&["projectId"]))?;

    let task = state
        .repositories
        .projects
        .create_task(TaskDraft::new(project_id, request.title))
        .await?;
    info!(id = %task.id, project_id = %project_id, "Task created");

    Ok((StatusCode::CREATED, Json(task)))
}

/// Applies a partial update to a task.
pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<TaskPatch>, JsonRejection>,
) -> ApiResult<Json<Task>> {
    let id = parse_id(&id, "Task")?;
    let Json(patch) = payload?;

    Ok(Json(state.repositories.projects.update_task(id, patch).await?))
}

/// Deletes a task.
pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SuccessResponse>> {
    let id = parse_id(&id, "Task")?;

    if state.repositories.projects.delete_task(id).await? {
        info!(id = %id, "Task deleted");
        Ok(Json(SuccessResponse::ok()))
    } else {
        Err(ApiError::not_found("Task", id))
    }
}

/// Deletes tasks whose project no longer exists.
pub async fn delete_orphaned_tasks(
    State(state): State<AppState>,
) -> ApiResult<Json<PurgeResponse>> {
    let removed = state.repositories.projects.delete_orphaned_tasks().await?;
    if removed > 0 {
        info!(removed = removed, "Orphaned tasks purged");
    }
    Ok(Json(PurgeResponse { removed }))
}
