//! Project endpoints.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use entities::{Project, ProjectDraft, ProjectPatch};
use serde::Deserialize;
use tracing::info;

use super::{parse_id, SuccessResponse};
use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub added_by: String,
}

impl From<CreateProjectRequest> for ProjectDraft {
    fn from(request: CreateProjectRequest) -> Self {
        let mut draft = ProjectDraft::new(request.title, request.added_by);
        draft.description = request.description.filter(|d| !d.trim().is_empty());
        draft
    }
}

/// Lists projects newest first. Tasks are listed separately.
pub async fn list_projects(State(state): State<AppState>) -> ApiResult<Json<Vec<Project>>> {
    Ok(Json(state.repositories.projects.list_projects().await?))
}

/// Creates a project.
pub async fn create_project(
    State(state): State<AppState>,
    payload: Result<Json<CreateProjectRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Project>)> {
    let Json(request) = payload?;

    let project = state
        .repositories
        .projects
        .create_project(request.into())
        .await?;
    info!(id = %project.id, title = %project.title, "Project created");

    Ok((StatusCode::CREATED, Json(project)))
}

/// Applies a partial update to a project.
pub async fn update_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<ProjectPatch>, JsonRejection>,
) -> ApiResult<Json<Project>> {
    let id = parse_id(&id, "Project")?;
    let Json(patch) = payload?;

    let project = state.repositories.projects.update_project(id, patch).await?;
    Ok(Json(project))
}

/// Deletes a project. Its tasks are left for the orphan purge.
pub async fn delete_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SuccessResponse>> {
    let id = parse_id(&id, "Project")?;

    if state.repositories.projects.delete_project(id).await? {
        info!(id = %id, "Project deleted");
        Ok(Json(SuccessResponse::ok()))
    } else {
        Err(ApiError::not_found("Project", id))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::routes::test_support::{app, send};

    #[tokio::test]
    async fn test_project_lifecycle() {
        let app = app();

        let (status, created) = send(
            &app,
            "POST",
            "/api/projects",
            Some(json!({"title": "Railway", "description": "East line", "addedBy": "trinity"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["completed"], false);
        assert_eq!(created["tasks"], json!([]));
        let uri = format!("/api/projects/{}", created["id"].as_str().unwrap());

        let (status, updated) = send(&app, "PATCH", &uri, Some(json!({"completed": true}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["completed"], true);
        assert_eq!(updated["title"], "Railway");

        let (_, listed) = send(&app, "GET", "/api/projects", None).await;
        assert_eq!(listed, json!([updated]));

        let (status, _) = send(&app, "DELETE", &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(&app, "DELETE", &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_blank_fields_rejected() {
        let (status, error) = send(
            &app(),
            "POST",
            "/api/projects",
            Some(json!({"title": " "})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            error["error"]["message"],
            "missing required fields: title, addedBy"
        );
    }

    #[tokio::test]
    async fn test_update_unknown_project() {
        let uri = format!("/api/projects/{}", uuid::Uuid::new_v4());
        let (status, error) = send(&app(), "PATCH", &uri, Some(json!({"completed": true}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(error["error"]["code"], "not_found");
    }
}
