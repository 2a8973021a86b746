//! Repository client for a remote atlas server.

use std::time::Duration;

use async_trait::async_trait;
use entities::{
    Coordinate, CoordinateDraft, Project, ProjectDraft, ProjectPatch, Task, TaskDraft, TaskPatch,
};
use reqwest::{RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use tracing::debug;
use uuid::Uuid;

use crate::{
    CoordinateFilter, CoordinateRepository, ProjectRepository, StoreError, StoreResult,
    TaskFilter,
};

/// Error body returned by the server
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

#[derive(Debug, Deserialize)]
struct SuccessBody {
    success: bool,
}

#[derive(Debug, Deserialize)]
struct RemovedBody {
    removed: u64,
}

/// Store that forwards every operation to an atlas server over HTTP.
#[derive(Debug, Clone)]
pub struct HttpStore {
    /// Server URL without a trailing slash
    base_url: String,
    http_client: reqwest::Client,
}

impl HttpStore {
    /// Creates a client for the server at `base_url`.
    ///
    /// `timeout` bounds each request, connect included.
    pub fn new(base_url: &str, timeout: Duration) -> StoreResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::StoreUnavailable(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client,
        })
    }

    /// Returns the server URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    /// Sends a request and decodes a JSON response.
    ///
    /// A 404 becomes `NotFound` for the given entity.
    async fn call<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        entity_type: &'static str,
        id: impl ToString,
    ) -> StoreResult<T> {
        let response = request
            .send()
            .await
            .map_err(|e| StoreError::StoreUnavailable(e.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| StoreError::StoreUnavailable(e.to_string()))?;

        debug!(status = %status, "Atlas server responded");

        if status.is_success() {
            return Ok(serde_json::from_slice(&body)?);
        }

        Err(status_error(status, &body, entity_type, id))
    }

    async fn delete(&self, path: String, entity_type: &'static str, id: Uuid) -> StoreResult<bool> {
        let result: StoreResult<SuccessBody> = self
            .call(self.http_client.delete(self.url(&path)), entity_type, id)
            .await;

        match result {
            Ok(body) => Ok(body.success),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// Maps a non-success response to a store error.
fn status_error(
    status: StatusCode,
    body: &[u8],
    entity_type: &'static str,
    id: impl ToString,
) -> StoreError {
    let message = serde_json::from_slice::<ErrorBody>(body)
        .map(|b| b.error.message)
        .unwrap_or_else(|_| String::from_utf8_lossy(body).into_owned());

    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            StoreError::ValidationFailed(message)
        }
        StatusCode::NOT_FOUND => StoreError::not_found(entity_type, id),
        _ => StoreError::StoreUnavailable(format!("server returned status {status}: {message}")),
    }
}

#[async_trait]
impl CoordinateRepository for HttpStore {
    async fn list_coordinates(&self, filter: CoordinateFilter) -> StoreResult<Vec<Coordinate>> {
        let mut request = self.http_client.get(self.url("/coordinates"));
        if let Some(category) = filter.category {
            request = request.query(&[("category", category.as_str())]);
        }
        self.call(request, "Coordinate", "*").await
    }

    async fn create_coordinate(&self, draft: CoordinateDraft) -> StoreResult<Coordinate> {
        StoreError::check_required(&draft.missing_fields())?;
        let request = self.http_client.post(self.url("/coordinates")).json(&draft);
        self.call(request, "Coordinate", "*").await
    }

    async fn delete_coordinate(&self, id: Uuid) -> StoreResult<bool> {
        self.delete(format!("/coordinates/{id}"), "Coordinate", id)
            .await
    }
}

#[async_trait]
impl ProjectRepository for HttpStore {
    async fn list_projects(&self) -> StoreResult<Vec<Project>> {
        self.call(self.http_client.get(self.url("/projects")), "Project", "*")
            .await
    }

    async fn create_project(&self, draft: ProjectDraft) -> StoreResult<Project> {
        StoreError::check_required(&draft.missing_fields())?;
        let request = self.http_client.post(self.url("/projects")).json(&draft);
        self.call(request, "Project", "*").await
    }

    async fn update_project(&self, id: Uuid, patch: ProjectPatch) -> StoreResult<Project> {
        let request = self
            .http_client
            .patch(self.url(&format!("/projects/{id}")))
            .json(&patch);
        self.call(request, "Project", id).await
    }

    async fn delete_project(&self, id: Uuid) -> StoreResult<bool> {
        self.delete(format!("/projects/{id}"), "Project", id).await
    }

    async fn list_tasks(&self, filter: TaskFilter) -> StoreResult<Vec<Task>> {
        let mut request = self.http_client.get(self.url("/tasks"));
        if let Some(project_id) = filter.project_id {
            request = request.query(&[("projectId", project_id.to_string())]);
        }
        self.call(request, "Task", "*").await
    }

    async fn create_task(&self, draft: TaskDraft) -> StoreResult<Task> {
        StoreError::check_required(&draft.missing_fields())?;
        let project_id = draft.project_id;
        let request = self.http_client.post(self.url("/tasks")).json(&draft);
        self.call(request, "Project", project_id).await
    }

    async fn update_task(&self, id: Uuid, patch: TaskPatch) -> StoreResult<Task> {
        let request = self
            .http_client
            .patch(self.url(&format!("/tasks/{id}")))
            .json(&patch);
        self.call(request, "Task", id).await
    }

    async fn delete_task(&self, id: Uuid) -> StoreResult<bool> {
        self.delete(format!("/tasks/{id}"), "Task", id).await
    }

    async fn delete_orphaned_tasks(&self) -> StoreResult<u64> {
        let body: RemovedBody = self
            .call(
                self.http_client.delete(self.url("/tasks/orphans")),
                "Task",
                "*",
            )
            .await?;
        Ok(body.removed)
    }
}
