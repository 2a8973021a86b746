//! Repository trait definitions.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use entities::{
    Category, Coordinate, CoordinateDraft, Project, ProjectDraft, ProjectPatch, Task, TaskDraft,
    TaskPatch,
};
use uuid::Uuid;

use crate::StoreResult;

/// Filter options for listing coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoordinateFilter {
    /// Filter by category.
    pub category: Option<Category>,
}

impl CoordinateFilter {
    /// Creates an empty filter matching every coordinate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts the filter to one category.
    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    /// Returns true if the coordinate passes the filter.
    pub fn matches(&self, coordinate: &Coordinate) -> bool {
        self.category.is_none_or(|c| coordinate.category == c)
    }
}

/// Filter options for listing tasks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskFilter {
    /// Filter by owning project.
    pub project_id: Option<Uuid>,
}

impl TaskFilter {
    /// Creates an empty filter matching every task.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts the filter to tasks of one project.
    pub fn with_project(mut self, project_id: Uuid) -> Self {
        self.project_id = Some(project_id);
        self
    }

    /// Returns true if the task passes the filter.
    pub fn matches(&self, task: &Task) -> bool {
        self.project_id.is_none_or(|id| task.project_id == id)
    }
}

/// Durable CRUD over coordinates.
#[async_trait]
pub trait CoordinateRepository: Send + Sync {
    /// Lists coordinates matching the filter, newest first.
    ///
    /// An uninitialized store yields an empty list.
    async fn list_coordinates(&self, filter: CoordinateFilter) -> StoreResult<Vec<Coordinate>>;

    /// Validates and persists a draft, returning the stored coordinate.
    async fn create_coordinate(&self, draft: CoordinateDraft) -> StoreResult<Coordinate>;

    /// Deletes a coordinate. Returns false if no coordinate had that id.
    async fn delete_coordinate(&self, id: Uuid) -> StoreResult<bool>;

    /// Lists every coordinate, newest first.
    async fn list_all_coordinates(&self) -> StoreResult<Vec<Coordinate>> {
        self.list_coordinates(CoordinateFilter::default()).await
    }

    /// Lists the coordinates of one category, newest first.
    async fn list_by_category(&self, category: Category) -> StoreResult<Vec<Coordinate>> {
        self.list_coordinates(CoordinateFilter::new().with_category(category))
            .await
    }
}

/// Durable CRUD over projects and their tasks.
///
/// Projects are returned flat (`tasks` empty); joining is left to callers.
/// Deleting a project never deletes its tasks.
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// Lists projects, newest first.
    async fn list_projects(&self) -> StoreResult<Vec<Project>>;

    /// Validates and persists a project draft.
    async fn create_project(&self, draft: ProjectDraft) -> StoreResult<Project>;

    /// Applies a partial update. Fails with `NotFound` for an unknown id.
    async fn update_project(&self, id: Uuid, patch: ProjectPatch) -> StoreResult<Project>;

    /// Deletes a project. Returns false if no project had that id.
    async fn delete_project(&self, id: Uuid) -> StoreResult<bool>;

    /// Lists tasks matching the filter, oldest first.
    async fn list_tasks(&self, filter: TaskFilter) -> StoreResult<Vec<Task>>;

    /// Persists a task draft. Fails with `NotFound` if the project does not exist.
    async fn create_task(&self, draft: TaskDraft) -> StoreResult<Task>;

    /// Applies a partial update. Fails with `NotFound` for an unknown id.
    async fn update_task(&self, id: Uuid, patch: TaskPatch) -> StoreResult<Task>;

    /// Deletes a task. Returns false if no task had that id.
    async fn delete_task(&self, id: Uuid) -> StoreResult<bool>;

    /// Deletes every task whose project no longer exists, returning the count.
    async fn delete_orphaned_tasks(&self) -> StoreResult<u64>;
}

/// Repository handles shared by one process or session.
#[derive(Clone)]
pub struct Repositories {
    pub coordinates: Arc<dyn CoordinateRepository>,
    pub projects: Arc<dyn ProjectRepository>,
}

impl Repositories {
    /// Uses one backend for both entity kinds.
    pub fn from_shared<S>(store: Arc<S>) -> Self
    where
        S: CoordinateRepository + ProjectRepository + 'static,
    {
        Self {
            coordinates: store.clone(),
            projects: store,
        }
    }
}

/// Sorts items held in insertion order newest first, ties by latest insertion.
pub(crate) fn newest_first<T, F>(mut items: Vec<T>, created_at: F) -> Vec<T>
where
    F: Fn(&T) -> DateTime<Utc>,
{
    items.reverse();
    items.sort_by_key(|item| std::cmp::Reverse(created_at(item)));
    items
}

/// Sorts items held in insertion order oldest first, ties by earliest insertion.
pub(crate) fn oldest_first<T, F>(mut items: Vec<T>, created_at: F) -> Vec<T>
where
    F: Fn(&T) -> DateTime<Utc>,
{
    items.sort_by_key(|item| created_at(item));
    items
}
