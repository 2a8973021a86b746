//! In-memory store implementation for testing.

use async_trait::async_trait;
use entities::{
    Coordinate, CoordinateDraft, Project, ProjectDraft, ProjectPatch, Task, TaskDraft, TaskPatch,
};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    traits::{newest_first, oldest_first},
    CoordinateFilter, CoordinateRepository, ProjectRepository, StoreError, StoreResult,
    TaskFilter,
};

/// In-memory store for testing purposes.
///
/// Collections are kept in insertion order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    coordinates: RwLock<Vec<Coordinate>>,
    projects: RwLock<Vec<Project>>,
    tasks: RwLock<Vec<Task>>,
}

impl MemoryStore {
    /// Creates a new in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CoordinateRepository for MemoryStore {
    async fn list_coordinates(&self, filter: CoordinateFilter) -> StoreResult<Vec<Coordinate>> {
        let coordinates = self.coordinates.read().await;
        let result: Vec<Coordinate> = coordinates
            .iter()
            .filter(|c| filter.matches(c))
            .cloned()
            .collect();
        Ok(newest_first(result, |c| c.created_at))
    }

    async fn create_coordinate(&self, draft: CoordinateDraft) -> StoreResult<Coordinate> {
        StoreError::check_required(&draft.missing_fields())?;
        let mut coordinates = self.coordinates.write().await;
        let coordinate = draft.into_coordinate();
        coordinates.push(coordinate.clone());
        Ok(coordinate)
    }

    async fn delete_coordinate(&self, id: Uuid) -> StoreResult<bool> {
        let mut coordinates = self.coordinates.write().await;
        let before = coordinates.len();
        coordinates.retain(|c| c.id != id);
        Ok(coordinates.len() != before)
    }
}

#[async_trait]
impl ProjectRepository for MemoryStore {
    async fn list_projects(&self) -> StoreResult<Vec<Project>> {
        let projects = self.projects.read().await.clone();
        Ok(newest_first(projects, |p| p.created_at))
    }

    async fn create_project(&self, draft: ProjectDraft) -> StoreResult<Project> {
        StoreError::check_required(&draft.missing_fields())?;
        let mut projects = self.projects.write().await;
        let project = draft.into_project();
        projects.push(project.clone());
        Ok(project)
    }

    async fn update_project(&self, id: Uuid, patch: ProjectPatch) -> StoreResult<Project> {
        let mut projects = self.projects.write().await;
        let project = projects
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| StoreError::not_found("Project", id))?;
        patch.apply(project);
        Ok(project.clone())
    }

    async fn delete_project(&self, id: Uuid) -> StoreResult<bool> {
        let mut projects = self.projects.write().await;
        let before = projects.len();
        projects.retain(|p| p.id != id);
        Ok(projects.len() != before)
    }

    async fn list_tasks(&self, filter: TaskFilter) -> StoreResult<Vec<Task>> {
        let tasks = self.tasks.read().await;
        let result: Vec<Task> = tasks.iter().filter(|t| filter.matches(t)).cloned().collect();
        Ok(oldest_first(result, |t| t.created_at))
    }

    async fn create_task(&self, draft: TaskDraft) -> StoreResult<Task> {
        StoreError::check_required(&draft.missing_fields())?;
        let projects = self.projects.read().await;
        if !projects.iter().any(|p| p.id == draft.project_id) {
            return Err(StoreError::not_found("Project", draft.project_id));
        }
        let mut tasks = self.tasks.write().await;
        let task = draft.into_task();
        tasks.push(task.clone());
        Ok(task)
    }

    async fn update_task(&self, id: Uuid, patch: TaskPatch) -> StoreResult<Task> {
        let mut tasks = self.tasks.write().await;
        let task = tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| StoreError::not_found("Task", id))?;
        patch.apply(task);
        Ok(task.clone())
    }

    async fn delete_task(&self, id: Uuid) -> StoreResult<bool> {
        let mut tasks = self.tasks.write().await;
        let before = tasks.len();
        tasks.retain(|t| t.id != id);
        Ok(tasks.len() != before)
    }

    async fn delete_orphaned_tasks(&self) -> StoreResult<u64> {
        let projects = self.projects.read().await;
        let mut tasks = self.tasks.write().await;
        let before = tasks.len();
        tasks.retain(|t| projects.iter().any(|p| p.id == t.project_id));
        Ok((before - tasks.len()) as u64)
    }
}
