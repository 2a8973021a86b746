//! Repository doubles for cache tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use atlas_store::{
    CoordinateFilter, CoordinateRepository, MemoryStore, ProjectRepository, StoreError,
    StoreResult, TaskFilter,
};
use entities::{
    Coordinate, CoordinateDraft, Project, ProjectDraft, ProjectPatch, Task, TaskDraft, TaskPatch,
};
use uuid::Uuid;

/// Memory store that can be switched offline and counts every call.
#[derive(Debug, Default)]
pub(crate) struct FailingStore {
    inner: MemoryStore,
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl FailingStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    fn check(&self) -> StoreResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            Err(StoreError::StoreUnavailable("offline".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl CoordinateRepository for FailingStore {
    async fn list_coordinates(&self, filter: CoordinateFilter) -> StoreResult<Vec<Coordinate>> {
        self.check()?;
        self.inner.list_coordinates(filter).await
    }

    async fn create_coordinate(&self, draft: CoordinateDraft) -> StoreResult<Coordinate> {
        self.check()?;
        self.inner.create_coordinate(draft).await
    }

    async fn delete_coordinate(&self, id: Uuid) -> StoreResult<bool> {
        self.check()?;
        self.inner.delete_coordinate(id).await
    }
}

#[async_trait]
impl ProjectRepository for FailingStore {
    async fn list_projects(&self) -> StoreResult<Vec<Project>> {
        self.check()?;
        self.inner.list_projects().await
    }

    async fn create_project(&self, draft: ProjectDraft) -> StoreResult<Project> {
        self.check()?;
        self.inner.create_project(draft).await
    }

    async fn update_project(&self, id: Uuid, patch: ProjectPatch) -> StoreResult<Project> {
        self.check()?;
        self.inner.update_project(id, patch).await
    }

    async fn delete_project(&self, id: Uuid) -> StoreResult<bool> {
        self.check()?;
        self.inner.delete_project(id).await
    }

    async fn list_tasks(&self, filter: TaskFilter) -> StoreResult<Vec<Task>> {
        self.check()?;
        self.inner.list_tasks(filter).await
    }

    async fn create_task(&self, draft: TaskDraft) -> StoreResult<Task> {
        self.check()?;
        self.inner.create_task(draft).await
    }

    async fn update_task(&self, id: Uuid, patch: TaskPatch) -> StoreResult<Task> {
        self.check()?;
        self.inner.update_task(id, patch).await
    }

    async fn delete_task(&self, id: Uuid) -> StoreResult<bool> {
        self.check()?;
        self.inner.delete_task(id).await
    }

    async fn delete_orphaned_tasks(&self) -> StoreResult<u64> {
        self.check()?;
        self.inner.delete_orphaned_tasks().await
    }
}

/// Repository that never answers.
#[derive(Debug)]
pub(crate) struct HangingStore;

#[async_trait]
impl CoordinateRepository for HangingStore {
    async fn list_coordinates(&self, _filter: CoordinateFilter) -> StoreResult<Vec<Coordinate>> {
        std::future::pending().await
    }

    async fn create_coordinate(&self, _draft: CoordinateDraft) -> StoreResult<Coordinate> {
        std::future::pending().await
    }

    async fn delete_coordinate(&self, _id: Uuid) -> StoreResult<bool> {
        std::future::pending().await
    }
}

#[async_trait]
impl ProjectRepository for HangingStore {
    async fn list_projects(&self) -> StoreResult<Vec<Project>> {
        std::future::pending().await
    }

    async fn create_project(&self, _draft: ProjectDraft) -> StoreResult<Project> {
        std::future::pending().await
    }

    async fn update_project(&self, _id: Uuid, _patch: ProjectPatch) -> StoreResult<Project> {
        std::future::pending().await
    }

    async fn delete_project(&self, _id: Uuid) -> StoreResult<bool> {
        std::future::pending().await
    }

    async fn list_tasks(&self, _filter: TaskFilter) -> StoreResult<Vec<Task>> {
        std::future::pending().await
    }

    async fn create_task(&self, _draft: TaskDraft) -> StoreResult<Task> {
        std::future::pending().await
    }

    async fn update_task(&self, _id: Uuid, _patch: TaskPatch) -> StoreResult<Task> {
        std::future::pending().await
    }

    async fn delete_task(&self, _id: Uuid) -> StoreResult<bool> {
        std::future::pending().await
    }

    async fn delete_orphaned_tasks(&self) -> StoreResult<u64> {
        std::future::pending().await
    }
}
