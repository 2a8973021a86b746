//! Reactive cache of projects with their tasks joined in.

use std::{collections::HashMap, sync::Arc, time::Duration};

use atlas_store::{ProjectRepository, StoreError, TaskFilter};
use entities::{Project, ProjectDraft, ProjectPatch, Task, TaskDraft, TaskPatch};
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    state::{round_trip, StateCell},
    CacheError, CacheResult, CacheState, DEFAULT_TIMEOUT,
};

/// Attaches each task to the project it references, keeping task order.
///
/// Tasks whose project is not in `projects` are dropped.
pub fn join_tasks(mut projects: Vec<Project>, tasks: Vec<Task>) -> Vec<Project> {
    let index: HashMap<Uuid, usize> = projects
        .iter()
        .enumerate()
        .map(|(i, p)| (p.id, i))
        .collect();

    for project in &mut projects {
        project.tasks.clear();
    }

    for task in tasks {
        match index.get(&task.project_id) {
            Some(&i) => projects[i].tasks.push(task),
            None => debug!(
                task_id = %task.id,
                project_id = %task.project_id,
                "Dropping orphaned task"
            ),
        }
    }

    projects
}

/// Client-side mirror of the projects, each holding its tasks oldest first.
pub struct ProjectCache {
    repository: Option<Arc<dyn ProjectRepository>>,
    timeout: Duration,
    state: StateCell<Project>,
}

impl ProjectCache {
    /// Creates a cache over the given repository.
    pub fn new(repository: Arc<dyn ProjectRepository>) -> Self {
        Self {
            repository: Some(repository),
            timeout: DEFAULT_TIMEOUT,
            state: StateCell::new(),
        }
    }

    /// Creates a cache with no backend.
    pub fn detached() -> Self {
        Self {
            repository: None,
            timeout: DEFAULT_TIMEOUT,
            state: StateCell::new(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<CacheState<Project>> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> CacheState<Project> {
        self.state.snapshot()
    }

    pub fn entities(&self) -> Vec<Project> {
        self.state.snapshot().entities
    }

    pub fn is_loading(&self) -> bool {
        self.state.snapshot().is_loading
    }

    pub fn error(&self) -> Option<String> {
        self.state.snapshot().error
    }

    /// Returns the cached project with the given id.
    pub fn project(&self, id: Uuid) -> Option<Project> {
        self.state
            .read(|entities| entities.iter().find(|p| p.id == id).cloned())
    }

    fn repository(&self) -> CacheResult<&Arc<dyn ProjectRepository>> {
        self.repository.as_ref().ok_or_else(|| {
            let e = CacheError::from(StoreError::BackendUnconfigured);
            self.state.record_error(&e);
            e
        })
    }

    fn fail<T>(&self, e: CacheError) -> CacheResult<T> {
        self.state.record_error(&e);
        Err(e)
    }

    /// Reloads projects and tasks, then joins them.
    ///
    /// Failures are logged and recorded in `error`; the previous entities
    /// stay visible.
    pub async fn refresh(&self) {
        let Ok(repository) = self.repository() else {
            warn!("Project refresh skipped: backend is not configured");
            return;
        };

        self.state.begin_refresh();
        let result = async {
            let projects = round_trip(self.timeout, repository.list_projects()).await?;
            let tasks = round_trip(self.timeout, repository.list_tasks(TaskFilter::new())).await?;
            Ok::<_, CacheError>(join_tasks(projects, tasks))
        }
        .await;
        self.state.finish_refresh(result);
    }

    /// Creates a project and puts it at the front of the cache.
    pub async fn add_project(&self, draft: ProjectDraft) -> CacheResult<Project> {
        let repository = self.repository()?;
        self.state.clear_error();

        match round_trip(self.timeout, repository.create_project(draft)).await {
            Ok(project) => {
                info!(id = %project.id, title = %project.title, "Project added");
                let cached = project.clone();
                self.state.apply(|entities| entities.insert(0, cached));
                Ok(project)
            }
            Err(e) => self.fail(e),
        }
    }

    /// Deletes a project and drops it from the cache.
    ///
    /// The project's tasks stay in the repository until orphans are purged.
    pub async fn remove_project(&self, id: Uuid) -> CacheResult<bool> {
        let repository = self.repository()?;
        self.state.clear_error();

        match round_trip(self.timeout, repository.delete_project(id)).await {
            Ok(deleted) => {
                if deleted {
                    info!(id = %id, "Project removed");
                }
                self.state.apply(|entities| entities.retain(|p| p.id != id));
                Ok(deleted)
            }
            Err(e) => self.fail(e),
        }
    }

    /// Flips a cached project's completion.
    ///
    /// Returns `Ok(None)` without calling the repository when the project is
    /// not cached.
    pub async fn toggle_project(&self, id: Uuid) -> CacheResult<Option<Project>> {
        let Some(completed) = self.state.read(|entities| {
            entities.iter().find(|p| p.id == id).map(|p| p.completed)
        }) else {
            debug!(id = %id, "Toggle skipped: project not cached");
            return Ok(None);
        };

        let repository = self.repository()?;
        let patch = ProjectPatch::completed(!completed);

        match round_trip(self.timeout, repository.update_project(id, patch)).await {
            Ok(updated) => {
                let value = updated.completed;
                self.state.apply(|entities| {
                    if let Some(project) = entities.iter_mut().find(|p| p.id == id) {
                        project.completed = value;
                    }
                });
                Ok(self.project(id))
            }
            Err(e) => self.fail(e),
        }
    }

    /// Creates a task and appends it to its cached project.
    pub async fn add_task(&self, project_id: Uuid, title: &str) -> CacheResult<Task> {
        let repository = self.repository()?;
        self.state.clear_error();

        let draft = TaskDraft::new(project_id, title);
        match round_trip(self.timeout, repository.create_task(draft)).await {
            Ok(task) => {
                info!(id = %task.id, project_id = %project_id, "Task added");
                let cached = task.clone();
                self.state.apply(|entities| {
                    if let Some(project) = entities.iter_mut().find(|p| p.id == project_id) {
                        project.tasks.push(cached);
                    }
                });
                Ok(task)
            }
            Err(e) => self.fail(e),
        }
    }

    /// Deletes a task and drops it from its cached project.
    pub async fn remove_task(&self, task_id: Uuid, project_id: Uuid) -> CacheResult<bool> {
        let repository = self.repository()?;
        self.state.clear_error();

        match round_trip(self.timeout, repository.delete_task(task_id)).await {
            Ok(deleted) => {
                if deleted {
                    info!(id = %task_id, project_id = %project_id, "Task removed");
                }
                self.state.apply(|entities| {
                    if let Some(project) = entities.iter_mut().find(|p| p.id == project_id) {
                        project.tasks.retain(|t| t.id != task_id);
                    }
                });
                Ok(deleted)
            }
            Err(e) => self.fail(e),
        }
    }

    /// Flips a cached task's completion.
    ///
    /// Returns `Ok(None)` without calling the repository when either the
    /// project or the task is not cached.
    pub async fn toggle_task(&self, task_id: Uuid, project_id: Uuid) -> CacheResult<Option<Task>> {
        let Some(completed) = self.state.read(|entities| {
            entities
                .iter()
                .find(|p| p.id == project_id)
                .and_then(|p| p.task(task_id))
                .map(|t| t.completed)
        }) else {
            debug!(id = %task_id, project_id = %project_id, "Toggle skipped: task not cached");
            return Ok(None);
        };

        let repository = self.repository()?;
        let patch = TaskPatch::completed(!completed);

        match round_trip(self.timeout, repository.update_task(task_id, patch)).await {
            Ok(updated) => {
                let value = updated.completed;
                let mut result = None;
                self.state.apply(|entities| {
                    if let Some(task) = entities
                        .iter_mut()
                        .find(|p| p.id == project_id)
                        .and_then(|p| p.task_mut(task_id))
                    {
                        task.completed = value;
                        result = Some(task.clone());
                    }
                });
                Ok(result)
            }
            Err(e) => self.fail(e),
        }
    }

    /// Purges tasks whose project no longer exists.
    pub async fn purge_orphans(&self) -> CacheResult<u64> {
        let repository = self.repository()?;
        match round_trip(self.timeout, repository.delete_orphaned_tasks()).await {
            Ok(removed) => {
                info!(removed = removed, "Orphaned tasks purged");
                Ok(removed)
            }
            Err(e) => self.fail(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use atlas_store::MemoryStore;

    use super::*;
    use crate::testing::{FailingStore, HangingStore};

    async fn seeded() -> (Arc<FailingStore>, ProjectCache, Project, Task) {
        let store = Arc::new(FailingStore::new());
        let project = store
            .inner()
            .create_project(ProjectDraft::new("Railway", "trinity"))
            .await
            .unwrap();
        let task = store
            .inner()
            .create_task(TaskDraft::new(project.id, "Gather iron"))
            .await
            .unwrap();

        let cache = ProjectCache::new(store.clone());
        cache.refresh().await;
        (store, cache, project, task)
    }

    #[test]
    fn test_join_drops_orphans_and_keeps_order() {
        let railway = ProjectDraft::new("Railway", "trinity").into_project();
        let farm = ProjectDraft::new("Farm", "neo").into_project();
        let t1 = TaskDraft::new(railway.id, "Gather iron").into_task();
        let t2 = TaskDraft::new(farm.id, "Till soil").into_task();
        let t3 = TaskDraft::new(railway.id, "Lay tracks").into_task();
        let orphan = TaskDraft::new(Uuid::new_v4(), "Lost").into_task();

        let joined = join_tasks(
            vec![railway.clone(), farm.clone()],
            vec![t1.clone(), t2.clone(), orphan, t3.clone()],
        );

        assert_eq!(joined[0].id, railway.id);
        assert_eq!(joined[0].tasks, vec![t1, t3]);
        assert_eq!(joined[1].tasks, vec![t2]);
    }

    #[tokio::test]
    async fn test_refresh_joins_tasks() {
        let (_store, cache, project, task) = seeded().await;

        let projects = cache.entities();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].id, project.id);
        assert_eq!(projects[0].tasks, vec![task]);
    }

    #[tokio::test]
    async fn test_deleted_project_hides_its_tasks() {
        let (store, cache, project, _task) = seeded().await;
        let other = cache
            .add_project(ProjectDraft::new("Farm", "neo"))
            .await
            .unwrap();

        assert!(cache.remove_project(project.id).await.unwrap());
        cache.refresh().await;

        let projects = cache.entities();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].id, other.id);
        assert!(projects[0].tasks.is_empty());

        // The orphan is still stored until purged.
        assert_eq!(
            store.inner().list_tasks(TaskFilter::new()).await.unwrap().len(),
            1
        );
        assert_eq!(cache.purge_orphans().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_toggle_project_and_task() {
        let (_store, cache, project, task) = seeded().await;

        let toggled = cache.toggle_project(project.id).await.unwrap().unwrap();
        assert!(toggled.completed);
        assert_eq!(toggled.tasks.len(), 1);

        let toggled = cache.toggle_task(task.id, project.id).await.unwrap().unwrap();
        assert!(toggled.completed);
        assert!(cache.project(project.id).unwrap().tasks[0].completed);

        let toggled = cache.toggle_task(task.id, project.id).await.unwrap().unwrap();
        assert!(!toggled.completed);
    }

    #[tokio::test]
    async fn test_toggle_unknown_task_is_noop() {
        let (store, cache, project, _task) = seeded().await;
        let before = cache.snapshot();
        let calls = store.calls();

        assert!(cache
            .toggle_task(Uuid::new_v4(), project.id)
            .await
            .unwrap()
            .is_none());
        assert!(cache.toggle_project(Uuid::new_v4()).await.unwrap().is_none());

        assert_eq!(store.calls(), calls);
        assert_eq!(cache.snapshot(), before);
    }

    #[tokio::test]
    async fn test_add_and_remove_task() {
        let (_store, cache, project, first) = seeded().await;

        let second = cache.add_task(project.id, "Lay tracks").await.unwrap();
        assert_eq!(
            cache.project(project.id).unwrap().tasks,
            vec![first.clone(), second.clone()]
        );

        assert!(cache.remove_task(first.id, project.id).await.unwrap());
        assert_eq!(cache.project(project.id).unwrap().tasks, vec![second]);

        let err = cache.add_task(Uuid::new_v4(), "Nowhere").await.unwrap_err();
        assert!(err.is_not_found());
        assert!(cache.error().is_some());
    }

    #[tokio::test]
    async fn test_failed_toggle_records_error() {
        let (store, cache, project, _task) = seeded().await;
        store.set_failing(true);

        let err = cache.toggle_project(project.id).await.unwrap_err();
        assert!(matches!(err, CacheError::Store(StoreError::StoreUnavailable(_))));
        assert!(!cache.project(project.id).unwrap().completed);
        assert_eq!(cache.error().as_deref(), Some("store unavailable: offline"));
    }

    #[tokio::test]
    async fn test_refresh_failure_keeps_projects() {
        let (store, cache, project, _task) = seeded().await;
        store.set_failing(true);

        cache.refresh().await;

        assert_eq!(cache.entities()[0].id, project.id);
        assert!(cache.error().is_some());
        assert!(!cache.is_loading());
    }

    #[tokio::test]
    async fn test_detached_cache() {
        let cache = ProjectCache::detached();
        cache.refresh().await;
        assert_eq!(cache.error().as_deref(), Some("backend is not configured"));

        let err = cache
            .add_project(ProjectDraft::new("Railway", "trinity"))
            .await
            .unwrap_err();
        assert!(err.is_unconfigured());
    }

    #[tokio::test(start_paused = true)]
    async fn test_mutation_times_out() {
        let cache = ProjectCache::new(Arc::new(HangingStore)).with_timeout(Duration::from_secs(1));
        let err = cache
            .add_project(ProjectDraft::new("Railway", "trinity"))
            .await
            .unwrap_err();
        assert!(matches!(err, CacheError::Timeout(_)));
        assert!(cache.entities().is_empty());
    }

    #[tokio::test]
    async fn test_memory_backend() {
        let cache = ProjectCache::new(Arc::new(MemoryStore::new()));
        let project = cache
            .add_project(ProjectDraft::new("Railway", "trinity"))
            .await
            .unwrap();
        cache.add_task(project.id, "Gather iron").await.unwrap();

        cache.refresh().await;
        assert_eq!(cache.project(project.id).unwrap().tasks.len(), 1);
    }
}
