//! JSON document store.
//!
//! Each collection lives in its own pretty-printed JSON array of storage rows
//! (`coordinates.json`, `projects.json`, `tasks.json`). Every write is a full
//! read-modify-write of the document. Writes are serialized per document
//! within the process and land atomically through a temp file and rename;
//! separate processes sharing a directory still race last-write-wins.

use std::{
    io::ErrorKind,
    marker::PhantomData,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use entities::{
    Coordinate, CoordinateDraft, Project, ProjectDraft, ProjectPatch, Task, TaskDraft, TaskPatch,
};
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    rows::{CoordinateRow, ProjectRow, TaskRow},
    traits::{newest_first, oldest_first},
    CoordinateFilter, CoordinateRepository, ProjectRepository, StoreError, StoreResult,
    TaskFilter,
};

/// Whether a mutation changed the document.
enum Outcome<R> {
    Persist(R),
    Unchanged(R),
}

/// One JSON array document on disk.
#[derive(Debug)]
struct JsonDocument<T> {
    path: PathBuf,
    write_lock: Mutex<()>,
    _rows: PhantomData<fn() -> T>,
}

impl<T> JsonDocument<T>
where
    T: Serialize + DeserializeOwned,
{
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
            _rows: PhantomData,
        }
    }

    /// Creates the document as an empty array if it does not exist yet.
    async fn ensure_exists(&self) -> StoreResult<()> {
        match tokio::fs::metadata(&self.path).await {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => self.store(&[]).await,
            Err(e) => Err(e.into()),
        }
    }

    /// Reads every row for listing. Any failure yields an empty collection.
    async fn load_lenient(&self) -> Vec<T> {
        match self.load_strict().await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Failed to read JSON document, listing as empty"
                );
                Vec::new()
            }
        }
    }

    /// Reads every row for a write. A missing document is empty; a corrupt
    /// one is an error so it never gets overwritten.
    async fn load_strict(&self) -> StoreResult<Vec<T>> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_slice(&raw)?)
    }

    async fn store(&self, rows: &[T]) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let payload = serde_json::to_vec_pretty(rows)?;
        let temp_path = self
            .path
            .with_extension(format!("{}.tmp", Uuid::new_v4().simple()));
        tokio::fs::write(&temp_path, payload).await?;
        if let Err(e) = tokio::fs::rename(&temp_path, &self.path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(e.into());
        }
        Ok(())
    }

    /// Runs a read-modify-write under the document's write lock.
    async fn mutate<R, F>(&self, operation: F) -> StoreResult<R>
    where
        F: FnOnce(&mut Vec<T>) -> StoreResult<Outcome<R>>,
    {
        let _guard = self.write_lock.lock().await;
        let mut rows = self.load_strict().await?;
        match operation(&mut rows)? {
            Outcome::Persist(result) => {
                self.store(&rows).await?;
                Ok(result)
            }
            Outcome::Unchanged(result) => Ok(result),
        }
    }
}

/// Store backed by JSON documents in one directory.
#[derive(Debug)]
pub struct JsonFileStore {
    dir: PathBuf,
    coordinates: JsonDocument<CoordinateRow>,
    projects: JsonDocument<ProjectRow>,
    tasks: JsonDocument<TaskRow>,
}

impl JsonFileStore {
    /// Opens the store, creating the directory and empty documents as needed.
    pub async fn open(dir: impl AsRef<Path>) -> StoreResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            StoreError::StoreUnavailable(format!(
                "failed to prepare data directory {}: {e}",
                dir.display()
            ))
        })?;

        let store = Self {
            coordinates: JsonDocument::new(dir.join("coordinates.json")),
            projects: JsonDocument::new(dir.join("projects.json")),
            tasks: JsonDocument::new(dir.join("tasks.json")),
            dir,
        };
        store.coordinates.ensure_exists().await?;
        store.projects.ensure_exists().await?;
        store.tasks.ensure_exists().await?;

        tracing::debug!(dir = %store.dir.display(), "Opened JSON document store");
        Ok(store)
    }

    /// Directory holding the documents.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

fn remove_by_id<T>(rows: &mut Vec<T>, id: Uuid, row_id: impl Fn(&T) -> Uuid) -> Outcome<bool> {
    match rows.iter().position(|r| row_id(r) == id) {
        Some(index) => {
            rows.remove(index);
            Outcome::Persist(true)
        }
        None => Outcome::Unchanged(false),
    }
}

#[async_trait]
impl CoordinateRepository for JsonFileStore {
    async fn list_coordinates(&self, filter: CoordinateFilter) -> StoreResult<Vec<Coordinate>> {
        let coordinates: Vec<Coordinate> = self
            .coordinates
            .load_lenient()
            .await
            .into_iter()
            .map(Coordinate::from)
            .filter(|c| filter.matches(c))
            .collect();
        Ok(newest_first(coordinates, |c| c.created_at))
    }

    async fn create_coordinate(&self, draft: CoordinateDraft) -> StoreResult<Coordinate> {
        StoreError::check_required(&draft.missing_fields())?;
        // Stamped under the write lock so file order matches `createdAt`.
        self.coordinates
            .mutate(|rows| {
                let coordinate = draft.into_coordinate();
                rows.push(CoordinateRow::from(&coordinate));
                Ok(Outcome::Persist(coordinate))
            })
            .await
    }

    async fn delete_coordinate(&self, id: Uuid) -> StoreResult<bool> {
        self.coordinates
            .mutate(|rows| Ok(remove_by_id(rows, id, |r| r.id)))
            .await
    }
}

#[async_trait]
impl ProjectRepository for JsonFileStore {
    async fn list_projects(&self) -> StoreResult<Vec<Project>> {
        let projects: Vec<Project> = self
            .projects
            .load_lenient()
            .await
            .into_iter()
            .map(Project::from)
            .collect();
        Ok(newest_first(projects, |p| p.created_at))
    }

    async fn create_project(&self, draft: ProjectDraft) -> StoreResult<Project> {
        StoreError::check_required(&draft.missing_fields())?;
        // Stamped under the write lock so file order matches `createdAt`.
        self.projects
            .mutate(|rows| {
                let project = draft.into_project();
                rows.push(ProjectRow::from(&project));
                Ok(Outcome::Persist(project))
            })
            .await
    }

    async fn update_project(&self, id: Uuid, patch: ProjectPatch) -> StoreResult<Project> {
        self.projects
            .mutate(|rows| {
                let row = rows
                    .iter_mut()
                    .find(|r| r.id == id)
                    .ok_or_else(|| StoreError::not_found("Project", id))?;
                let mut project = Project::from(row.clone());
                patch.apply(&mut project);
                *row = ProjectRow::from(&project);
                Ok(Outcome::Persist(project))
            })
            .await
    }

    async fn delete_project(&self, id: Uuid) -> StoreResult<bool> {
        self.projects
            .mutate(|rows| Ok(remove_by_id(rows, id, |r| r.id)))
            .await
    }

    async fn list_tasks(&self, filter: TaskFilter) -> StoreResult<Vec<Task>> {
        let tasks: Vec<Task> = self
            .tasks
            .load_lenient()
            .await
            .into_iter()
            .map(Task::from)
            .filter(|t| filter.matches(t))
            .collect();
        Ok(oldest_first(tasks, |t| t.created_at))
    }

    async fn create_task(&self, draft: TaskDraft) -> StoreResult<Task> {
        StoreError::check_required(&draft.missing_fields())?;

        // Lock order: projects, then tasks.
        let _projects_guard = self.projects.write_lock.lock().await;
        let projects = self.projects.load_strict().await?;
        if !projects.iter().any(|p| p.id == draft.project_id) {
            return Err(StoreError::not_found("Project", draft.project_id));
        }

        // Stamped under the write lock so file order matches `createdAt`.
        self.tasks
            .mutate(|rows| {
                let task = draft.into_task();
                rows.push(TaskRow::from(&task));
                Ok(Outcome::Persist(task))
            })
            .await
    }

    async fn update_task(&self, id: Uuid, patch: TaskPatch) -> StoreResult<Task> {
        self.tasks
            .mutate(|rows| {
                let row = rows
                    .iter_mut()
                    .find(|r| r.id == id)
                    .ok_or_else(|| StoreError::not_found("Task", id))?;
                let mut task = Task::from(row.clone());
                patch.apply(&mut task);
                *row = TaskRow::from(&task);
                Ok(Outcome::Persist(task))
            })
            .await
    }

    async fn delete_task(&self, id: Uuid) -> StoreResult<bool> {
        self.tasks
            .mutate(|rows| Ok(remove_by_id(rows, id, |r| r.id)))
            .await
    }

    async fn delete_orphaned_tasks(&self) -> StoreResult<u64> {
        let _projects_guard = self.projects.write_lock.lock().await;
        let projects = self.projects.load_strict().await?;
        self.tasks
            .mutate(|rows| {
                let before = rows.len();
                rows.retain(|t| projects.iter().any(|p| p.id == t.project_id));
                let removed = (before - rows.len()) as u64;
                if removed == 0 {
                    Ok(Outcome::Unchanged(0))
                } else {
                    Ok(Outcome::Persist(removed))
                }
            })
            .await
    }
}
