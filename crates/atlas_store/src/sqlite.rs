//! SQLite store implementation.
//!
//! Timestamps are stored as fixed-width RFC 3339 text with nanosecond
//! precision so lexical order matches chronological order and values
//! round-trip exactly. Tasks reference projects without a foreign key
//! constraint: deleting a project leaves its tasks in place.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use entities::{
    Category, Coordinate, CoordinateDraft, Project, ProjectDraft, ProjectPatch, Task, TaskDraft,
    TaskPatch,
};
use sqlx::{sqlite::SqlitePoolOptions, sqlite::SqliteRow, FromRow, Pool, Row, Sqlite};
use uuid::Uuid;

use crate::{
    rows::{CoordinateRow, ProjectRow, TaskRow},
    CoordinateFilter, CoordinateRepository, ProjectRepository, StoreError, StoreResult,
    TaskFilter,
};

/// Schema for the coordinates, projects and tasks tables.
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS coordinates (
    id TEXT PRIMARY KEY NOT NULL,
    name TEXT NOT NULL,
    x REAL NOT NULL,
    y REAL NOT NULL,
    z REAL NOT NULL,
    category TEXT NOT NULL CHECK (category IN ('biome', 'base', 'resource')),
    type TEXT NOT NULL,
    description TEXT,
    added_by TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_coordinates_category ON coordinates(category);
CREATE INDEX IF NOT EXISTS idx_coordinates_created_at ON coordinates(created_at);

CREATE TABLE IF NOT EXISTS projects (
    id TEXT PRIMARY KEY NOT NULL,
    title TEXT NOT NULL,
    description TEXT,
    completed INTEGER NOT NULL DEFAULT 0,
    added_by TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_projects_created_at ON projects(created_at);

CREATE TABLE IF NOT EXISTS tasks (
    id TEXT PRIMARY KEY NOT NULL,
    project_id TEXT NOT NULL,
    title TEXT NOT NULL,
    completed INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_tasks_project_id ON tasks(project_id);
"#;

const COORDINATE_COLUMNS: &str =
    "id, name, x, y, z, category, type, description, added_by, created_at";
const PROJECT_COLUMNS: &str = "id, title, description, completed, added_by, created_at";
const TASK_COLUMNS: &str = "id, project_id, title, completed, created_at";

fn encode_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn decode_error(
    column: &str,
    source: impl std::error::Error + Send + Sync + 'static,
) -> sqlx::Error {
    sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(source),
    }
}

fn get_uuid(row: &SqliteRow, column: &str) -> sqlx::Result<Uuid> {
    let raw: String = row.try_get(column)?;
    Uuid::parse_str(&raw).map_err(|e| decode_error(column, e))
}

fn get_timestamp(row: &SqliteRow, column: &str) -> sqlx::Result<DateTime<Utc>> {
    let raw: String = row.try_get(column)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| decode_error(column, e))
}

impl<'r> FromRow<'r, SqliteRow> for CoordinateRow {
    fn from_row(row: &'r SqliteRow) -> sqlx::Result<Self> {
        let category: String = row.try_get("category")?;
        Ok(Self {
            id: get_uuid(row, "id")?,
            name: row.try_get("name")?,
            x: row.try_get("x")?,
            y: row.try_get("y")?,
            z: row.try_get("z")?,
            category: category
                .parse::<Category>()
                .map_err(|e| decode_error("category", e))?,
            kind: row.try_get("type")?,
            description: row.try_get("description")?,
            added_by: row.try_get("added_by")?,
            created_at: get_timestamp(row, "created_at")?,
        })
    }
}

impl<'r> FromRow<'r, SqliteRow> for ProjectRow {
    fn from_row(row: &'r SqliteRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: get_uuid(row, "id")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            completed: row.try_get("completed")?,
            added_by: row.try_get("added_by")?,
            created_at: get_timestamp(row, "created_at")?,
        })
    }
}

impl<'r> FromRow<'r, SqliteRow> for TaskRow {
    fn from_row(row: &'r SqliteRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: get_uuid(row, "id")?,
            project_id: get_uuid(row, "project_id")?,
            title: row.try_get("title")?,
            completed: row.try_get("completed")?,
            created_at: get_timestamp(row, "created_at")?,
        })
    }
}

/// Store backed by a SQLite database.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    /// Opens (creating if needed) the database file at `db_path`.
    pub async fn open(db_path: &Path) -> StoreResult<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::StoreUnavailable(format!(
                    "failed to prepare database directory {}: {e}",
                    parent.display()
                ))
            })?;
        }

        Self::connect(&format!("sqlite:{}?mode=rwc", db_path.display())).await
    }

    /// Connects to a database URL and creates the schema.
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(|e| StoreError::StoreUnavailable(e.to_string()))?;

        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    /// Opens a private in-memory database.
    pub async fn in_memory() -> StoreResult<Self> {
        // Each connection would otherwise get its own empty database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| StoreError::StoreUnavailable(e.to_string()))?;

        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    /// Returns a reference to the connection pool
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    async fn run_migrations(&self) -> StoreResult<()> {
        sqlx::query(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }

    async fn fetch_project(&self, id: Uuid) -> StoreResult<Option<Project>> {
        let row: Option<ProjectRow> = sqlx::query_as(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?"
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Project::from))
    }

    async fn fetch_task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        let row: Option<TaskRow> =
            sqlx::query_as(&format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?"))
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(Task::from))
    }
}

#[async_trait]
impl CoordinateRepository for SqliteStore {
    async fn list_coordinates(&self, filter: CoordinateFilter) -> StoreResult<Vec<Coordinate>> {
        let rows: Vec<CoordinateRow> = match filter.category {
            Some(category) => {
                sqlx::query_as(&format!(
                    "SELECT {COORDINATE_COLUMNS} FROM coordinates WHERE category = ? \
                     ORDER BY created_at DESC, rowid DESC"
                ))
                .bind(category.as_str())
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as(&format!(
                    "SELECT {COORDINATE_COLUMNS} FROM coordinates \
                     ORDER BY created_at DESC, rowid DESC"
                ))
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows.into_iter().map(Coordinate::from).collect())
    }

    async fn create_coordinate(&self, draft: CoordinateDraft) -> StoreResult<Coordinate> {
        StoreError::check_required(&draft.missing_fields())?;
        let coordinate = draft.into_coordinate();
        let row = CoordinateRow::from(&coordinate);

        sqlx::query(&format!(
            "INSERT INTO coordinates ({COORDINATE_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(row.id.to_string())
        .bind(&row.name)
        .bind(row.x)
        .bind(row.y)
        .bind(row.z)
        .bind(row.category.as_str())
        .bind(&row.kind)
        .bind(&row.description)
        .bind(&row.added_by)
        .bind(encode_timestamp(&row.created_at))
        .execute(&self.pool)
        .await?;

        Ok(coordinate)
    }

    async fn delete_coordinate(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM coordinates WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ProjectRepository for SqliteStore {
    async fn list_projects(&self) -> StoreResult<Vec<Project>> {
        let rows: Vec<ProjectRow> = sqlx::query_as(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects ORDER BY created_at DESC, rowid DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Project::from).collect())
    }

    async fn create_project(&self, draft: ProjectDraft) -> StoreResult<Project> {
        StoreError::check_required(&draft.missing_fields())?;
        let project = draft.into_project();
        let row = ProjectRow::from(&project);

        sqlx::query(&format!(
            "INSERT INTO projects ({PROJECT_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?)"
        ))
        .bind(row.id.to_string())
        .bind(&row.title)
        .bind(&row.description)
        .bind(row.completed)
        .bind(&row.added_by)
        .bind(encode_timestamp(&row.created_at))
        .execute(&self.pool)
        .await?;

        Ok(project)
    }

    async fn update_project(&self, id: Uuid, patch: ProjectPatch) -> StoreResult<Project> {
        let result = sqlx::query(
            "UPDATE projects
             SET title = COALESCE(?, title), description = COALESCE(?, description), \
             completed = COALESCE(?, completed)
             WHERE id = ?",
        )
        .bind(&patch.title)
        .bind(&patch.description)
        .bind(patch.completed)
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Project", id));
        }

        self.fetch_project(id)
            .await?
            .ok_or_else(|| StoreError::not_found("Project", id))
    }

    async fn delete_project(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM projects WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_tasks(&self, filter: TaskFilter) -> StoreResult<Vec<Task>> {
        let rows: Vec<TaskRow> = match filter.project_id {
            Some(project_id) => {
                sqlx::query_as(&format!(
                    "SELECT {TASK_COLUMNS} FROM tasks WHERE project_id = ? \
                     ORDER BY created_at ASC, rowid ASC"
                ))
                .bind(project_id.to_string())
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as(&format!(
                    "SELECT {TASK_COLUMNS} FROM tasks ORDER BY created_at ASC, rowid ASC"
                ))
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows.into_iter().map(Task::from).collect())
    }

    async fn create_task(&self, draft: TaskDraft) -> StoreResult<Task> {
        StoreError::check_required(&draft.missing_fields())?;

        let mut tx = self.pool.begin().await?;

        let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM projects WHERE id = ?")
            .bind(draft.project_id.to_string())
            .fetch_one(&mut *tx)
            .await?;
        if exists == 0 {
            return Err(StoreError::not_found("Project", draft.project_id));
        }

        let task = draft.into_task();
        let row = TaskRow::from(&task);
        sqlx::query(&format!(
            "INSERT INTO tasks ({TASK_COLUMNS}) VALUES (?, ?, ?, ?, ?)"
        ))
        .bind(row.id.to_string())
        .bind(row.project_id.to_string())
        .bind(&row.title)
        .bind(row.completed)
        .bind(encode_timestamp(&row.created_at))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(task)
    }

    async fn update_task(&self, id: Uuid, patch: TaskPatch) -> StoreResult<Task> {
        let result = sqlx::query(
            "UPDATE tasks SET title = COALESCE(?, title), completed = COALESCE(?, completed) \
             WHERE id = ?",
        )
        .bind(&patch.title)
        .bind(patch.completed)
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Task", id));
        }

        self.fetch_task(id)
            .await?
            .ok_or_else(|| StoreError::not_found("Task", id))
    }

    async fn delete_task(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_orphaned_tasks(&self) -> StoreResult<u64> {
        let result =
            sqlx::query("DELETE FROM tasks WHERE project_id NOT IN (SELECT id FROM projects)")
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected())
    }
}
