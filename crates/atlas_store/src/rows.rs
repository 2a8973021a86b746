//! Storage-row records and their mapping to application-shape entities.
//!
//! Rows use the flat column naming of the storage tables (`added_by`,
//! `created_at`, `project_id`) and serialize with those names, which is also
//! the layout of the JSON documents. Entities use the camel-case application
//! shape. Every conversion here is total and does no validation.

use chrono::{DateTime, Utc};
use entities::{Category, Coordinate, Project, Task};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Storage row for Coordinate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinateRow {
    pub id: Uuid,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub category: Category,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub description: Option<String>,
    pub added_by: String,
    pub created_at: DateTime<Utc>,
}

impl From<CoordinateRow> for Coordinate {
    fn from(row: CoordinateRow) -> Self {
        Coordinate {
            id: row.id,
            name: row.name,
            x: row.x,
            y: row.y,
            z: row.z,
            category: row.category,
            kind: row.kind,
            description: row.description,
            added_by: row.added_by,
            created_at: row.created_at,
        }
    }
}

impl From<&Coordinate> for CoordinateRow {
    fn from(coordinate: &Coordinate) -> Self {
        Self {
            id: coordinate.id,
            name: coordinate.name.clone(),
            x: coordinate.x,
            y: coordinate.y,
            z: coordinate.z,
            category: coordinate.category,
            kind: coordinate.kind.clone(),
            description: coordinate.description.clone(),
            added_by: coordinate.added_by.clone(),
            created_at: coordinate.created_at,
        }
    }
}

/// Storage row for Project. Tasks live in their own table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRow {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub completed: bool,
    pub added_by: String,
    pub created_at: DateTime<Utc>,
}

impl ProjectRow {
    /// Builds the project with the given tasks attached.
    pub fn into_project(self, tasks: Vec<Task>) -> Project {
        Project {
            id: self.id,
            title: self.title,
            description: self.description,
            completed: self.completed,
            added_by: self.added_by,
            created_at: self.created_at,
            tasks,
        }
    }
}

impl From<ProjectRow> for Project {
    fn from(row: ProjectRow) -> Self {
        row.into_project(Vec::new())
    }
}

impl From<&Project> for ProjectRow {
    fn from(project: &Project) -> Self {
        Self {
            id: project.id,
            title: project.title.clone(),
            description: project.description.clone(),
            completed: project.completed,
            added_by: project.added_by.clone(),
            created_at: project.created_at,
        }
    }
}

/// Storage row for Task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRow {
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

impl From<TaskRow> for Task {
    fn from(row: TaskRow) -> Self {
        Task {
            id: row.id,
            project_id: row.project_id,
            title: row.title,
            completed: row.completed,
            created_at: row.created_at,
        }
    }
}

impl From<&Task> for TaskRow {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id,
            project_id: task.project_id,
            title: task.title.clone(),
            completed: task.completed,
            created_at: task.created_at,
        }
    }
}
