//! Project and task entity definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A checklist item owned by a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique identifier.
    pub id: Uuid,
    /// Owning project. Not enforced after creation.
    pub project_id: Uuid,
    /// Task title.
    pub title: String,
    /// Whether the task is done.
    #[serde(default)]
    pub completed: bool,
    /// When this record was created.
    pub created_at: DateTime<Utc>,
}

/// A shared unit of work with an ordered checklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Unique identifier.
    pub id: Uuid,
    /// Project title.
    pub title: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the whole project is done.
    #[serde(default)]
    pub completed: bool,
    /// Name of the member who created it.
    pub added_by: String,
    /// When this record was created.
    pub created_at: DateTime<Utc>,
    /// Tasks, oldest first.
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl Project {
    /// Finds a task of this project by id.
    pub fn task(&self, task_id: Uuid) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    /// Finds a task of this project by id, mutably.
    pub fn task_mut(&mut self, task_id: Uuid) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == task_id)
    }
}

/// A project payload before the store assigns `id` and `createdAt`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDraft {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub added_by: String,
}

impl ProjectDraft {
    /// Creates a new project draft.
    pub fn new(title: impl Into<String>, added_by: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            added_by: added_by.into(),
        }
    }

    /// Sets the description for this draft.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Returns the wire names of required text fields that are blank.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.title.trim().is_empty() {
            missing.push("title");
        }
        if self.added_by.trim().is_empty() {
            missing.push("addedBy");
        }
        missing
    }

    /// Materializes the draft as an open project with no tasks.
    pub fn into_project(self) -> Project {
        Project {
            id: Uuid::new_v4(),
            title: self.title,
            description: self.description,
            completed: false,
            added_by: self.added_by,
            created_at: Utc::now(),
            tasks: Vec::new(),
        }
    }
}

/// A task payload before the store assigns `id` and `createdAt`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDraft {
    pub project_id: Uuid,
    pub title: String,
}

impl TaskDraft {
    /// Creates a new task draft for the given project.
    pub fn new(project_id: Uuid, title: impl Into<String>) -> Self {
        Self {
            project_id,
            title: title.into(),
        }
    }

    /// Returns the wire names of required text fields that are blank.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        if self.title.trim().is_empty() {
            vec!["title"]
        } else {
            Vec::new()
        }
    }

    /// Materializes the draft as an open task.
    pub fn into_task(self) -> Task {
        Task {
            id: Uuid::new_v4(),
            project_id: self.project_id,
            title: self.title,
            completed: false,
            created_at: Utc::now(),
        }
    }
}

/// Partial update of a project. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl ProjectPatch {
    /// Patch that only sets the completion flag.
    pub fn completed(completed: bool) -> Self {
        Self {
            completed: Some(completed),
            ..Default::default()
        }
    }

    /// Applies the patch in place.
    pub fn apply(&self, project: &mut Project) {
        if let Some(title) = &self.title {
            project.title = title.clone();
        }
        if let Some(description) = &self.description {
            project.description = Some(description.clone());
        }
        if let Some(completed) = self.completed {
            project.completed = completed;
        }
    }
}

/// Partial update of a task. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl TaskPatch {
    /// Patch that only sets the completion flag.
    pub fn completed(completed: bool) -> Self {
        Self {
            completed: Some(completed),
            ..Default::default()
        }
    }

    /// Applies the patch in place.
    pub fn apply(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
    }
}
