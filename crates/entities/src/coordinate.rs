//! Coordinate entity definitions.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Category of a point of interest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// A biome location.
    Biome,
    /// A member's base.
    Base,
    /// A resource deposit or farm.
    Resource,
}

impl Category {
    /// All categories, in display order.
    pub const ALL: [Category; 3] = [Category::Biome, Category::Base, Category::Resource];

    /// Converts the category to a string for storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Biome => "biome",
            Self::Base => "base",
            Self::Resource => "resource",
        }
    }

    /// Parses a category from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "biome" => Some(Self::Biome),
            "base" => Some(Self::Base),
            "resource" => Some(Self::Resource),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not one of the known categories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCategory(pub String);

impl fmt::Display for UnknownCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown category: {}", self.0)
    }
}

impl std::error::Error for UnknownCategory {}

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// A point of interest in the shared world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinate {
    /// Unique identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Category of the marker.
    pub category: Category,
    /// Free-form subtype (e.g. "shelter", "iron").
    #[serde(rename = "type")]
    pub kind: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Name of the member who submitted it.
    pub added_by: String,
    /// When this record was created.
    pub created_at: DateTime<Utc>,
}

/// A coordinate payload before the store assigns `id` and `createdAt`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoordinateDraft {
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub category: Category,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub added_by: String,
}

impl CoordinateDraft {
    /// Creates a new draft with no description.
    pub fn new(
        name: impl Into<String>,
        (x, y, z): (f64, f64, f64),
        category: Category,
        kind: impl Into<String>,
        added_by: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            x,
            y,
            z,
            category,
            kind: kind.into(),
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
        if self.name.trim().is_empty() {
            missing.push("name");
        }
        if self.kind.trim().is_empty() {
            missing.push("type");
        }
        if self.added_by.trim().is_empty() {
            missing.push("addedBy");
        }
        missing
    }

    /// Materializes the draft with a fresh id and the current timestamp.
    pub fn into_coordinate(self) -> Coordinate {
        Coordinate {
            id: Uuid::new_v4(),
            name: self.name,
            x: self.x,
            y: self.y,
            z: self.z,
            category: self.category,
            kind: self.kind,
            description: self.description,
            added_by: self.added_by,
            created_at: Utc::now(),
        }
    }
}
