//! Core entity definitions for the shared-world atlas.
//!
//! This crate defines the application-shape records used across the
//! workspace: coordinates (points of interest) and projects with their
//! checklist tasks, together with the drafts and patches used to create and
//! update them.

mod coordinate;
mod project;

pub use coordinate::*;
pub use project::*;
