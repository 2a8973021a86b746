//! Coordinate endpoints.

use atlas_store::{CoordinateFilter, StoreError};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use entities::{Category, Coordinate, CoordinateDraft};
use serde::Deserialize;
use tracing::info;

use super::{parse_id, SuccessResponse};
use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};

/// Query string of the listing endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct CoordinateQuery {
    pub category: Option<String>,
}

impl CoordinateQuery {
    fn into_filter(self) -> ApiResult<CoordinateFilter> {
        match self.category.as_deref().map(str::trim) {
            None | Some("") => Ok(CoordinateFilter::new()),
            Some(raw) => raw
                .parse::<Category>()
                .map(|c| CoordinateFilter::new().with_category(c))
                .map_err(|e| ApiError::InvalidRequest(e.to_string())),
        }
    }
}

/// Creation body. Every field is optional here so absent fields can be
/// reported together; a coordinate of `0` is present.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCoordinateRequest {
    pub name: Option<String>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
    pub category: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub description: Option<String>,
    pub added_by: Option<String>,
}

impl CreateCoordinateRequest {
    fn missing_fields(&self) -> Vec<&'static str> {
        let present = [
            ("name", self.name.is_some()),
            ("x", self.x.is_some()),
            ("y", self.y.is_some()),
            ("z", self.z.is_some()),
            ("category", self.category.is_some()),
            ("type", self.kind.is_some()),
            ("addedBy", self.added_by.is_some()),
        ];
        present
            .into_iter()
            .filter(|(_, present)| !present)
            .map(|(field, _)| field)
            .collect()
    }

    fn into_draft(self) -> ApiResult<CoordinateDraft> {
        let missing = self.missing_fields();
        let (Some(name), Some(x), Some(y), Some(z), Some(category), Some(kind), Some(added_by)) = (
            self.name,
            self.x,
            self.y,
            self.z,
            self.category,
            self.kind,
            self.added_by,
        ) else {
            return Err(StoreError::missing_fields(&missing).into());
        };

        let category = category
            .parse::<Category>()
            .map_err(|e| StoreError::validation(e.to_string()))?;

        let mut draft = CoordinateDraft::new(name, (x, y, z), category, kind, added_by);
        draft.description = self.description.filter(|d| !d.trim().is_empty());
        Ok(draft)
    }
}

/// Lists coordinates, newest first, optionally of one category.
pub async fn list_coordinates(
    State(state): State<AppState>,
    query: Result<Query<CoordinateQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Coordinate>>> {
    let Query(query) = query?;
    let filter = query.into_filter()?;
    let coordinates = state.repositories.coordinates.list_coordinates(filter).await?;
    Ok(Json(coordinates))
}

/// Creates a coordinate.
pub async fn create_coordinate(
    State(state): State<AppState>,
    payload: Result<Json<CreateCoordinateRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Coordinate>)> {
    let Json(request) = payload?;
    let draft = request.into_draft()?;

    let coordinate = state.repositories.coordinates.create_coordinate(draft).await?;
    info!(id = %coordinate.id, category = %coordinate.category, "Coordinate created");

    Ok((StatusCode::CREATED, Json(coordinate)))
}

/// Deletes a coordinate.
pub async fn delete_coordinate(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SuccessResponse>> {
    let id = parse_id(&id, "Coordinate")?;

    if state.repositories.coordinates.delete_coordinate(id).await? {
        info!(id = %id, "Coordinate deleted");
        Ok(Json(SuccessResponse::ok()))
    } else {
        Err(ApiError::not_found("Coordinate", id))
    }
}
