//! Location batch HTTP handlers.

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{ApiError, AppState};
use deskmap_core::{Action, Actor, Location, LocationPayload, LocationRepository};

use super::load_plan_authorized;

/// Query flags for the update-batch endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateLocationsQuery {
    /// With `?trash=true`, the batch becomes the trash toggle: every
    /// addressed row is marked trashed instead of plainly updated.
    #[serde(default)]
    pub trash: bool,
}

/// List the plan's non-trashed locations.
pub async fn list_locations(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Location>>, ApiError> {
    load_plan_authorized(&state, &actor, id, Action::Read).await?;
    let locations = state.db.locations.list_active_by_parent(id).await?;
    Ok(Json(locations))
}

/// Create-only batch. The parent floor plan id comes from the request path;
/// anything the client put in a payload's `floorplan` field is discarded.
pub async fn create_locations(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(payloads): Json<Vec<LocationPayload>>,
) -> Result<(StatusCode, Json<Vec<Location>>), ApiError> {
    load_plan_authorized(&state, &actor, id, Action::Write).await?;
    let created = state.db.locations.create_batch(id, payloads).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Update batch; with the trash directive, trash toggle semantics for the
/// same payload shape.
pub async fn update_locations(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Query(query): Query<UpdateLocationsQuery>,
    Json(payloads): Json<Vec<LocationPayload>>,
) -> Result<Json<Vec<Location>>, ApiError> {
    load_plan_authorized(&state, &actor, id, Action::Write).await?;
    let updated = state
        .db
        .locations
        .update_batch(id, payloads, query.trash)
        .await?;
    Ok(Json(updated))
}
