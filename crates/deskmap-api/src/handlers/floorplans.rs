//! Floor plan HTTP handlers.
//!
//! Every handler that touches a plan goes through the object-level access
//! guard first: reads are allowed for the owner or on public plans, writes
//! for the owner only, and unreadable plans surface as not-found.

use axum::{
    extract::{Extension, Multipart, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{ApiError, AppState};
use deskmap_core::{
    probe_image, validate_floorplan_fields, validate_reconcile_batch, Action, Actor,
    CreateFloorPlanRequest, FloorPlan, FloorPlanDetail, FloorPlanPayload, FloorPlanRepository,
    FloorPlanSummary, ImageRef, LocationRepository,
};

use super::{load_plan_authorized, require_user};

/// List the current actor's non-trashed floor plans.
pub async fn list_floorplans(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Vec<FloorPlanSummary>>, ApiError> {
    let owner_id = require_user(&actor)?;
    let plans = state.db.floorplans.list_for_owner(owner_id).await?;
    Ok(Json(plans))
}

/// Create a floor plan owned by the current actor.
pub async fn create_floorplan(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<CreateFloorPlanRequest>,
) -> Result<(StatusCode, Json<FloorPlan>), ApiError> {
    let owner_id = require_user(&actor)?;
    let plan = state.db.floorplans.insert(owner_id, req).await?;
    Ok((StatusCode::CREATED, Json(plan)))
}

/// Floor plan detail: plan fields, owner name, aspect ratio, and the
/// current non-trashed locations.
pub async fn get_floorplan(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<FloorPlanDetail>, ApiError> {
    load_plan_authorized(&state, &actor, id, Action::Read).await?;
    let detail = state.db.floorplans.fetch_detail(id).await?;
    Ok(Json(detail))
}

/// Update floor-plan fields only; a `locations` list in the body is
/// deliberately ignored here.
pub async fn update_floorplan(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<FloorPlanPayload>,
) -> Result<Json<FloorPlanDetail>, ApiError> {
    load_plan_authorized(&state, &actor, id, Action::Write).await?;
    state.db.floorplans.update_fields(id, &payload).await?;
    let detail = state.db.floorplans.fetch_detail(id).await?;
    Ok(Json(detail))
}

/// Full reconciliation: floor-plan fields plus a `locations` batch applied
/// through the update-by-id/create-without-id split.
///
/// All validation happens before any mutation, so one bad candidate (or a
/// bad plan name) rejects the entire request with every collected error.
pub async fn reconcile_floorplan(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<FloorPlanPayload>,
) -> Result<Json<FloorPlanDetail>, ApiError> {
    load_plan_authorized(&state, &actor, id, Action::Write).await?;

    let locations = payload.locations.clone().unwrap_or_default();
    let mut report = validate_reconcile_batch(&locations);
    report.floorplan = validate_floorplan_fields(&payload);
    if !report.is_empty() {
        return Err(ApiError::Validation(report));
    }

    state.db.locations.reconcile(id, &payload, locations).await?;

    let detail = state.db.floorplans.fetch_detail(id).await?;
    Ok(Json(detail))
}

/// Soft-delete a floor plan. The row and its locations are retained.
pub async fn delete_floorplan(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    load_plan_authorized(&state, &actor, id, Action::Delete).await?;
    state.db.floorplans.soft_delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Upload a floor plan image (multipart field `image`).
///
/// The image's content type and pixel dimensions are probed from its header
/// before storage; width and height feed the derived aspect ratio.
pub async fn upload_floorplan_image(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<FloorPlan>, ApiError> {
    load_plan_authorized(&state, &actor, id, Action::Write).await?;

    let mut data: Option<Vec<u8>> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        if field.name() == Some("image") || data.is_none() {
            data = Some(
                field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.to_string()))?
                    .to_vec(),
            );
        }
    }
    let data = data.ok_or_else(|| ApiError::BadRequest("missing image field".to_string()))?;

    let meta = probe_image(&data)?;
    let store = state
        .db
        .images
        .as_ref()
        .ok_or_else(|| ApiError::StorageUnavailable("image storage not configured".to_string()))?;

    let path = store.store(id, &data).await?;
    let image = ImageRef {
        path,
        content_type: meta.content_type.clone(),
    };
    state
        .db
        .floorplans
        .set_image(id, &image, meta.width as f64, meta.height as f64)
        .await?;

    let plan = state.db.floorplans.fetch(id).await?;
    Ok(Json(plan))
}

/// Serve the stored floor plan image bytes.
pub async fn get_floorplan_image(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let plan = load_plan_authorized(&state, &actor, id, Action::Read).await?;

    let image = plan
        .image
        .ok_or_else(|| ApiError::NotFound(format!("Floor plan {} has no image", id)))?;
    let store = state
        .db
        .images
        .as_ref()
        .ok_or_else(|| ApiError::StorageUnavailable("image storage not configured".to_string()))?;

    let bytes = store.load(&image.path).await?;
    Ok(([(header::CONTENT_TYPE, image.content_type)], bytes))
}
