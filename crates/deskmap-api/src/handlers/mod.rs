//! HTTP handler modules for deskmap-api.

pub mod floorplans;
pub mod locations;
pub mod users;

use uuid::Uuid;

use crate::{ApiError, AppState};
use deskmap_core::{authorize, Action, Actor, FloorPlan, FloorPlanRepository};

/// Fetch a floor plan and check the actor's permission for `action`.
///
/// Fails closed: a plan the actor may not read is reported as not-found so
/// its existence is never leaked; a plan the actor can read but not write
/// is reported as forbidden.
pub(crate) async fn load_plan_authorized(
    state: &AppState,
    actor: &Actor,
    id: Uuid,
    action: Action,
) -> Result<FloorPlan, ApiError> {
    let plan = state.db.floorplans.fetch(id).await?;

    if !authorize(actor, &plan, Action::Read) {
        return Err(ApiError::NotFound(format!("Floor plan {}", id)));
    }
    if !authorize(actor, &plan, action) {
        return Err(ApiError::Forbidden(
            "floor plan is read-only for this user".to_string(),
        ));
    }
    Ok(plan)
}

/// Require an authenticated actor, yielding its user id.
pub(crate) fn require_user(actor: &Actor) -> Result<Uuid, ApiError> {
    actor
        .user_id()
        .ok_or_else(|| ApiError::Unauthorized("authentication required".to_string()))
}
