//! Core traits for deskmap abstractions.
//!
//! These traits define the interfaces that concrete store implementations
//! must satisfy, enabling pluggable backends and testability.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// FLOOR PLAN REPOSITORY
// =============================================================================

/// Repository for floor plan CRUD operations.
#[async_trait]
pub trait FloorPlanRepository: Send + Sync {
    /// Insert a new floor plan owned by `owner_id`.
    async fn insert(&self, owner_id: Uuid, req: CreateFloorPlanRequest) -> Result<FloorPlan>;

    /// Fetch a floor plan by id. Fails with `FloorPlanNotFound` when missing.
    async fn fetch(&self, id: Uuid) -> Result<FloorPlan>;

    /// Fetch the full detail representation: plan, owner name, and current
    /// non-trashed locations.
    async fn fetch_detail(&self, id: Uuid) -> Result<FloorPlanDetail>;

    /// List an owner's non-trashed floor plans, most recently updated first.
    async fn list_for_owner(&self, owner_id: Uuid) -> Result<Vec<FloorPlanSummary>>;

    /// Apply the floor-plan fields of a payload (name, flags). Locations in
    /// the payload are ignored here. Returns the refreshed row.
    async fn update_fields(&self, id: Uuid, payload: &FloorPlanPayload) -> Result<FloorPlan>;

    /// Attach an uploaded image and its probed pixel dimensions.
    async fn set_image(&self, id: Uuid, image: &ImageRef, width: f64, height: f64) -> Result<()>;

    /// Soft-delete a floor plan. Its locations are retained and cascade only
    /// on store-level hard removal.
    async fn soft_delete(&self, id: Uuid) -> Result<()>;
}

// =============================================================================
// LOCATION REPOSITORY
// =============================================================================

/// Repository for location batches against a parent floor plan.
#[async_trait]
pub trait LocationRepository: Send + Sync {
    /// List the plan's non-trashed locations.
    async fn list_active_by_parent(&self, floorplan_id: Uuid) -> Result<Vec<Location>>;

    /// Full reconciliation of a submitted batch: update-by-id, create
    /// without id, plus any floor-plan field changes from the same request,
    /// applied as one transaction. See [`crate::reconcile`].
    async fn reconcile(
        &self,
        floorplan_id: Uuid,
        fields: &FloorPlanPayload,
        payloads: Vec<LocationPayload>,
    ) -> Result<ReconcileOutcome>;

    /// Create-only batch; the parent reference is injected server-side.
    async fn create_batch(
        &self,
        floorplan_id: Uuid,
        payloads: Vec<LocationPayload>,
    ) -> Result<Vec<Location>>;

    /// Update-only batch. With `trash`, every payload is forced to
    /// `is_trashed = true` before validation (the trash toggle).
    async fn update_batch(
        &self,
        floorplan_id: Uuid,
        payloads: Vec<LocationPayload>,
        trash: bool,
    ) -> Result<Vec<Location>>;
}

// =============================================================================
// USER REPOSITORY
// =============================================================================

/// Repository for user accounts and bearer-token resolution.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a user and issue an opaque bearer token for it.
    async fn insert(&self, username: &str) -> Result<(User, String)>;

    /// Resolve a bearer token to its user, or None when the token is
    /// unknown.
    async fn find_by_token(&self, token: &str) -> Result<Option<User>>;
}
