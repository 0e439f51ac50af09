//! Core data models for deskmap.
//!
//! These types are shared across all deskmap crates and represent the
//! core domain entities: floor plans and the named locations placed on them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum length of a floor plan name.
pub const FLOOR_PLAN_NAME_MAX: usize = 100;

/// Maximum length of a location name.
pub const LOCATION_NAME_MAX: usize = 100;

/// Maximum length of a location's free-text details.
pub const LOCATION_DETAILS_MAX: usize = 250;

/// Maximum length of a username.
pub const USERNAME_MAX: usize = 150;

// =============================================================================
// LOCATION TYPES
// =============================================================================

/// The fixed set of location categories a marker can carry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LocationType {
    Desk,
    Office,
    Confr,
    Common,
    Restroom,
    Public,
    Private,
    Misc,
}

impl LocationType {
    /// All valid location types, in declaration order.
    pub const ALL: [LocationType; 8] = [
        LocationType::Desk,
        LocationType::Office,
        LocationType::Confr,
        LocationType::Common,
        LocationType::Restroom,
        LocationType::Public,
        LocationType::Private,
        LocationType::Misc,
    ];

    /// Wire/storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            LocationType::Desk => "DESK",
            LocationType::Office => "OFFICE",
            LocationType::Confr => "CONFR",
            LocationType::Common => "COMMON",
            LocationType::Restroom => "RESTROOM",
            LocationType::Public => "PUBLIC",
            LocationType::Private => "PRIVATE",
            LocationType::Misc => "MISC",
        }
    }

    /// Parse the wire/storage representation. Returns None for anything
    /// outside the enumeration (case-sensitive, matching the stored choices).
    pub fn parse(s: &str) -> Option<LocationType> {
        match s {
            "DESK" => Some(LocationType::Desk),
            "OFFICE" => Some(LocationType::Office),
            "CONFR" => Some(LocationType::Confr),
            "COMMON" => Some(LocationType::Common),
            "RESTROOM" => Some(LocationType::Restroom),
            "PUBLIC" => Some(LocationType::Public),
            "PRIVATE" => Some(LocationType::Private),
            "MISC" => Some(LocationType::Misc),
            _ => None,
        }
    }
}

impl std::fmt::Display for LocationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// FLOOR PLAN TYPES
// =============================================================================

/// Opaque handle to a stored floor plan image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ImageRef {
    /// Backend-relative storage path.
    pub path: String,
    /// MIME type detected at upload time.
    pub content_type: String,
}

/// A floor plan: an uploaded image plus metadata, owned by one actor.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct FloorPlan {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub image: Option<ImageRef>,
    /// Image pixel width; 1.0 until an image is attached.
    pub width: f64,
    /// Image pixel height; 1.0 until an image is attached.
    pub height: f64,
    pub is_trashed: bool,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl FloorPlan {
    /// Aspect ratio derived from the image dimensions. Never stored;
    /// recomputed so it can't go stale when the image changes.
    pub fn aspect_ratio(&self) -> f64 {
        self.height / self.width
    }
}

/// Summary view of a floor plan for listing.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct FloorPlanSummary {
    pub id: Uuid,
    pub name: String,
    pub image: Option<ImageRef>,
    pub aspect_ratio: f64,
    pub is_public: bool,
    pub last_updated: DateTime<Utc>,
}

/// Full floor plan representation returned by the detail endpoints:
/// the plan, its owner's name, and its current non-trashed locations.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct FloorPlanDetail {
    pub id: Uuid,
    pub owner: Uuid,
    pub owner_name: String,
    pub name: String,
    pub image: Option<ImageRef>,
    pub aspect_ratio: f64,
    pub locations: Vec<Location>,
    pub is_trashed: bool,
    pub is_public: bool,
    pub last_updated: DateTime<Utc>,
}

impl FloorPlanDetail {
    /// Assemble the wire representation from its parts.
    pub fn assemble(plan: FloorPlan, owner_name: String, locations: Vec<Location>) -> Self {
        Self {
            id: plan.id,
            owner: plan.owner_id,
            owner_name,
            aspect_ratio: plan.aspect_ratio(),
            name: plan.name,
            image: plan.image,
            locations,
            is_trashed: plan.is_trashed,
            is_public: plan.is_public,
            last_updated: plan.last_updated,
        }
    }
}

// =============================================================================
// LOCATION ENTITY
// =============================================================================

/// A named point placed at coordinates on a floor plan.
///
/// Coordinates are opaque floats in the floor plan's coordinate space;
/// the server applies no range validation beyond the numeric type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Location {
    pub id: Uuid,
    pub floorplan: Uuid,
    pub name: String,
    pub loc_type: LocationType,
    pub details: String,
    pub extension: Option<i32>,
    pub position_x: f64,
    pub position_y: f64,
    pub is_trashed: bool,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

// =============================================================================
// ACTOR TYPES
// =============================================================================

/// The requester whose identity the access guard compares against
/// floor plan ownership.
#[derive(Debug, Clone, PartialEq)]
pub enum Actor {
    /// Authenticated user resolved from a bearer token.
    User { id: Uuid, username: String },
    /// Unauthenticated requester; never an owner.
    Anonymous,
}

impl Actor {
    pub fn is_authenticated(&self) -> bool {
        !matches!(self, Actor::Anonymous)
    }

    /// The user id, if authenticated.
    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            Actor::User { id, .. } => Some(*id),
            Actor::Anonymous => None,
        }
    }
}

/// A registered user account.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// REQUEST PAYLOADS
// =============================================================================

/// A client-submitted location record, as it arrives in a batch.
///
/// Every field is optional: records with an `id` are update candidates with
/// partial-update semantics (absent fields are left unchanged), records
/// without an `id` are create candidates. The `floorplan` field is accepted
/// for shape compatibility but always overridden with the request-path plan
/// id before anything is applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct LocationPayload {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub floorplan: Option<Uuid>,
    #[serde(default)]
    pub name: Option<String>,
    /// Raw choice string; validated against [`LocationType`] so an unknown
    /// value produces a field error instead of a deserialization failure.
    #[serde(default)]
    pub loc_type: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub extension: Option<i32>,
    #[serde(default)]
    pub position_x: Option<f64>,
    #[serde(default)]
    pub position_y: Option<f64>,
    #[serde(default)]
    pub is_trashed: Option<bool>,
}

/// Floor-plan fields submitted on update/reconcile requests.
#[derive(Debug, Clone, Default, Deserialize, Serialize, utoipa::ToSchema)]
pub struct FloorPlanPayload {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub is_public: Option<bool>,
    #[serde(default)]
    pub is_trashed: Option<bool>,
    /// Location batch; only honored by the full-reconciliation endpoint.
    #[serde(default)]
    pub locations: Option<Vec<LocationPayload>>,
}

/// Request body for creating a floor plan.
#[derive(Debug, Clone, Deserialize, Serialize, utoipa::ToSchema)]
pub struct CreateFloorPlanRequest {
    pub name: String,
    #[serde(default)]
    pub is_public: bool,
}

// =============================================================================
// OUTCOMES
// =============================================================================

/// Rows touched by a successfully applied batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ReconcileOutcome {
    pub updated: Vec<Location>,
    pub created: Vec<Location>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_type_round_trip() {
        for lt in LocationType::ALL {
            assert_eq!(LocationType::parse(lt.as_str()), Some(lt));
        }
    }

    #[test]
    fn test_location_type_rejects_unknown() {
        assert_eq!(LocationType::parse("LOUNGE"), None);
        assert_eq!(LocationType::parse("desk"), None);
        assert_eq!(LocationType::parse(""), None);
    }

    #[test]
    fn test_location_type_serde_wire_names() {
        let json = serde_json::to_string(&LocationType::Confr).unwrap();
        assert_eq!(json, "\"CONFR\"");

        let parsed: LocationType = serde_json::from_str("\"RESTROOM\"").unwrap();
        assert_eq!(parsed, LocationType::Restroom);
    }

    #[test]
    fn test_aspect_ratio_is_derived() {
        let now = Utc::now();
        let mut plan = FloorPlan {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            name: "HQ".to_string(),
            image: None,
            width: 1600.0,
            height: 900.0,
            is_trashed: false,
            is_public: false,
            created_at: now,
            last_updated: now,
        };
        assert!((plan.aspect_ratio() - 0.5625).abs() < f64::EPSILON);

        // Swapping in a new image changes the ratio with no other bookkeeping.
        plan.width = 1000.0;
        plan.height = 2000.0;
        assert!((plan.aspect_ratio() - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_location_payload_accepts_sparse_records() {
        let payload: LocationPayload =
            serde_json::from_str(r#"{"id":"00000000-0000-0000-0000-000000000001","name":"Desk 9"}"#)
                .unwrap();
        assert!(payload.id.is_some());
        assert_eq!(payload.name.as_deref(), Some("Desk 9"));
        assert!(payload.loc_type.is_none());
        assert!(payload.position_x.is_none());
    }

    #[test]
    fn test_actor_anonymous_is_not_authenticated() {
        assert!(!Actor::Anonymous.is_authenticated());
        assert_eq!(Actor::Anonymous.user_id(), None);

        let id = Uuid::new_v4();
        let user = Actor::User {
            id,
            username: "pat".to_string(),
        };
        assert!(user.is_authenticated());
        assert_eq!(user.user_id(), Some(id));
    }
}
