//! Wire-shape tests for the floor plan endpoints.

use chrono::Utc;
use deskmap_core::{
    CreateFloorPlanRequest, FloorPlan, FloorPlanDetail, FloorPlanPayload, ImageRef,
};
use uuid::Uuid;

fn sample_plan(owner_id: Uuid) -> FloorPlan {
    let now = Utc::now();
    FloorPlan {
        id: Uuid::new_v4(),
        owner_id,
        name: "Building A".to_string(),
        image: Some(ImageRef {
            path: "floorplans/ab/abcd".to_string(),
            content_type: "image/png".to_string(),
        }),
        width: 1600.0,
        height: 1200.0,
        is_trashed: false,
        is_public: true,
        created_at: now,
        last_updated: now,
    }
}

#[test]
fn test_create_request_defaults_to_private() {
    let req: CreateFloorPlanRequest = serde_json::from_str(r#"{"name":"Building A"}"#).unwrap();
    assert_eq!(req.name, "Building A");
    assert!(!req.is_public);
}

#[test]
fn test_update_payload_accepts_partial_fields() {
    let payload: FloorPlanPayload = serde_json::from_str(r#"{"is_public":true}"#).unwrap();
    assert!(payload.name.is_none());
    assert_eq!(payload.is_public, Some(true));
    assert!(payload.locations.is_none());
}

#[test]
fn test_reconcile_payload_carries_locations_list() {
    let payload: FloorPlanPayload = serde_json::from_str(
        r#"{
            "name":"Building A v2",
            "locations":[
                {"name":"Desk 1","loc_type":"DESK","position_x":0.5,"position_y":0.25}
            ]
        }"#,
    )
    .unwrap();

    let locations = payload.locations.unwrap();
    assert_eq!(locations.len(), 1);
    assert!(locations[0].id.is_none());
    assert_eq!(locations[0].name.as_deref(), Some("Desk 1"));
}

#[test]
fn test_detail_response_includes_derived_aspect_ratio_and_owner_name() {
    let owner_id = Uuid::new_v4();
    let plan = sample_plan(owner_id);
    let detail = FloorPlanDetail::assemble(plan, "pat".to_string(), Vec::new());

    let json = serde_json::to_value(&detail).unwrap();
    assert_eq!(json["owner"], owner_id.to_string());
    assert_eq!(json["owner_name"], "pat");
    assert_eq!(json["aspect_ratio"], 0.75);
    assert_eq!(json["image"]["content_type"], "image/png");
    assert!(json["locations"].as_array().unwrap().is_empty());
}
