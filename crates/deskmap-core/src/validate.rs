//! Field validation for floor plan and location payloads.
//!
//! Validation is aggregated: every candidate in a batch is checked and all
//! failures are collected before anything is applied. The report keeps three
//! independent collections so a caller can tell which submitted record a
//! failure belongs to.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{
    FloorPlanPayload, LocationPayload, LocationType, FLOOR_PLAN_NAME_MAX, LOCATION_DETAILS_MAX,
    LOCATION_NAME_MAX,
};

/// Per-field error messages for one submitted record.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Aggregated validation failures for one request.
///
/// `updates` and `creates` are keyed by the candidate's index in the
/// submitted `locations` list, so positions survive the update/create split.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub floorplan: FieldErrors,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub updates: BTreeMap<usize, FieldErrors>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub creates: BTreeMap<usize, FieldErrors>,
}

impl ValidationReport {
    pub fn is_empty(&self) -> bool {
        self.floorplan.is_empty() && self.updates.is_empty() && self.creates.is_empty()
    }

    /// Record a floor-plan-level field error.
    pub fn floorplan_error(&mut self, field: &str, message: impl Into<String>) {
        self.floorplan
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }
}

fn push_error(errors: &mut FieldErrors, field: &str, message: impl Into<String>) {
    errors
        .entry(field.to_string())
        .or_default()
        .push(message.into());
}

fn check_name(errors: &mut FieldErrors, name: &str, max: usize) {
    if name.trim().is_empty() {
        push_error(errors, "name", "may not be blank");
    }
    if name.chars().count() > max {
        push_error(
            errors,
            "name",
            format!("must be at most {} characters", max),
        );
    }
}

fn check_loc_type(errors: &mut FieldErrors, raw: &str) {
    if LocationType::parse(raw).is_none() {
        push_error(errors, "loc_type", format!("\"{}\" is not a valid choice", raw));
    }
}

fn check_details(errors: &mut FieldErrors, details: &str) {
    if details.chars().count() > LOCATION_DETAILS_MAX {
        push_error(
            errors,
            "details",
            format!("must be at most {} characters", LOCATION_DETAILS_MAX),
        );
    }
}

fn check_position(errors: &mut FieldErrors, field: &str, value: f64) {
    if !value.is_finite() {
        push_error(errors, field, "must be a finite number");
    }
}

/// Validate a create candidate: name, loc_type and both coordinates are
/// required; details and extension are optional.
pub fn validate_for_create(payload: &LocationPayload) -> FieldErrors {
    let mut errors = FieldErrors::new();

    match &payload.name {
        Some(name) => check_name(&mut errors, name, LOCATION_NAME_MAX),
        None => push_error(&mut errors, "name", "is required"),
    }

    match &payload.loc_type {
        Some(raw) => check_loc_type(&mut errors, raw),
        None => push_error(&mut errors, "loc_type", "is required"),
    }

    if let Some(details) = &payload.details {
        check_details(&mut errors, details);
    }

    match payload.position_x {
        Some(x) => check_position(&mut errors, "position_x", x),
        None => push_error(&mut errors, "position_x", "is required"),
    }
    match payload.position_y {
        Some(y) => check_position(&mut errors, "position_y", y),
        None => push_error(&mut errors, "position_y", "is required"),
    }

    errors
}

/// Validate an update candidate: partial-update semantics, so only the
/// fields actually present are checked.
pub fn validate_for_update(payload: &LocationPayload) -> FieldErrors {
    let mut errors = FieldErrors::new();

    if let Some(name) = &payload.name {
        check_name(&mut errors, name, LOCATION_NAME_MAX);
    }
    if let Some(raw) = &payload.loc_type {
        check_loc_type(&mut errors, raw);
    }
    if let Some(details) = &payload.details {
        check_details(&mut errors, details);
    }
    if let Some(x) = payload.position_x {
        check_position(&mut errors, "position_x", x);
    }
    if let Some(y) = payload.position_y {
        check_position(&mut errors, "position_y", y);
    }

    errors
}

/// Validate floor-plan fields submitted on update/reconcile requests.
pub fn validate_floorplan_fields(payload: &FloorPlanPayload) -> FieldErrors {
    let mut errors = FieldErrors::new();

    if let Some(name) = &payload.name {
        check_name(&mut errors, name, FLOOR_PLAN_NAME_MAX);
    }

    errors
}

/// Validate a floor plan name at creation time, where it is mandatory.
pub fn validate_floorplan_name(name: &str) -> FieldErrors {
    let mut errors = FieldErrors::new();
    check_name(&mut errors, name, FLOOR_PLAN_NAME_MAX);
    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_candidate() -> LocationPayload {
        LocationPayload {
            name: Some("Desk 1".to_string()),
            loc_type: Some("DESK".to_string()),
            position_x: Some(0.5),
            position_y: Some(0.25),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_create_candidate_passes() {
        assert!(validate_for_create(&create_candidate()).is_empty());
    }

    #[test]
    fn test_create_requires_name_type_and_coordinates() {
        let errors = validate_for_create(&LocationPayload::default());
        assert!(errors.contains_key("name"));
        assert!(errors.contains_key("loc_type"));
        assert!(errors.contains_key("position_x"));
        assert!(errors.contains_key("position_y"));
        assert!(!errors.contains_key("details"));
        assert!(!errors.contains_key("extension"));
    }

    #[test]
    fn test_create_rejects_unknown_loc_type() {
        let mut payload = create_candidate();
        payload.loc_type = Some("HALLWAY".to_string());
        let errors = validate_for_create(&payload);
        assert_eq!(
            errors["loc_type"],
            vec!["\"HALLWAY\" is not a valid choice".to_string()]
        );
    }

    #[test]
    fn test_create_rejects_blank_name() {
        let mut payload = create_candidate();
        payload.name = Some("   ".to_string());
        assert!(validate_for_create(&payload).contains_key("name"));
    }

    #[test]
    fn test_create_rejects_overlong_fields() {
        let mut payload = create_candidate();
        payload.name = Some("x".repeat(LOCATION_NAME_MAX + 1));
        payload.details = Some("y".repeat(LOCATION_DETAILS_MAX + 1));
        let errors = validate_for_create(&payload);
        assert!(errors.contains_key("name"));
        assert!(errors.contains_key("details"));
    }

    #[test]
    fn test_name_at_limit_is_accepted() {
        let mut payload = create_candidate();
        payload.name = Some("x".repeat(LOCATION_NAME_MAX));
        assert!(validate_for_create(&payload).is_empty());
    }

    #[test]
    fn test_update_checks_only_present_fields() {
        let payload = LocationPayload {
            id: Some(uuid::Uuid::new_v4()),
            details: Some("by the window".to_string()),
            ..Default::default()
        };
        assert!(validate_for_update(&payload).is_empty());
    }

    #[test]
    fn test_update_rejects_bad_loc_type() {
        let payload = LocationPayload {
            id: Some(uuid::Uuid::new_v4()),
            loc_type: Some("CUBICLE".to_string()),
            ..Default::default()
        };
        assert!(validate_for_update(&payload).contains_key("loc_type"));
    }

    #[test]
    fn test_update_rejects_non_finite_position() {
        let payload = LocationPayload {
            id: Some(uuid::Uuid::new_v4()),
            position_x: Some(f64::NAN),
            ..Default::default()
        };
        assert!(validate_for_update(&payload).contains_key("position_x"));
    }

    #[test]
    fn test_floorplan_name_rules() {
        assert!(validate_floorplan_name("Building A, Level 2").is_empty());
        assert!(validate_floorplan_name("").contains_key("name"));
        assert!(validate_floorplan_name(&"n".repeat(FLOOR_PLAN_NAME_MAX + 1)).contains_key("name"));
    }

    #[test]
    fn test_report_is_empty_only_when_all_collections_are() {
        let mut report = ValidationReport::default();
        assert!(report.is_empty());

        report.creates.insert(0, {
            let mut e = FieldErrors::new();
            push_error(&mut e, "name", "is required");
            e
        });
        assert!(!report.is_empty());
    }

    #[test]
    fn test_report_serializes_sparse() {
        let mut report = ValidationReport::default();
        report.floorplan_error("name", "may not be blank");

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["floorplan"]["name"][0], "may not be blank");
        assert!(json.get("updates").is_none());
        assert!(json.get("creates").is_none());
    }
}
