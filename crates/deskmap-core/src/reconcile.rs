//! Batch reconciliation planning.
//!
//! Given a floor plan and a client-submitted batch of location records, the
//! planner decides which existing rows get updated in place, which records
//! become new rows, and which are dropped. The planner is pure: it validates
//! and merges against a snapshot of the plan's current locations, and the
//! store layer applies the resulting plan in a single transaction.
//!
//! Rules, in order:
//! 1. Records carrying an `id` are update candidates; records without one
//!    are create candidates.
//! 2. Every create candidate's parent reference is overridden with the
//!    request-path floor plan id; client-supplied parents are never trusted.
//! 3. All candidates are validated before anything is merged; any failure
//!    aborts the whole batch with an aggregated [`ValidationReport`].
//! 4. An update candidate whose id doesn't resolve within the plan's current
//!    non-trashed locations is silently skipped. This covers ids that are
//!    stale, already trashed, or belong to another floor plan.

use tracing::debug;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{Location, LocationPayload, LocationType};
use crate::partition::partition;
use crate::validate::{validate_for_create, validate_for_update, ValidationReport};

/// A fully validated row to insert, parent reference already injected.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLocation {
    pub floorplan: Uuid,
    pub name: String,
    pub loc_type: LocationType,
    pub details: String,
    pub extension: Option<i32>,
    pub position_x: f64,
    pub position_y: f64,
    pub is_trashed: bool,
}

/// The outcome of planning a batch: what to update, what to insert,
/// and which update ids were dropped.
#[derive(Debug, Clone, Default)]
pub struct ReconcilePlan {
    /// Existing rows with the submitted fields merged in, ready to persist.
    pub updates: Vec<Location>,
    /// Rows to insert with store-assigned ids.
    pub creates: Vec<NewLocation>,
    /// Update ids that did not resolve and were skipped.
    pub skipped: Vec<Uuid>,
}

/// Force the trashed flag on every payload in a batch.
///
/// The trash toggle reuses the ordinary update path with this override
/// applied before validation, so a trash request is just an update batch
/// where `is_trashed` is always true.
pub fn mark_trashed(payloads: Vec<LocationPayload>) -> Vec<LocationPayload> {
    payloads
        .into_iter()
        .map(|mut p| {
            p.is_trashed = Some(true);
            p
        })
        .collect()
}

/// Validate every candidate of a mixed batch without planning it: records
/// carrying an id get the update rules, records without get the create
/// rules, and errors are keyed by the candidate's submitted position.
pub fn validate_reconcile_batch(payloads: &[LocationPayload]) -> ValidationReport {
    let mut report = ValidationReport::default();
    for (idx, payload) in payloads.iter().enumerate() {
        if payload.id.is_some() {
            let errors = validate_for_update(payload);
            if !errors.is_empty() {
                report.updates.insert(idx, errors);
            }
        } else {
            let errors = validate_for_create(payload);
            if !errors.is_empty() {
                report.creates.insert(idx, errors);
            }
        }
    }
    report
}

/// Plan a full reconciliation: split into update and create candidates,
/// validate everything, then merge and build rows.
pub fn plan_reconcile(
    floorplan_id: Uuid,
    payloads: Vec<LocationPayload>,
    current: &[Location],
) -> Result<ReconcilePlan> {
    let report = validate_reconcile_batch(&payloads);
    if !report.is_empty() {
        return Err(Error::Validation(report));
    }

    let indexed: Vec<(usize, LocationPayload)> = payloads.into_iter().enumerate().collect();
    let (update_candidates, create_candidates) =
        partition(indexed, |(_, p): &(usize, LocationPayload)| p.id.is_some());

    let mut plan = ReconcilePlan::default();
    apply_updates(&mut plan, update_candidates, current)?;
    for (_, payload) in create_candidates {
        plan.creates.push(build_new(floorplan_id, payload)?);
    }

    Ok(plan)
}

/// Plan an update-only batch (PUT /locations): every record must carry an
/// id, stale ids are skipped, nothing is created.
pub fn plan_update_batch(
    floorplan_id: Uuid,
    payloads: Vec<LocationPayload>,
    current: &[Location],
) -> Result<ReconcilePlan> {
    let mut report = ValidationReport::default();
    for (idx, payload) in payloads.iter().enumerate() {
        let mut errors = validate_for_update(payload);
        if payload.id.is_none() {
            errors
                .entry("id".to_string())
                .or_default()
                .push("is required".to_string());
        }
        if !errors.is_empty() {
            report.updates.insert(idx, errors);
        }
    }
    if !report.is_empty() {
        return Err(Error::Validation(report));
    }

    let mut plan = ReconcilePlan::default();
    apply_updates(
        &mut plan,
        payloads.into_iter().enumerate().collect(),
        current,
    )?;

    debug!(
        floorplan_id = %floorplan_id,
        updated = plan.updates.len(),
        skipped = plan.skipped.len(),
        "planned update batch"
    );
    Ok(plan)
}

/// Plan a create-only batch (POST /locations): client-supplied ids are
/// ignored, every record becomes a new row under the request's plan.
pub fn plan_create_batch(
    floorplan_id: Uuid,
    payloads: Vec<LocationPayload>,
) -> Result<Vec<NewLocation>> {
    let mut report = ValidationReport::default();
    for (idx, payload) in payloads.iter().enumerate() {
        let errors = validate_for_create(payload);
        if !errors.is_empty() {
            report.creates.insert(idx, errors);
        }
    }
    if !report.is_empty() {
        return Err(Error::Validation(report));
    }

    payloads
        .into_iter()
        .map(|p| build_new(floorplan_id, p))
        .collect()
}

fn apply_updates(
    plan: &mut ReconcilePlan,
    candidates: Vec<(usize, LocationPayload)>,
    current: &[Location],
) -> Result<()> {
    let by_id: std::collections::HashMap<Uuid, &Location> =
        current.iter().map(|loc| (loc.id, loc)).collect();

    for (_, payload) in candidates {
        let id = payload
            .id
            .ok_or_else(|| Error::Internal("update candidate lost its id".to_string()))?;
        match by_id.get(&id) {
            Some(existing) => plan.updates.push(merge_into(existing, &payload)?),
            None => {
                debug!(location_id = %id, "update candidate does not resolve, skipping");
                plan.skipped.push(id);
            }
        }
    }
    Ok(())
}

/// Merge the submitted fields onto an existing row; absent fields are left
/// unchanged.
fn merge_into(existing: &Location, payload: &LocationPayload) -> Result<Location> {
    let mut row = existing.clone();
    if let Some(name) = &payload.name {
        row.name = name.clone();
    }
    if let Some(raw) = &payload.loc_type {
        row.loc_type = parse_loc_type(raw)?;
    }
    if let Some(details) = &payload.details {
        row.details = details.clone();
    }
    if let Some(extension) = payload.extension {
        row.extension = Some(extension);
    }
    if let Some(x) = payload.position_x {
        row.position_x = x;
    }
    if let Some(y) = payload.position_y {
        row.position_y = y;
    }
    if let Some(trashed) = payload.is_trashed {
        row.is_trashed = trashed;
    }
    Ok(row)
}

fn build_new(floorplan_id: Uuid, payload: LocationPayload) -> Result<NewLocation> {
    // Fields were validated as present; a miss here is a planner bug.
    let missing = |field: &str| Error::Internal(format!("create candidate lost field {}", field));

    Ok(NewLocation {
        floorplan: floorplan_id,
        name: payload.name.ok_or_else(|| missing("name"))?,
        loc_type: parse_loc_type(&payload.loc_type.ok_or_else(|| missing("loc_type"))?)?,
        details: payload.details.unwrap_or_default(),
        extension: payload.extension,
        position_x: payload.position_x.ok_or_else(|| missing("position_x"))?,
        position_y: payload.position_y.ok_or_else(|| missing("position_y"))?,
        is_trashed: payload.is_trashed.unwrap_or(false),
    })
}

fn parse_loc_type(raw: &str) -> Result<LocationType> {
    LocationType::parse(raw)
        .ok_or_else(|| Error::Internal(format!("loc_type {:?} escaped validation", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn existing(id: Uuid, floorplan: Uuid, name: &str) -> Location {
        let now = Utc::now();
        Location {
            id,
            floorplan,
            name: name.to_string(),
            loc_type: LocationType::Desk,
            details: String::new(),
            extension: Some(4101),
            position_x: 0.1,
            position_y: 0.2,
            is_trashed: false,
            created_at: now,
            last_updated: now,
        }
    }

    fn create_payload(name: &str) -> LocationPayload {
        LocationPayload {
            name: Some(name.to_string()),
            loc_type: Some("OFFICE".to_string()),
            position_x: Some(0.5),
            position_y: Some(0.25),
            ..Default::default()
        }
    }

    #[test]
    fn test_mixed_batch_updates_and_creates() {
        let plan_id = Uuid::new_v4();
        let loc_id = Uuid::new_v4();
        let current = vec![existing(loc_id, plan_id, "Desk 1")];

        let payloads = vec![
            LocationPayload {
                id: Some(loc_id),
                name: Some("Desk 1A".to_string()),
                ..Default::default()
            },
            create_payload("Corner office"),
        ];

        let plan = plan_reconcile(plan_id, payloads, &current).unwrap();
        assert_eq!(plan.updates.len(), 1);
        assert_eq!(plan.creates.len(), 1);
        assert!(plan.skipped.is_empty());

        let updated = &plan.updates[0];
        assert_eq!(updated.id, loc_id);
        assert_eq!(updated.name, "Desk 1A");
        // Unspecified fields come through unchanged.
        assert_eq!(updated.loc_type, LocationType::Desk);
        assert_eq!(updated.extension, Some(4101));
        assert_eq!(updated.position_x, 0.1);

        assert_eq!(plan.creates[0].floorplan, plan_id);
        assert_eq!(plan.creates[0].loc_type, LocationType::Office);
    }

    #[test]
    fn test_create_candidate_parent_is_injected() {
        let plan_id = Uuid::new_v4();
        let mut payload = create_payload("Desk 2");
        // A client-supplied parent reference must never survive.
        payload.floorplan = Some(Uuid::new_v4());

        let plan = plan_reconcile(plan_id, vec![payload], &[]).unwrap();
        assert_eq!(plan.creates[0].floorplan, plan_id);
    }

    #[test]
    fn test_one_invalid_candidate_fails_whole_batch() {
        let plan_id = Uuid::new_v4();
        let loc_id = Uuid::new_v4();
        let current = vec![existing(loc_id, plan_id, "Desk 1")];

        let payloads = vec![
            LocationPayload {
                id: Some(loc_id),
                name: Some("Desk 1A".to_string()),
                ..Default::default()
            },
            LocationPayload {
                name: Some("Broken".to_string()),
                loc_type: Some("WAREHOUSE".to_string()),
                position_x: Some(0.0),
                position_y: Some(0.0),
                ..Default::default()
            },
        ];

        let err = plan_reconcile(plan_id, payloads, &current).unwrap_err();
        match err {
            Error::Validation(report) => {
                // The invalid create candidate is reported at its submitted
                // position; the valid update produced no plan at all.
                assert!(report.updates.is_empty());
                assert!(report.creates[&1].contains_key("loc_type"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_unresolvable_update_id_is_silently_skipped() {
        let plan_id = Uuid::new_v4();
        let stale = Uuid::new_v4();
        let current = vec![existing(Uuid::new_v4(), plan_id, "Desk 1")];

        let payloads = vec![LocationPayload {
            id: Some(stale),
            name: Some("Ghost".to_string()),
            ..Default::default()
        }];

        let plan = plan_reconcile(plan_id, payloads, &current).unwrap();
        assert!(plan.updates.is_empty());
        assert!(plan.creates.is_empty());
        assert_eq!(plan.skipped, vec![stale]);
    }

    #[test]
    fn test_update_batch_requires_ids() {
        let plan_id = Uuid::new_v4();
        let err = plan_update_batch(plan_id, vec![create_payload("No id")], &[]).unwrap_err();
        match err {
            Error::Validation(report) => {
                assert_eq!(report.updates[&0]["id"], vec!["is required".to_string()]);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_update_batch_never_creates() {
        let plan_id = Uuid::new_v4();
        let loc_id = Uuid::new_v4();
        let current = vec![existing(loc_id, plan_id, "Desk 1")];

        let plan = plan_update_batch(
            plan_id,
            vec![LocationPayload {
                id: Some(loc_id),
                position_x: Some(0.9),
                ..Default::default()
            }],
            &current,
        )
        .unwrap();

        assert!(plan.creates.is_empty());
        assert_eq!(plan.updates[0].position_x, 0.9);
        assert_eq!(plan.updates[0].position_y, 0.2);
    }

    #[test]
    fn test_create_batch_ignores_client_ids() {
        let plan_id = Uuid::new_v4();
        let mut payload = create_payload("Desk 3");
        payload.id = Some(Uuid::new_v4());

        let creates = plan_create_batch(plan_id, vec![payload]).unwrap();
        assert_eq!(creates.len(), 1);
        assert_eq!(creates[0].floorplan, plan_id);
    }

    #[test]
    fn test_create_batch_aggregates_errors_per_position() {
        let plan_id = Uuid::new_v4();
        let payloads = vec![
            create_payload("Fine"),
            LocationPayload::default(),
            LocationPayload {
                name: Some(String::new()),
                loc_type: Some("DESK".to_string()),
                position_x: Some(0.0),
                position_y: Some(0.0),
                ..Default::default()
            },
        ];

        let err = plan_create_batch(plan_id, payloads).unwrap_err();
        match err {
            Error::Validation(report) => {
                assert!(!report.creates.contains_key(&0));
                assert!(report.creates[&1].contains_key("name"));
                assert!(report.creates[&1].contains_key("position_x"));
                assert!(report.creates[&2].contains_key("name"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_mark_trashed_forces_flag() {
        let payloads = vec![
            LocationPayload {
                id: Some(Uuid::new_v4()),
                is_trashed: Some(false),
                ..Default::default()
            },
            LocationPayload {
                id: Some(Uuid::new_v4()),
                ..Default::default()
            },
        ];

        let marked = mark_trashed(payloads);
        assert!(marked.iter().all(|p| p.is_trashed == Some(true)));
    }

    #[test]
    fn test_trash_of_already_trashed_location_is_noop() {
        // A trashed row is not part of the active set, so re-trashing it
        // resolves to a silent skip: success, no side effects.
        let plan_id = Uuid::new_v4();
        let trashed_id = Uuid::new_v4();
        let current = vec![existing(Uuid::new_v4(), plan_id, "Desk 1")];

        let payloads = mark_trashed(vec![LocationPayload {
            id: Some(trashed_id),
            ..Default::default()
        }]);

        let plan = plan_update_batch(plan_id, payloads, &current).unwrap();
        assert!(plan.updates.is_empty());
        assert_eq!(plan.skipped, vec![trashed_id]);
    }

    #[test]
    fn test_untrash_via_update_restores_row() {
        let plan_id = Uuid::new_v4();
        let loc_id = Uuid::new_v4();
        let mut row = existing(loc_id, plan_id, "Desk 1");
        row.is_trashed = true;
        // Restoration goes through the same merge path against a snapshot
        // that includes the trashed row.
        let plan = plan_update_batch(
            plan_id,
            vec![LocationPayload {
                id: Some(loc_id),
                is_trashed: Some(false),
                ..Default::default()
            }],
            &[row],
        )
        .unwrap();
        assert!(!plan.updates[0].is_trashed);
    }
}
