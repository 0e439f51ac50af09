//! Object-level access control for floor plans.
//!
//! A pure predicate over the actor, the plan's owner, and its public flag.
//! Handlers evaluate it per object before touching a floor plan or its
//! locations, and fail closed: a plan the actor may not read is surfaced as
//! not-found so its existence is never leaked.

use crate::models::{Actor, FloorPlan};

/// What the request is trying to do to the floor plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Write,
    Delete,
}

/// True when the actor owns the plan.
pub fn is_owner(actor: &Actor, plan: &FloorPlan) -> bool {
    actor.user_id() == Some(plan.owner_id)
}

/// Decide whether `actor` may perform `action` on `plan`.
///
/// Reads are allowed for the owner or, when the plan is public, anyone.
/// Writes and deletes are owner-only; the public flag grants read access,
/// never write access.
pub fn authorize(actor: &Actor, plan: &FloorPlan, action: Action) -> bool {
    match action {
        Action::Read => plan.is_public || is_owner(actor, plan),
        Action::Write | Action::Delete => is_owner(actor, plan),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn plan_owned_by(owner_id: Uuid, is_public: bool) -> FloorPlan {
        let now = Utc::now();
        FloorPlan {
            id: Uuid::new_v4(),
            owner_id,
            name: "Floor 3".to_string(),
            image: None,
            width: 1.0,
            height: 1.0,
            is_trashed: false,
            is_public,
            created_at: now,
            last_updated: now,
        }
    }

    fn user(id: Uuid) -> Actor {
        Actor::User {
            id,
            username: "someone".to_string(),
        }
    }

    #[test]
    fn test_owner_can_do_everything() {
        let owner_id = Uuid::new_v4();
        let plan = plan_owned_by(owner_id, false);
        let owner = user(owner_id);

        assert!(authorize(&owner, &plan, Action::Read));
        assert!(authorize(&owner, &plan, Action::Write));
        assert!(authorize(&owner, &plan, Action::Delete));
    }

    #[test]
    fn test_private_plan_denies_other_actors() {
        let plan = plan_owned_by(Uuid::new_v4(), false);
        let stranger = user(Uuid::new_v4());

        assert!(!authorize(&stranger, &plan, Action::Read));
        assert!(!authorize(&stranger, &plan, Action::Write));
    }

    #[test]
    fn test_public_plan_grants_read_only() {
        let plan = plan_owned_by(Uuid::new_v4(), true);
        let stranger = user(Uuid::new_v4());

        assert!(authorize(&stranger, &plan, Action::Read));
        assert!(!authorize(&stranger, &plan, Action::Write));
        assert!(!authorize(&stranger, &plan, Action::Delete));
    }

    #[test]
    fn test_anonymous_gets_public_read_path_only() {
        let private = plan_owned_by(Uuid::new_v4(), false);
        let public = plan_owned_by(Uuid::new_v4(), true);

        assert!(!authorize(&Actor::Anonymous, &private, Action::Read));
        assert!(authorize(&Actor::Anonymous, &public, Action::Read));
        assert!(!authorize(&Actor::Anonymous, &public, Action::Write));
        assert!(!authorize(&Actor::Anonymous, &public, Action::Delete));
    }
}
