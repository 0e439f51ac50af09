//! # deskmap-core
//!
//! Core types, traits, and abstractions for the deskmap backend.
//!
//! This crate provides the domain model (floor plans, locations, actors),
//! the batch reconciliation planner, object-level access control, field
//! validation, and the trait definitions the store and API crates depend on.

pub mod access;
pub mod error;
pub mod image_meta;
pub mod logging;
pub mod models;
pub mod partition;
pub mod reconcile;
pub mod traits;
pub mod validate;

// Re-export commonly used types at crate root
pub use access::{authorize, is_owner, Action};
pub use error::{Error, Result};
pub use image_meta::{probe_image, ImageMeta};
pub use models::*;
pub use partition::partition;
pub use reconcile::{
    mark_trashed, plan_create_batch, plan_reconcile, plan_update_batch, validate_reconcile_batch,
    NewLocation, ReconcilePlan,
};
pub use traits::*;
pub use validate::{
    validate_floorplan_fields, validate_floorplan_name, validate_for_create, validate_for_update,
    FieldErrors, ValidationReport,
};
