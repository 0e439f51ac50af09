//! Location repository implementation.
//!
//! Batches are planned by `deskmap_core::reconcile` against a snapshot of
//! the plan's current locations, then applied here inside one transaction:
//! either every validated mutation commits or none does.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres, Row, Transaction};
use tracing::debug;
use uuid::Uuid;

use deskmap_core::{
    mark_trashed, plan_create_batch, plan_reconcile, plan_update_batch,
    validate_floorplan_fields, Error, FloorPlanPayload, Location, LocationPayload,
    LocationRepository, LocationType, NewLocation, ReconcileOutcome, Result, ValidationReport,
};

/// PostgreSQL implementation of LocationRepository.
pub struct PgLocationRepository {
    pool: Pool<Postgres>,
}

impl PgLocationRepository {
    /// Create a new PgLocationRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn map_location(row: &sqlx::postgres::PgRow) -> Result<Location> {
    let raw_type: String = row.get("loc_type");
    let loc_type = LocationType::parse(&raw_type)
        .ok_or_else(|| Error::Internal(format!("unknown loc_type {:?} in store", raw_type)))?;

    Ok(Location {
        id: row.get("id"),
        floorplan: row.get("floorplan_id"),
        name: row.get("name"),
        loc_type,
        details: row.get("details"),
        extension: row.get("extension"),
        position_x: row.get("position_x"),
        position_y: row.get("position_y"),
        is_trashed: row.get("is_trashed"),
        created_at: row.get("created_at"),
        last_updated: row.get("last_updated"),
    })
}

const LOCATION_COLUMNS: &str = "id, floorplan_id, name, loc_type, details, extension, \
     position_x, position_y, is_trashed, created_at, last_updated";

/// List a plan's non-trashed locations through any executor (pool or
/// open transaction).
pub(crate) async fn list_active<'e, E>(executor: E, floorplan_id: Uuid) -> Result<Vec<Location>>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    let rows = sqlx::query(&format!(
        "SELECT {} FROM location
         WHERE floorplan_id = $1 AND is_trashed = FALSE
         ORDER BY created_at",
        LOCATION_COLUMNS
    ))
    .bind(floorplan_id)
    .fetch_all(executor)
    .await
    .map_err(Error::Database)?;

    rows.iter().map(map_location).collect()
}

/// Fail with `FloorPlanNotFound` unless the parent plan exists.
async fn ensure_plan_exists(tx: &mut Transaction<'_, Postgres>, floorplan_id: Uuid) -> Result<()> {
    let exists = sqlx::query("SELECT 1 FROM floor_plan WHERE id = $1")
        .bind(floorplan_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(Error::Database)?;

    if exists.is_none() {
        return Err(Error::FloorPlanNotFound(floorplan_id));
    }
    Ok(())
}

/// Persist one merged row. The planner already resolved the id against the
/// plan's current set, so an unaffected update is a store-level surprise.
async fn apply_update(tx: &mut Transaction<'_, Postgres>, row: &Location) -> Result<()> {
    let result = sqlx::query(
        "UPDATE location
         SET name = $1, loc_type = $2, details = $3, extension = $4,
             position_x = $5, position_y = $6, is_trashed = $7, last_updated = $8
         WHERE id = $9 AND floorplan_id = $10",
    )
    .bind(&row.name)
    .bind(row.loc_type.as_str())
    .bind(&row.details)
    .bind(row.extension)
    .bind(row.position_x)
    .bind(row.position_y)
    .bind(row.is_trashed)
    .bind(row.last_updated)
    .bind(row.id)
    .bind(row.floorplan)
    .execute(&mut **tx)
    .await
    .map_err(Error::Database)?;

    if result.rows_affected() == 0 {
        return Err(Error::LocationNotFound(row.id));
    }
    Ok(())
}

async fn insert_new(tx: &mut Transaction<'_, Postgres>, new: &NewLocation) -> Result<Location> {
    let now = Utc::now();
    let row = Location {
        id: Uuid::now_v7(),
        floorplan: new.floorplan,
        name: new.name.clone(),
        loc_type: new.loc_type,
        details: new.details.clone(),
        extension: new.extension,
        position_x: new.position_x,
        position_y: new.position_y,
        is_trashed: new.is_trashed,
        created_at: now,
        last_updated: now,
    };

    sqlx::query(
        "INSERT INTO location
             (id, floorplan_id, name, loc_type, details, extension,
              position_x, position_y, is_trashed, created_at, last_updated)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
    )
    .bind(row.id)
    .bind(row.floorplan)
    .bind(&row.name)
    .bind(row.loc_type.as_str())
    .bind(&row.details)
    .bind(row.extension)
    .bind(row.position_x)
    .bind(row.position_y)
    .bind(row.is_trashed)
    .bind(row.created_at)
    .bind(row.last_updated)
    .execute(&mut **tx)
    .await
    .map_err(Error::Database)?;

    Ok(row)
}

/// Refresh the parent plan's last_updated alongside its mutated children.
async fn touch_parent(tx: &mut Transaction<'_, Postgres>, floorplan_id: Uuid) -> Result<()> {
    sqlx::query("UPDATE floor_plan SET last_updated = $1 WHERE id = $2")
        .bind(Utc::now())
        .bind(floorplan_id)
        .execute(&mut **tx)
        .await
        .map_err(Error::Database)?;
    Ok(())
}

#[async_trait]
impl LocationRepository for PgLocationRepository {
    async fn list_active_by_parent(&self, floorplan_id: Uuid) -> Result<Vec<Location>> {
        list_active(&self.pool, floorplan_id).await
    }

    async fn reconcile(
        &self,
        floorplan_id: Uuid,
        fields: &FloorPlanPayload,
        payloads: Vec<LocationPayload>,
    ) -> Result<ReconcileOutcome> {
        let field_errors = validate_floorplan_fields(fields);
        if !field_errors.is_empty() {
            return Err(Error::Validation(ValidationReport {
                floorplan: field_errors,
                ..Default::default()
            }));
        }

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        ensure_plan_exists(&mut tx, floorplan_id).await?;

        let current = list_active(&mut *tx, floorplan_id).await?;
        let mut plan = plan_reconcile(floorplan_id, payloads, &current)?;

        let now = Utc::now();
        let mut outcome = ReconcileOutcome::default();
        for row in &mut plan.updates {
            row.last_updated = now;
            apply_update(&mut tx, row).await?;
        }
        outcome.updated = plan.updates;
        for new in &plan.creates {
            outcome.created.push(insert_new(&mut tx, new).await?);
        }

        // Floor-plan fields submitted with the batch land in the same
        // transaction; absent fields keep their stored values.
        sqlx::query(
            "UPDATE floor_plan
             SET name = COALESCE($1, name),
                 is_public = COALESCE($2, is_public),
                 is_trashed = COALESCE($3, is_trashed),
                 last_updated = $4
             WHERE id = $5",
        )
        .bind(fields.name.as_deref())
        .bind(fields.is_public)
        .bind(fields.is_trashed)
        .bind(now)
        .bind(floorplan_id)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        tx.commit().await.map_err(Error::Database)?;

        debug!(
            subsystem = "database",
            component = "reconcile",
            floorplan_id = %floorplan_id,
            updated = outcome.updated.len(),
            created = outcome.created.len(),
            skipped = plan.skipped.len(),
            "reconciled location batch"
        );
        Ok(outcome)
    }

    async fn create_batch(
        &self,
        floorplan_id: Uuid,
        payloads: Vec<LocationPayload>,
    ) -> Result<Vec<Location>> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        ensure_plan_exists(&mut tx, floorplan_id).await?;

        let creates = plan_create_batch(floorplan_id, payloads)?;

        let mut created = Vec::with_capacity(creates.len());
        for new in &creates {
            created.push(insert_new(&mut tx, new).await?);
        }
        touch_parent(&mut tx, floorplan_id).await?;

        tx.commit().await.map_err(Error::Database)?;
        Ok(created)
    }

    async fn update_batch(
        &self,
        floorplan_id: Uuid,
        payloads: Vec<LocationPayload>,
        trash: bool,
    ) -> Result<Vec<Location>> {
        let payloads = if trash {
            mark_trashed(payloads)
        } else {
            payloads
        };

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        ensure_plan_exists(&mut tx, floorplan_id).await?;

        let current = list_active(&mut *tx, floorplan_id).await?;
        let mut plan = plan_update_batch(floorplan_id, payloads, &current)?;

        let now = Utc::now();
        for row in &mut plan.updates {
            row.last_updated = now;
            apply_update(&mut tx, row).await?;
        }
        touch_parent(&mut tx, floorplan_id).await?;

        tx.commit().await.map_err(Error::Database)?;
        Ok(plan.updates)
    }
}
