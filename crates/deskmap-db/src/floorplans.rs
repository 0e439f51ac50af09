//! Floor plan repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use deskmap_core::{
    validate_floorplan_fields, validate_floorplan_name, CreateFloorPlanRequest, Error, FloorPlan,
    FloorPlanDetail, FloorPlanPayload, FloorPlanRepository, FloorPlanSummary, ImageRef, Result,
    ValidationReport,
};

use crate::locations::list_active;

/// PostgreSQL implementation of FloorPlanRepository.
pub struct PgFloorPlanRepository {
    pool: Pool<Postgres>,
}

impl PgFloorPlanRepository {
    /// Create a new PgFloorPlanRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

/// Map a database row to a FloorPlan.
pub(crate) fn map_floor_plan(row: &sqlx::postgres::PgRow) -> FloorPlan {
    let image_path: Option<String> = row.get("image_path");
    let image_content_type: Option<String> = row.get("image_content_type");
    let image = match (image_path, image_content_type) {
        (Some(path), Some(content_type)) => Some(ImageRef { path, content_type }),
        _ => None,
    };

    FloorPlan {
        id: row.get("id"),
        owner_id: row.get("owner_id"),
        name: row.get("name"),
        image,
        width: row.get("width"),
        height: row.get("height"),
        is_trashed: row.get("is_trashed"),
        is_public: row.get("is_public"),
        created_at: row.get("created_at"),
        last_updated: row.get("last_updated"),
    }
}

const FLOOR_PLAN_COLUMNS: &str = "id, owner_id, name, image_path, image_content_type, \
     width, height, is_trashed, is_public, created_at, last_updated";

#[async_trait]
impl FloorPlanRepository for PgFloorPlanRepository {
    async fn insert(&self, owner_id: Uuid, req: CreateFloorPlanRequest) -> Result<FloorPlan> {
        let errors = validate_floorplan_name(&req.name);
        if !errors.is_empty() {
            let report = ValidationReport {
                floorplan: errors,
                ..Default::default()
            };
            return Err(Error::Validation(report));
        }

        let id = Uuid::now_v7();
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO floor_plan (id, owner_id, name, is_public, created_at, last_updated)
             VALUES ($1, $2, $3, $4, $5, $5)",
        )
        .bind(id)
        .bind(owner_id)
        .bind(&req.name)
        .bind(req.is_public)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        self.fetch(id).await
    }

    async fn fetch(&self, id: Uuid) -> Result<FloorPlan> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM floor_plan WHERE id = $1",
            FLOOR_PLAN_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.map(|r| map_floor_plan(&r))
            .ok_or(Error::FloorPlanNotFound(id))
    }

    async fn fetch_detail(&self, id: Uuid) -> Result<FloorPlanDetail> {
        let plan = self.fetch(id).await?;

        let owner_name: String = sqlx::query("SELECT username FROM app_user WHERE id = $1")
            .bind(plan.owner_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?
            .map(|r| r.get("username"))
            .ok_or_else(|| Error::Internal(format!("floor plan {} has no owner row", id)))?;

        let locations = list_active(&self.pool, id).await?;

        Ok(FloorPlanDetail::assemble(plan, owner_name, locations))
    }

    async fn list_for_owner(&self, owner_id: Uuid) -> Result<Vec<FloorPlanSummary>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM floor_plan
             WHERE owner_id = $1 AND is_trashed = FALSE
             ORDER BY last_updated DESC",
            FLOOR_PLAN_COLUMNS
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .iter()
            .map(|r| {
                let plan = map_floor_plan(r);
                FloorPlanSummary {
                    id: plan.id,
                    aspect_ratio: plan.aspect_ratio(),
                    name: plan.name,
                    image: plan.image,
                    is_public: plan.is_public,
                    last_updated: plan.last_updated,
                }
            })
            .collect())
    }

    async fn update_fields(&self, id: Uuid, payload: &FloorPlanPayload) -> Result<FloorPlan> {
        let errors = validate_floorplan_fields(payload);
        if !errors.is_empty() {
            let report = ValidationReport {
                floorplan: errors,
                ..Default::default()
            };
            return Err(Error::Validation(report));
        }

        let mut plan = self.fetch(id).await?;
        if let Some(name) = &payload.name {
            plan.name = name.clone();
        }
        if let Some(is_public) = payload.is_public {
            plan.is_public = is_public;
        }
        if let Some(is_trashed) = payload.is_trashed {
            plan.is_trashed = is_trashed;
        }
        plan.last_updated = Utc::now();

        sqlx::query(
            "UPDATE floor_plan
             SET name = $1, is_public = $2, is_trashed = $3, last_updated = $4
             WHERE id = $5",
        )
        .bind(&plan.name)
        .bind(plan.is_public)
        .bind(plan.is_trashed)
        .bind(plan.last_updated)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(plan)
    }

    async fn set_image(&self, id: Uuid, image: &ImageRef, width: f64, height: f64) -> Result<()> {
        let result = sqlx::query(
            "UPDATE floor_plan
             SET image_path = $1, image_content_type = $2,
                 width = $3, height = $4, last_updated = $5
             WHERE id = $6",
        )
        .bind(&image.path)
        .bind(&image.content_type)
        .bind(width)
        .bind(height)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::FloorPlanNotFound(id));
        }
        Ok(())
    }

    async fn soft_delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query(
            "UPDATE floor_plan SET is_trashed = TRUE, last_updated = $1 WHERE id = $2",
        )
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::FloorPlanNotFound(id));
        }
        Ok(())
    }
}
