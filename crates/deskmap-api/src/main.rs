//! deskmap-api - HTTP API server for deskmap

mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use uuid::Uuid;

use deskmap_core::{Actor, Error, UserRepository, ValidationReport};
use deskmap_db::{Database, FilesystemBackend};

use handlers::{
    floorplans::{
        create_floorplan, delete_floorplan, get_floorplan, get_floorplan_image, list_floorplans,
        reconcile_floorplan, update_floorplan, upload_floorplan_image,
    },
    locations::{create_locations, list_locations, update_locations},
    users::{create_user, current_user},
};

/// Maximum accepted request body: covers floor plan image uploads.
const MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

// =============================================================================
// REQUEST ID (UUIDv7)
// =============================================================================

/// Generates time-ordered UUIDv7 request correlation IDs.
///
/// UUIDv7 embeds a Unix timestamp, so IDs sort chronologically. Useful for
/// log correlation and debugging production incidents.
#[derive(Clone, Default)]
struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

// =============================================================================
// APPLICATION STATE
// =============================================================================

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
}

/// OpenAPI documentation served at /openapi.json.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Deskmap API",
        description = "Floor plan and location mapping backend"
    ),
    components(schemas(
        deskmap_core::FloorPlan,
        deskmap_core::FloorPlanDetail,
        deskmap_core::FloorPlanSummary,
        deskmap_core::FloorPlanPayload,
        deskmap_core::CreateFloorPlanRequest,
        deskmap_core::Location,
        deskmap_core::LocationType,
        deskmap_core::LocationPayload,
        deskmap_core::ReconcileOutcome,
        deskmap_core::ImageRef,
        deskmap_core::User,
    ))
)]
struct ApiDoc;

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

// =============================================================================
// AUTHENTICATION MIDDLEWARE
// =============================================================================

/// Resolve the request's bearer token to an [`Actor`] and stash it in the
/// request extensions. Requests without an Authorization header proceed as
/// anonymous; an unknown token is rejected outright.
async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string);

    let actor = match token {
        Some(token) => match state.db.users.find_by_token(&token).await? {
            Some(user) => Actor::User {
                id: user.id,
                username: user.username,
            },
            None => {
                return Err(ApiError::Unauthorized(
                    "invalid or expired token".to_string(),
                ))
            }
        },
        None => Actor::Anonymous,
    };

    request.extensions_mut().insert(actor);
    Ok(next.run(request).await)
}

// =============================================================================
// HEALTH CHECK
// =============================================================================

async fn health_check(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    sqlx::query("SELECT 1")
        .execute(state.db.pool())
        .await
        .map_err(Error::Database)?;

    Ok(Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    })))
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

fn init_tracing() {
    // Environment variables:
    //   LOG_FORMAT  - "json" or "text" (default: "text")
    //   RUST_LOG    - standard env filter
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "deskmap_api=debug,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(env_filter);
    if log_format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn cors_layer() -> CorsLayer {
    let allowed_origins: Vec<HeaderValue> = std::env::var("CORS_ALLOWED_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:3000,http://localhost:5173".to_string())
        .split(',')
        .filter_map(|origin| origin.trim().parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();
    init_tracing();

    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "postgres://localhost/deskmap".to_string());
    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse()
        .unwrap_or(3000);

    info!("Connecting to database...");
    let db = Database::connect(&database_url).await?;
    info!("Database connected");

    info!("Running database migrations...");
    db.migrate().await?;
    info!("Database migrations complete");

    // Initialize image storage
    let image_storage_path = std::env::var("IMAGE_STORAGE_PATH")
        .unwrap_or_else(|_| "/var/lib/deskmap/images".to_string());
    if let Err(e) = FilesystemBackend::new(&image_storage_path).validate().await {
        warn!(
            subsystem = "storage",
            error = %e,
            "Image storage failed its startup health check; uploads will fail"
        );
    }
    let db = db.with_image_storage(&image_storage_path);
    info!("Image storage initialized at {}", image_storage_path);

    let state = AppState { db: Arc::new(db) };

    // Build router
    let app = Router::new()
        // Health check
        .route("/health", get(health_check))
        // OpenAPI
        .route("/openapi.json", get(openapi_json))
        // Users
        .route("/api/v1/users", post(create_user))
        .route("/api/v1/users/me", get(current_user))
        // Floor plans
        .route(
            "/api/v1/floorplans",
            get(list_floorplans).post(create_floorplan),
        )
        .route(
            "/api/v1/floorplans/:id",
            get(get_floorplan)
                .put(update_floorplan)
                .post(reconcile_floorplan)
                .delete(delete_floorplan),
        )
        .route(
            "/api/v1/floorplans/:id/image",
            get(get_floorplan_image).post(upload_floorplan_image),
        )
        // Locations
        .route(
            "/api/v1/floorplans/:id/locations",
            get(list_locations)
                .post(create_locations)
                .put(update_locations),
        )
        // Middleware
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(cors_layer())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// =============================================================================
// ERROR HANDLING
// =============================================================================

#[derive(Debug)]
pub enum ApiError {
    Database(deskmap_core::Error),
    Validation(ValidationReport),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    BadRequest(String),
    Conflict(String),
    /// Image/persistence backend failure; surfaced distinctly, not retried.
    StorageUnavailable(String),
}

impl From<deskmap_core::Error> for ApiError {
    fn from(err: deskmap_core::Error) -> Self {
        match err {
            Error::NotFound(msg) => ApiError::NotFound(msg),
            Error::FloorPlanNotFound(id) => ApiError::NotFound(format!("Floor plan {}", id)),
            Error::LocationNotFound(id) => ApiError::NotFound(format!("Location {}", id)),
            Error::Validation(report) => ApiError::Validation(report),
            Error::Unauthorized(msg) => ApiError::Unauthorized(msg),
            Error::Forbidden(msg) => ApiError::Forbidden(msg),
            Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            Error::Storage(msg) => ApiError::StorageUnavailable(msg),
            Error::Database(sqlx_err) => {
                let msg = sqlx_err.to_string();
                if msg.contains("duplicate key") || msg.contains("unique constraint") {
                    let friendly_msg = if msg.contains("app_user_username_key") {
                        "A user with this name already exists".to_string()
                    } else {
                        msg
                    };
                    return ApiError::Conflict(friendly_msg);
                }
                ApiError::Database(Error::Database(sqlx_err))
            }
            other => ApiError::Database(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            // Aggregated validation failures keep their three collections.
            ApiError::Validation(report) => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({ "errors": report }),
            ),
            ApiError::Database(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                serde_json::json!({ "error": err.to_string() }),
            ),
            ApiError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, serde_json::json!({ "error": msg }))
            }
            ApiError::Forbidden(msg) => {
                (StatusCode::FORBIDDEN, serde_json::json!({ "error": msg }))
            }
            ApiError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, serde_json::json!({ "error": msg }))
            }
            ApiError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, serde_json::json!({ "error": msg }))
            }
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, serde_json::json!({ "error": msg })),
            ApiError::StorageUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                serde_json::json!({ "error": msg }),
            ),
        };

        (status, Json(body)).into_response()
    }
}
