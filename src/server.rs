//! Catalog HTTP server.
//!
//! Exposes the query, pagination, and ranking engine as a JSON HTTP
//! API.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/items/search` | Keyword search (`query`, `cursor`, `limit`) |
//! | `GET`  | `/items/browse` | Genre browse (`genres`, `cursor`, `limit`) |
//! | `GET`  | `/items/combined` | Keyword + genre search (genres must *all* match) |
//! | `GET`  | `/items/recommend` | Ranked "more like this" (`tags`, `authors`, `genres`, `exclude`) |
//! | `GET`  | `/items/{external_id}` | Single item lookup |
//! | `GET`  | `/genres` | Genre list with item counts |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! Listing responses share one shape: `{ "data": [...], "next_cursor":
//! "<opaque>" | null, "has_more": bool }`. A malformed or expired
//! cursor silently restarts from the first page; a query with zero
//! matches is a `200` with an empty page. Multi-value parameters
//! (`genres`, `tags`, `authors`, `exclude`) are comma-separated.
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "query must not be empty" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404), `internal` (500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted to support
//! browser-based catalog clients.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::{Config, PagingConfig};
use crate::cursor;
use crate::models::{ContentItem, Cursor, Page, TagCount};
use crate::page::fetch_page;
use crate::query::{build_filter, GenreMode};
use crate::rank::{recommend, RecommendRequest};
use crate::store::sqlite::SqliteStore;
use crate::store::Store;
use crate::{db, migrate};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    store: Arc<dyn Store>,
    paging: PagingConfig,
}

/// Starts the catalog HTTP server.
///
/// Binds to the address configured in `[server].bind`, running
/// migrations first so a fresh database works without a separate
/// `init`. The server runs indefinitely until the process is
/// terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    migrate::run_migrations(config).await?;
    let pool = db::connect(config).await?;

    let state = AppState {
        store: Arc::new(SqliteStore::new(pool)),
        paging: config.paging.clone(),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/items/search", get(handle_search))
        .route("/items/browse", get(handle_browse))
        .route("/items/combined", get(handle_combined))
        .route("/items/recommend", get(handle_recommend))
        .route("/items/{external_id}", get(handle_get_item))
        .route("/genres", get(handle_genres))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state);

    let bind_addr = config.server.bind.clone();
    println!("Catalog server listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    /// Machine-readable error code (e.g., `"bad_request"`, `"not_found"`).
    code: String,
    /// Human-readable error message.
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

/// Constructs a 400 Bad Request error.
fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

/// Constructs a 404 Not Found error.
fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

/// Constructs a 500 error for store failures.
fn internal(err: anyhow::Error) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: err.to_string(),
    }
}

// ============ Shared query parameters ============

/// Parameters common to every listing endpoint.
#[derive(Deserialize)]
struct ListingParams {
    query: Option<String>,
    genres: Option<String>,
    tags: Option<String>,
    authors: Option<String>,
    exclude: Option<String>,
    cursor: Option<String>,
    limit: Option<i64>,
}

impl ListingParams {
    /// Clamp the requested page size into `[1, max_limit]`, falling
    /// back to the configured default when absent.
    fn page_limit(&self, paging: &PagingConfig) -> i64 {
        self.limit
            .unwrap_or(paging.default_limit)
            .clamp(1, paging.max_limit)
    }

    /// Lenient cursor decode; malformed tokens restart from page one.
    fn decode_cursor(&self) -> Option<Cursor> {
        cursor::decode_opt(self.cursor.as_deref())
    }
}

/// Split a comma-separated multi-value parameter, dropping empty
/// segments so `"a,,b"` and `"a, b"` both normalize to two values.
fn split_csv(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /items/search ============

/// Keyword search across title, author, and tags.
async fn handle_search(
    State(state): State<AppState>,
    Query(params): Query<ListingParams>,
) -> Result<Json<Page<ContentItem>>, AppError> {
    let query = params
        .query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| bad_request("query must not be empty"))?;

    let filter = build_filter(Some(query), &[], GenreMode::Any);
    let page = fetch_page(
        state.store.as_ref(),
        &filter,
        params.decode_cursor(),
        params.page_limit(&state.paging),
    )
    .await
    .map_err(internal)?;
    Ok(Json(page))
}

// ============ GET /items/browse ============

/// Genre browse: items tagged with *any* of the requested genres.
async fn handle_browse(
    State(state): State<AppState>,
    Query(params): Query<ListingParams>,
) -> Result<Json<Page<ContentItem>>, AppError> {
    let genres = split_csv(params.genres.as_deref());
    if genres.is_empty() {
        return Err(bad_request("genres must not be empty"));
    }

    let filter = build_filter(None, &genres, GenreMode::Any);
    let page = fetch_page(
        state.store.as_ref(),
        &filter,
        params.decode_cursor(),
        params.page_limit(&state.paging),
    )
    .await
    .map_err(internal)?;
    Ok(Json(page))
}

// ============ GET /items/combined ============

/// Keyword search narrowed by genres. Unlike a plain browse, *every*
/// requested genre must be present on a match.
async fn handle_combined(
    State(state): State<AppState>,
    Query(params): Query<ListingParams>,
) -> Result<Json<Page<ContentItem>>, AppError> {
    let query = params
        .query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| bad_request("query must not be empty"))?;
    let genres = split_csv(params.genres.as_deref());
    if genres.is_empty() {
        return Err(bad_request("genres must not be empty"));
    }

    let filter = build_filter(Some(query), &genres, GenreMode::All);
    let page = fetch_page(
        state.store.as_ref(),
        &filter,
        params.decode_cursor(),
        params.page_limit(&state.paging),
    )
    .await
    .map_err(internal)?;
    Ok(Json(page))
}

// ============ GET /items/recommend ============

/// Ranked "more like this" listing seeded from an item's tags, author,
/// and genres. Without any seeds the candidate pool is the whole
/// catalog and the ranking degenerates to rating and popularity alone.
async fn handle_recommend(
    State(state): State<AppState>,
    Query(params): Query<ListingParams>,
) -> Result<Json<Page<ContentItem>>, AppError> {
    let req = RecommendRequest {
        seed_genres: split_csv(params.genres.as_deref()),
        seed_tags: split_csv(params.tags.as_deref()),
        seed_authors: split_csv(params.authors.as_deref()),
        exclude_ids: split_csv(params.exclude.as_deref()),
    };

    let page = recommend(
        state.store.as_ref(),
        &req,
        params.decode_cursor(),
        params.page_limit(&state.paging),
        state.paging.candidate_k,
    )
    .await
    .map_err(internal)?;
    Ok(Json(page))
}

// ============ GET /items/{external_id} ============

async fn handle_get_item(
    State(state): State<AppState>,
    Path(external_id): Path<String>,
) -> Result<Json<ContentItem>, AppError> {
    let item = state
        .store
        .get_item(&external_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| not_found(format!("no item with external_id: {}", external_id)))?;
    Ok(Json(item))
}

// ============ GET /genres ============

#[derive(Deserialize)]
struct GenresParams {
    limit: Option<i64>,
}

#[derive(Serialize)]
struct GenresResponse {
    genres: Vec<TagCount>,
}

/// The genre list shown in the UI is the tag-count ranking.
async fn handle_genres(
    State(state): State<AppState>,
    Query(params): Query<GenresParams>,
) -> Result<Json<GenresResponse>, AppError> {
    let limit = params.limit.unwrap_or(100).clamp(1, 1000);
    let genres = state
        .store
        .tag_counts(limit)
        .await
        .map_err(internal)?;
    Ok(Json(GenresResponse { genres }))
}
