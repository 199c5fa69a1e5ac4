use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::{BookingConfirmation, BookingDetails, BookingRequest};
use crate::services::catalog::CatalogSnapshot;
use crate::state::AppState;

const DEFAULT_LIST_LIMIT: i64 = 50;
const MAX_LIST_LIMIT: i64 = 200;

/// The booking form refers to the car and location the customer saw. When the
/// held snapshot does not know them (restart, filtered refresh), reload once.
async fn snapshot_for(
    state: &AppState,
    request: &BookingRequest,
) -> Result<CatalogSnapshot, AppError> {
    let snapshot = state.current_snapshot();

    let car_known = request.car_id.map_or(true, |id| snapshot.car(id).is_some());
    let location_known = request
        .pickup_location_id
        .map_or(true, |id| snapshot.location(id).is_some());
    if car_known && location_known {
        return Ok(snapshot);
    }

    tracing::debug!(car_id = ?request.car_id, "catalog snapshot stale, reloading");
    let fresh = state.catalog.load_snapshot().await?;
    state.replace_snapshot(fresh.clone());
    Ok(fresh)
}

// POST /api/bookings
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(request): Json<BookingRequest>,
) -> Result<(StatusCode, Json<BookingConfirmation>), AppError> {
    let snapshot = snapshot_for(&state, &request).await?;
    let confirmation = state.bookings.submit(&snapshot, &request).await?;
    Ok((StatusCode::CREATED, Json(confirmation)))
}

// GET /api/bookings/:reference
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    Path(reference): Path<String>,
) -> Result<Json<BookingDetails>, AppError> {
    let details = state.bookings.find_by_reference(&reference).await?;
    Ok(Json(details))
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
}

// GET /api/bookings (DEBUG_ROUTES only)
pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<BookingDetails>>, AppError> {
    if !state.config.debug_routes {
        return Err(AppError::NotFound("Page".to_string()));
    }

    let limit = query
        .limit
        .unwrap_or(DEFAULT_LIST_LIMIT)
        .clamp(1, MAX_LIST_LIMIT);
    let bookings = state.bookings.list_recent(limit).await?;
    Ok(Json(bookings))
}
