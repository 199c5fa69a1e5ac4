use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;

use crate::errors::AppError;
use crate::models::{Car, CarFilters, Location};
use crate::state::AppState;

// GET /api/cars?category=&transmission=
pub async fn list_cars(
    State(state): State<Arc<AppState>>,
    Query(filters): Query<CarFilters>,
) -> Result<Json<Vec<Car>>, AppError> {
    let cars = state.catalog.list_cars(&filters).await?;

    // A filtered search is a view; only the full list replaces the snapshot.
    if filters.is_empty() {
        state.update_snapshot(|snapshot| {
            snapshot.cars = cars.clone();
            snapshot.fetched_at = Some(chrono::Utc::now());
        });
    }

    Ok(Json(cars))
}

// GET /api/locations
pub async fn list_locations(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Location>>, AppError> {
    let locations = state.catalog.list_locations().await?;

    state.update_snapshot(|snapshot| {
        snapshot.locations = locations.clone();
        snapshot.fetched_at = Some(chrono::Utc::now());
    });

    Ok(Json(locations))
}
