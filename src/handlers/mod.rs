pub mod bookings;
pub mod catalog;
pub mod health;

use std::sync::Arc;

use axum::http::{header, Method};
use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// JSON API used by the storefront page.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health::health))
        .route("/api/cars", get(catalog::list_cars))
        .route("/api/locations", get(catalog::list_locations))
        .route(
            "/api/bookings",
            get(bookings::list_bookings).post(bookings::create_booking),
        )
        .route("/api/bookings/:reference", get(bookings::get_booking))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
