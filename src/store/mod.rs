pub mod postgrest;
pub mod sqlite;
#[cfg(test)]
pub mod testing;

use async_trait::async_trait;

use crate::models::{Booking, Car, CarFilters, DateRange, Location, NewBooking};

/// Columns the workflow reads or writes, per table. Checked once at startup.
pub const EXPECTED_SCHEMA: &[(&str, &[&str])] = &[
    (
        "cars",
        &[
            "id",
            "name",
            "category",
            "transmission",
            "seats",
            "fuel_type",
            "price_per_day",
            "is_available",
            "image_url",
            "is_featured",
        ],
    ),
    (
        "locations",
        &["id", "name", "address", "city", "is_active", "hours", "phone"],
    ),
    (
        "bookings",
        &[
            "id",
            "car_id",
            "car_name",
            "customer_name",
            "customer_email",
            "customer_phone",
            "pickup_location_id",
            "pickup_date",
            "return_date",
            "total_days",
            "total_price",
            "notes",
            "status",
            "booking_reference",
            "created_at",
        ],
    ),
];

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Network failure, timeout or a 5xx from the store.
    #[error("store unreachable: {0}")]
    Unavailable(String),

    #[error("store rejected request ({code}): {message}")]
    Rejected { code: String, message: String },

    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    /// The exclusion constraint refused an overlapping confirmed booking.
    #[error("booking overlaps an existing confirmed booking")]
    Overlap,

    #[error("booking reference already exists")]
    DuplicateReference,

    #[error("unexpected store response: {0}")]
    Decode(String),
}

impl StoreError {
    /// Only transport-level failures are worth repeating.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

/// The remote tabular store holding cars, locations and bookings.
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Cheap round trip used by the health check.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Fails with `SchemaMismatch` when a table or column in `EXPECTED_SCHEMA` is missing.
    async fn verify_schema(&self) -> Result<(), StoreError>;

    /// Available cars matching `filters`, cheapest first.
    async fn list_cars(&self, filters: &CarFilters) -> Result<Vec<Car>, StoreError>;

    /// Active locations ordered by city.
    async fn list_locations(&self) -> Result<Vec<Location>, StoreError>;

    async fn get_location(&self, id: i64) -> Result<Option<Location>, StoreError>;

    /// Ids of confirmed bookings for `car_id` whose period intersects `period`.
    async fn find_conflicting_bookings(
        &self,
        car_id: i64,
        period: &DateRange,
    ) -> Result<Vec<i64>, StoreError>;

    async fn insert_booking(&self, booking: &NewBooking) -> Result<Booking, StoreError>;

    async fn find_booking_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Booking>, StoreError>;

    /// Most recent bookings first.
    async fn list_bookings(&self, limit: i64) -> Result<Vec<Booking>, StoreError>;
}
