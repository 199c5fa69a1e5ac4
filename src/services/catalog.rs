use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::errors::AppError;
use crate::models::{Car, CarFilters, Location};
use crate::store::{StoreError, TableStore};

const READ_RETRY_DELAY: Duration = Duration::from_millis(200);

/// The last catalog fetched from the store. Replaced wholesale on refresh and
/// handed to the booking workflow explicitly.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    pub cars: Vec<Car>,
    pub locations: Vec<Location>,
    pub fetched_at: Option<DateTime<Utc>>,
}

impl CatalogSnapshot {
    pub fn car(&self, id: i64) -> Option<&Car> {
        self.cars.iter().find(|c| c.id == id)
    }

    pub fn location(&self, id: i64) -> Option<&Location> {
        self.locations.iter().find(|l| l.id == id)
    }
}

#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn TableStore>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        Self { store }
    }

    /// Available cars matching `filters`, cheapest first. An empty result is not an error.
    pub async fn list_cars(&self, filters: &CarFilters) -> Result<Vec<Car>, AppError> {
        let cars = with_read_retry("cars", || self.store.list_cars(filters)).await?;
        tracing::debug!(count = cars.len(), ?filters, "loaded cars");
        Ok(cars)
    }

    pub async fn list_locations(&self) -> Result<Vec<Location>, AppError> {
        let locations = with_read_retry("locations", || self.store.list_locations()).await?;
        tracing::debug!(count = locations.len(), "loaded locations");
        Ok(locations)
    }

    /// Fetches the unfiltered catalog; cars and locations are loaded concurrently.
    pub async fn load_snapshot(&self) -> Result<CatalogSnapshot, AppError> {
        let all = CarFilters::default();
        let (cars, locations) = tokio::try_join!(self.list_cars(&all), self.list_locations())?;

        Ok(CatalogSnapshot {
            cars,
            locations,
            fetched_at: Some(Utc::now()),
        })
    }
}

/// One bounded retry for idempotent reads, only on transport failures.
async fn with_read_retry<T, F, Fut>(resource: &str, mut call: F) -> Result<T, StoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
{
    match call().await {
        Err(e) if e.is_transient() => {
            tracing::warn!(resource, error = %e, "store read failed, retrying once");
            tokio::time::sleep(READ_RETRY_DELAY).await;
            call().await
        }
        other => other,
    }
}
