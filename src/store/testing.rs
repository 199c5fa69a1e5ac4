//! Fault-injecting store for unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rust_decimal::Decimal;

use super::sqlite::SqliteStore;
use super::{StoreError, TableStore};
use crate::db::queries;
use crate::models::{Booking, Car, CarFilters, DateRange, Location, NewBooking};

pub enum InsertFault {
    /// Reject the insert with this error.
    Fail(StoreError),
    /// Commit the row, then report a timeout as if the response was lost.
    LandThenTimeout,
}

pub struct FlakyStore {
    pub inner: SqliteStore,
    read_failures: AtomicUsize,
    conflict_check_fails: AtomicBool,
    insert_faults: Mutex<VecDeque<InsertFault>>,
    calls: Mutex<Vec<&'static str>>,
}

impl FlakyStore {
    pub fn empty() -> Arc<Self> {
        Arc::new(Self {
            inner: SqliteStore::open(":memory:").unwrap(),
            read_failures: AtomicUsize::new(0),
            conflict_check_fails: AtomicBool::new(false),
            insert_faults: Mutex::new(VecDeque::new()),
            calls: Mutex::new(vec![]),
        })
    }

    pub fn seeded() -> Arc<Self> {
        let store = Self::empty();
        seed_catalog(&store.inner);
        store
    }

    /// The next `n` catalog reads fail with a transport error.
    pub fn fail_reads(&self, n: usize) {
        self.read_failures.store(n, Ordering::SeqCst);
    }

    pub fn fail_conflict_check(&self) {
        self.conflict_check_fails.store(true, Ordering::SeqCst);
    }

    pub fn push_insert_fault(&self, fault: InsertFault) {
        self.insert_faults.lock().unwrap().push_back(fault);
    }

    pub fn call_count(&self, name: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| **c == name).count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn record(&self, name: &'static str) {
        self.calls.lock().unwrap().push(name);
    }

    fn take_read_failure(&self) -> Result<(), StoreError> {
        let failed = self
            .read_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            Err(StoreError::Unavailable("connection reset".to_string()))
        } else {
            Ok(())
        }
    }
}

/// Seeds six cars (one unavailable) and four locations (one inactive).
pub fn seed_catalog(store: &SqliteStore) -> (Vec<i64>, Vec<i64>) {
    let conn = store.connection();
    let conn = conn.lock().unwrap();

    let cars = [
        ("Agya", "economy", "manual", 35, true),
        ("Avanza", "mpv", "manual", 45, true),
        ("Fortuner", "suv", "automatic", 95, true),
        ("Rush", "suv", "manual", 60, true),
        ("Pajero", "suv", "automatic", 120, true),
        ("Terios", "suv", "automatic", 55, false),
    ];
    let car_ids = cars
        .iter()
        .map(|(name, category, transmission, price, available)| {
            queries::insert_car(
                &conn,
                &Car {
                    id: 0,
                    name: name.to_string(),
                    category: category.to_string(),
                    transmission: transmission.to_string(),
                    seats: 5,
                    fuel_type: "Petrol".to_string(),
                    price_per_day: Decimal::new(*price, 0),
                    is_available: *available,
                    image_url: None,
                    is_featured: false,
                },
            )
            .unwrap()
        })
        .collect();

    let locations = [
        ("Ngurah Rai Airport", "Denpasar", true),
        ("Tanjung Perak Harbour", "Surabaya", true),
        ("Bandung Station", "Bandung", true),
        ("Old Depot", "Jakarta", false),
    ];
    let location_ids = locations
        .iter()
        .map(|(name, city, active)| {
            queries::insert_location(
                &conn,
                &Location {
                    id: 0,
                    name: name.to_string(),
                    address: "Jl. Raya 1".to_string(),
                    city: city.to_string(),
                    is_active: *active,
                    hours: Some("08:00-20:00".to_string()),
                    phone: None,
                },
            )
            .unwrap()
        })
        .collect();

    (car_ids, location_ids)
}

#[async_trait]
impl TableStore for FlakyStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.record("ping");
        self.inner.ping().await
    }

    async fn verify_schema(&self) -> Result<(), StoreError> {
        self.record("verify_schema");
        self.inner.verify_schema().await
    }

    async fn list_cars(&self, filters: &CarFilters) -> Result<Vec<Car>, StoreError> {
        self.record("list_cars");
        self.take_read_failure()?;
        self.inner.list_cars(filters).await
    }

    async fn list_locations(&self) -> Result<Vec<Location>, StoreError> {
        self.record("list_locations");
        self.take_read_failure()?;
        self.inner.list_locations().await
    }

    async fn get_location(&self, id: i64) -> Result<Option<Location>, StoreError> {
        self.record("get_location");
        self.inner.get_location(id).await
    }

    async fn find_conflicting_bookings(
        &self,
        car_id: i64,
        period: &DateRange,
    ) -> Result<Vec<i64>, StoreError> {
        self.record("find_conflicting_bookings");
        if self.conflict_check_fails.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("request timed out".to_string()));
        }
        self.inner.find_conflicting_bookings(car_id, period).await
    }

    async fn insert_booking(&self, booking: &NewBooking) -> Result<Booking, StoreError> {
        self.record("insert_booking");
        let fault = self.insert_faults.lock().unwrap().pop_front();
        match fault {
            Some(InsertFault::Fail(e)) => Err(e),
            Some(InsertFault::LandThenTimeout) => {
                self.inner.insert_booking(booking).await?;
                Err(StoreError::Unavailable("request timed out".to_string()))
            }
            None => self.inner.insert_booking(booking).await,
        }
    }

    async fn find_booking_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Booking>, StoreError> {
        self.record("find_booking_by_reference");
        self.inner.find_booking_by_reference(reference).await
    }

    async fn list_bookings(&self, limit: i64) -> Result<Vec<Booking>, StoreError> {
        self.record("list_bookings");
        self.inner.list_bookings(limit).await
    }
}
