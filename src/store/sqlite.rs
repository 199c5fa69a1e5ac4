use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{Connection, ErrorCode};

use super::{StoreError, TableStore, EXPECTED_SCHEMA};
use crate::db::{self, queries};
use crate::models::{Booking, Car, CarFilters, DateRange, Location, NewBooking};

/// Local store backed by SQLite. Carries the same constraints as the hosted
/// store: unique booking references and no overlapping confirmed bookings.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn open(path: &str) -> anyhow::Result<Self> {
        let conn = db::init_db(path)?;
        Ok(Self::from_connection(conn))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Direct access for seeding and inspection.
    pub fn connection(&self) -> Arc<Mutex<Connection>> {
        Arc::clone(&self.conn)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Unavailable("database lock poisoned".to_string()))
    }
}

fn map_err(err: anyhow::Error) -> StoreError {
    match err.downcast_ref::<rusqlite::Error>() {
        Some(rusqlite::Error::SqliteFailure(failure, message))
            if failure.code == ErrorCode::ConstraintViolation =>
        {
            let message = message.clone().unwrap_or_default();
            if message.contains("booking_overlap") {
                StoreError::Overlap
            } else if message.contains("booking_reference") {
                StoreError::DuplicateReference
            } else {
                StoreError::Rejected {
                    code: "constraint".to_string(),
                    message,
                }
            }
        }
        // A row that does not fit the model or a bad statement will fail the
        // same way on every retry.
        Some(
            e @ (rusqlite::Error::FromSqlConversionFailure(..)
            | rusqlite::Error::InvalidColumnType(..)
            | rusqlite::Error::IntegralValueOutOfRange(..)
            | rusqlite::Error::InvalidColumnIndex(_)
            | rusqlite::Error::InvalidColumnName(_)
            | rusqlite::Error::InvalidParameterName(_)
            | rusqlite::Error::InvalidQuery),
        ) => StoreError::Decode(e.to_string()),
        Some(e) => StoreError::Unavailable(e.to_string()),
        None => StoreError::Decode(format!("{err:#}")),
    }
}

#[async_trait]
impl TableStore for SqliteStore {
    async fn ping(&self) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(())
    }

    async fn verify_schema(&self) -> Result<(), StoreError> {
        let conn = self.lock()?;
        for (table, expected) in EXPECTED_SCHEMA {
            let columns = queries::table_columns(&conn, table).map_err(map_err)?;
            let missing: Vec<&str> = expected
                .iter()
                .copied()
                .filter(|col| !columns.iter().any(|c| c == col))
                .collect();
            if !missing.is_empty() {
                return Err(StoreError::SchemaMismatch(format!(
                    "{table}: missing columns {}",
                    missing.join(", ")
                )));
            }
        }
        Ok(())
    }

    async fn list_cars(&self, filters: &CarFilters) -> Result<Vec<Car>, StoreError> {
        let conn = self.lock()?;
        queries::list_cars(&conn, filters).map_err(map_err)
    }

    async fn list_locations(&self) -> Result<Vec<Location>, StoreError> {
        let conn = self.lock()?;
        queries::list_locations(&conn).map_err(map_err)
    }

    async fn get_location(&self, id: i64) -> Result<Option<Location>, StoreError> {
        let conn = self.lock()?;
        queries::get_location(&conn, id).map_err(map_err)
    }

    async fn find_conflicting_bookings(
        &self,
        car_id: i64,
        period: &DateRange,
    ) -> Result<Vec<i64>, StoreError> {
        let conn = self.lock()?;
        queries::find_conflicting_bookings(&conn, car_id, period).map_err(map_err)
    }

    async fn insert_booking(&self, booking: &NewBooking) -> Result<Booking, StoreError> {
        let conn = self.lock()?;
        queries::create_booking(&conn, booking, Utc::now()).map_err(map_err)
    }

    async fn find_booking_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Booking>, StoreError> {
        let conn = self.lock()?;
        queries::get_booking_by_reference(&conn, reference).map_err(map_err)
    }

    async fn list_bookings(&self, limit: i64) -> Result<Vec<Booking>, StoreError> {
        let conn = self.lock()?;
        queries::get_recent_bookings(&conn, limit).map_err(map_err)
    }
}
