use std::collections::HashMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{
    Booking, BookingConfirmation, BookingDetails, BookingRequest, BookingStatus, DateRange,
    NewBooking,
};
use crate::services::catalog::CatalogSnapshot;
use crate::services::reference;
use crate::services::validation::validate_booking;
use crate::store::{StoreError, TableStore};

#[derive(Debug, Clone)]
pub struct WorkflowSettings {
    /// Proceed when the availability query itself fails.
    pub fail_open: bool,
    pub reference_prefix: String,
    /// Inserts attempted with fresh references before giving up on collisions.
    pub max_reference_attempts: u32,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            fail_open: true,
            reference_prefix: "DE".to_string(),
            max_reference_attempts: 3,
        }
    }
}

/// Price for a rental period. Exact decimal arithmetic, no rounding.
pub fn quote(price_per_day: Decimal, period: &DateRange) -> (i64, Decimal) {
    let total_days = period.total_days();
    (total_days, price_per_day * Decimal::from(total_days))
}

#[derive(Clone)]
pub struct BookingWorkflow {
    store: Arc<dyn TableStore>,
    settings: WorkflowSettings,
}

impl BookingWorkflow {
    pub fn new(store: Arc<dyn TableStore>, mut settings: WorkflowSettings) -> Self {
        // A prefix that fails the lookup shape check would make stored
        // bookings unreachable by their own reference.
        if !reference::is_valid_prefix(&settings.reference_prefix) {
            let fallback = WorkflowSettings::default().reference_prefix;
            tracing::warn!(
                prefix = %settings.reference_prefix,
                %fallback,
                "invalid booking reference prefix, using default"
            );
            settings.reference_prefix = fallback;
        }
        Self { store, settings }
    }

    /// Validate, check availability, price, persist. `snapshot` is the catalog
    /// the customer booked from; the car's price is taken from it.
    pub async fn submit(
        &self,
        snapshot: &CatalogSnapshot,
        request: &BookingRequest,
    ) -> Result<BookingConfirmation, AppError> {
        let attempt = Uuid::new_v4();
        let form = validate_booking(request, snapshot)?;
        let car = form.car;

        let availability_verified = self.check_availability(car.id, &form.period).await?;

        let (total_days, total_price) = quote(car.price_per_day, &form.period);

        let new_booking = NewBooking {
            car_id: car.id,
            car_name: car.name.clone(),
            customer_name: form.customer_name,
            customer_email: form.customer_email,
            customer_phone: form.customer_phone,
            pickup_location_id: form.location.id,
            pickup_date: form.period.pickup_date,
            return_date: form.period.return_date,
            total_days,
            total_price,
            notes: form.notes,
            status: BookingStatus::Confirmed,
            booking_reference: reference::generate(&self.settings.reference_prefix),
        };

        let booking = self.persist(new_booking).await?;

        tracing::info!(
            %attempt,
            reference = %booking.booking_reference,
            car_id = booking.car_id,
            total_days,
            %total_price,
            availability_verified,
            "booking confirmed"
        );

        Ok(BookingConfirmation {
            details: BookingDetails {
                booking,
                pickup_location: form.location.display_name(),
            },
            availability_verified,
        })
    }

    /// Ok(true) when the store confirmed the car is free, Ok(false) when the
    /// check failed and the workflow is failing open.
    async fn check_availability(&self, car_id: i64, period: &DateRange) -> Result<bool, AppError> {
        match self.store.find_conflicting_bookings(car_id, period).await {
            Ok(conflicts) if conflicts.is_empty() => Ok(true),
            Ok(conflicts) => {
                tracing::info!(car_id, conflicts = conflicts.len(), "car already booked for requested dates");
                Err(AppError::NotAvailable)
            }
            Err(e) if self.settings.fail_open => {
                tracing::warn!(car_id, error = %e, "availability check failed, relying on store constraints");
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn persist(&self, mut booking: NewBooking) -> Result<Booking, AppError> {
        let mut attempts = 1;
        loop {
            match self.store.insert_booking(&booking).await {
                Ok(stored) => return Ok(stored),
                Err(StoreError::DuplicateReference)
                    if attempts < self.settings.max_reference_attempts =>
                {
                    tracing::warn!(reference = %booking.booking_reference, "booking reference collision, regenerating");
                    booking.booking_reference =
                        reference::generate(&self.settings.reference_prefix);
                    attempts += 1;
                }
                Err(e) if e.is_transient() => return self.recover_insert(&booking, e).await,
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// The insert's outcome is unknown. The reference doubles as an idempotency
    /// key: look it up, and only if absent insert again under the same reference.
    async fn recover_insert(
        &self,
        booking: &NewBooking,
        cause: StoreError,
    ) -> Result<Booking, AppError> {
        let reference = booking.booking_reference.as_str();
        tracing::warn!(reference, error = %cause, "booking insert outcome unknown, checking by reference");

        if let Some(existing) = self.store.find_booking_by_reference(reference).await? {
            if is_same_booking(&existing, booking) {
                return Ok(existing);
            }
            return Err(AppError::StoreUnavailable(format!(
                "reference {reference} belongs to another booking"
            )));
        }

        match self.store.insert_booking(booking).await {
            Ok(stored) => Ok(stored),
            // A concurrent replay of our own insert won the unique index.
            Err(StoreError::DuplicateReference) => self
                .store
                .find_booking_by_reference(reference)
                .await?
                .filter(|existing| is_same_booking(existing, booking))
                .ok_or_else(|| {
                    AppError::StoreUnavailable(format!("reference {reference} belongs to another booking"))
                }),
            Err(e) => Err(e.into()),
        }
    }

    /// A stored booking by its reference, with the pickup location resolved.
    pub async fn find_by_reference(&self, reference: &str) -> Result<BookingDetails, AppError> {
        if !reference::is_well_formed(reference) {
            return Err(AppError::NotFound("Booking".to_string()));
        }

        let booking = self
            .store
            .find_booking_by_reference(reference)
            .await?
            .ok_or_else(|| AppError::NotFound("Booking".to_string()))?;

        let pickup_location = self.location_label(booking.pickup_location_id).await?;
        Ok(BookingDetails {
            booking,
            pickup_location,
        })
    }

    /// Newest bookings first, for operators.
    pub async fn list_recent(&self, limit: i64) -> Result<Vec<BookingDetails>, AppError> {
        let bookings = self.store.list_bookings(limit).await?;

        let mut labels: HashMap<i64, String> = HashMap::new();
        let mut details = Vec::with_capacity(bookings.len());
        for booking in bookings {
            let id = booking.pickup_location_id;
            let pickup_location = match labels.get(&id) {
                Some(label) => label.clone(),
                None => {
                    let label = self.location_label(id).await?;
                    labels.insert(id, label.clone());
                    label
                }
            };
            details.push(BookingDetails {
                booking,
                pickup_location,
            });
        }
        Ok(details)
    }

    async fn location_label(&self, id: i64) -> Result<String, AppError> {
        Ok(self
            .store
            .get_location(id)
            .await?
            .map(|l| l.display_name())
            .unwrap_or_else(|| format!("Location #{id}")))
    }
}

fn is_same_booking(stored: &Booking, booking: &NewBooking) -> bool {
    stored.car_id == booking.car_id
        && stored.customer_email == booking.customer_email
        && stored.period() == booking.period()
}
