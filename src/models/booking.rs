use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A reservation as stored. `id` and `created_at` are assigned by the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Booking {
    pub id: i64,
    pub car_id: i64,
    pub car_name: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub pickup_location_id: i64,
    pub pickup_date: NaiveDate,
    pub return_date: NaiveDate,
    pub total_days: i64,
    pub total_price: Decimal,
    #[serde(default)]
    pub notes: Option<String>,
    pub status: BookingStatus,
    pub booking_reference: String,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    pub fn period(&self) -> DateRange {
        DateRange::new(self.pickup_date, self.return_date)
    }
}

/// Insert payload for the `bookings` table.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewBooking {
    pub car_id: i64,
    pub car_name: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub pickup_location_id: i64,
    pub pickup_date: NaiveDate,
    pub return_date: NaiveDate,
    pub total_days: i64,
    pub total_price: Decimal,
    pub notes: Option<String>,
    pub status: BookingStatus,
    pub booking_reference: String,
}

impl NewBooking {
    pub fn period(&self) -> DateRange {
        DateRange::new(self.pickup_date, self.return_date)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "confirmed" => BookingStatus::Confirmed,
            "cancelled" => BookingStatus::Cancelled,
            _ => BookingStatus::Pending,
        }
    }
}

/// Rental period from pickup day to return day.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateRange {
    pub pickup_date: NaiveDate,
    pub return_date: NaiveDate,
}

impl DateRange {
    pub fn new(pickup_date: NaiveDate, return_date: NaiveDate) -> Self {
        Self {
            pickup_date,
            return_date,
        }
    }

    /// Interval intersection. A return on the same day as the next pickup is not a clash.
    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.pickup_date < other.return_date && self.return_date > other.pickup_date
    }

    /// Whole rental days, never less than one.
    pub fn total_days(&self) -> i64 {
        (self.return_date - self.pickup_date).num_days().max(1)
    }
}

/// Booking form as submitted by the storefront. Every field is optional so that
/// validation can report all missing inputs at once.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookingRequest {
    pub car_id: Option<i64>,
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub customer_email: String,
    #[serde(default)]
    pub customer_phone: String,
    pub pickup_location_id: Option<i64>,
    pub pickup_date: Option<NaiveDate>,
    pub return_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Booking joined with its pickup location's display string.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BookingDetails {
    #[serde(flatten)]
    pub booking: Booking,
    pub pickup_location: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BookingConfirmation {
    #[serde(flatten)]
    pub details: BookingDetails,
    /// False when the availability check could not be completed and the booking
    /// went ahead on the store's own constraints.
    pub availability_verified: bool,
}
