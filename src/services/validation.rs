use crate::errors::{AppError, FieldError};
use crate::models::{BookingRequest, Car, DateRange, Location};
use crate::services::catalog::CatalogSnapshot;

/// Maximum digits accepted in a phone number (E.164 plus one for local prefixes).
const MAX_PHONE_DIGITS: usize = 16;

/// A booking form that passed local checks, resolved against the snapshot.
#[derive(Debug, Clone)]
pub struct ValidatedBooking<'a> {
    pub car: &'a Car,
    pub location: &'a Location,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub period: DateRange,
    pub notes: Option<String>,
}

/// Checks the form without touching the store. All field problems are
/// reported together so the page can mark every offending input.
pub fn validate_booking<'a>(
    request: &BookingRequest,
    snapshot: &'a CatalogSnapshot,
) -> Result<ValidatedBooking<'a>, AppError> {
    let mut errors = vec![];

    let customer_name = request.customer_name.trim();
    if customer_name.is_empty() {
        errors.push(FieldError::new("customer_name", "Name is required"));
    }

    let customer_email = request.customer_email.trim();
    if customer_email.is_empty() {
        errors.push(FieldError::new("customer_email", "Email is required"));
    } else if !is_valid_email(customer_email) {
        errors.push(FieldError::new("customer_email", "Invalid email address"));
    }

    let customer_phone = request.customer_phone.trim();
    if customer_phone.is_empty() {
        errors.push(FieldError::new("customer_phone", "Phone number is required"));
    } else if !is_valid_phone(customer_phone) {
        errors.push(FieldError::new("customer_phone", "Invalid phone number"));
    }

    let location = match request.pickup_location_id {
        None => {
            errors.push(FieldError::new("pickup_location_id", "Please select a location"));
            None
        }
        Some(id) => {
            let found = snapshot.location(id);
            if found.is_none() {
                errors.push(FieldError::new(
                    "pickup_location_id",
                    "Selected location is not available",
                ));
            }
            found
        }
    };

    let period = match (request.pickup_date, request.return_date) {
        (Some(pickup), Some(ret)) if ret <= pickup => {
            errors.push(FieldError::new(
                "return_date",
                "Return date must be after pickup date",
            ));
            None
        }
        (Some(pickup), Some(ret)) => Some(DateRange::new(pickup, ret)),
        _ => {
            errors.push(FieldError::new("pickup_date", "Please select dates"));
            None
        }
    };

    if request.car_id.is_none() {
        errors.push(FieldError::new("car_id", "Please choose a car"));
    }

    match (request.car_id, location, period) {
        (Some(car_id), Some(location), Some(period)) if errors.is_empty() => {
            let car = snapshot
                .car(car_id)
                .ok_or_else(|| AppError::NotFound("Car".to_string()))?;

            Ok(ValidatedBooking {
                car,
                location,
                customer_name: customer_name.to_string(),
                customer_email: customer_email.to_string(),
                customer_phone: customer_phone.to_string(),
                period,
                notes: request
                    .notes
                    .as_deref()
                    .map(str::trim)
                    .filter(|n| !n.is_empty())
                    .map(str::to_string),
            })
        }
        _ => Err(AppError::ValidationFailed(errors)),
    }
}

/// `local@domain.tld`: no whitespace, exactly one `@`, and a dot inside the
/// domain with text on both sides.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }

    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

/// Mostly digits: an optional leading `+`, then digits mixed with common
/// separators. The digits themselves must not start with 0.
pub fn is_valid_phone(phone: &str) -> bool {
    let rest = phone.strip_prefix('+').unwrap_or(phone);

    if !rest
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '-' | '(' | ')' | '.'))
    {
        return false;
    }

    let digits: Vec<char> = rest.chars().filter(char::is_ascii_digit).collect();
    match digits.first() {
        Some('0') | None => false,
        Some(_) => digits.len() <= MAX_PHONE_DIGITS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn snapshot() -> CatalogSnapshot {
        CatalogSnapshot {
            cars: vec![Car {
                id: 1,
                name: "Avanza".to_string(),
                category: "mpv".to_string(),
                transmission: "manual".to_string(),
                seats: 7,
                fuel_type: "Petrol".to_string(),
                price_per_day: Decimal::new(45, 0),
                is_available: true,
                image_url: None,
                is_featured: false,
            }],
            locations: vec![Location {
                id: 10,
                name: "Airport".to_string(),
                address: "1 Runway Rd".to_string(),
                city: "Denpasar".to_string(),
                is_active: true,
                hours: None,
                phone: None,
            }],
            fetched_at: None,
        }
    }

    fn valid_request() -> BookingRequest {
        BookingRequest {
            car_id: Some(1),
            customer_name: "  Sari Dewi ".to_string(),
            customer_email: "sari@example.com".to_string(),
            customer_phone: "+62 812-3456-789".to_string(),
            pickup_location_id: Some(10),
            pickup_date: Some(d("2024-01-01")),
            return_date: Some(d("2024-01-04")),
            notes: Some("   ".to_string()),
        }
    }

    fn field_errors(result: Result<ValidatedBooking<'_>, AppError>) -> Vec<&'static str> {
        match result {
            Err(AppError::ValidationFailed(errors)) => errors.iter().map(|e| e.field).collect(),
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_request() {
        let snapshot = snapshot();
        let valid = validate_booking(&valid_request(), &snapshot).unwrap();
        assert_eq!(valid.car.id, 1);
        assert_eq!(valid.location.id, 10);
        assert_eq!(valid.customer_name, "Sari Dewi");
        assert_eq!(valid.period.total_days(), 3);
        assert!(valid.notes.is_none());
    }

    #[test]
    fn test_reports_every_missing_field() {
        let snapshot = snapshot();
        let fields = field_errors(validate_booking(&BookingRequest::default(), &snapshot));
        assert_eq!(
            fields,
            vec![
                "customer_name",
                "customer_email",
                "customer_phone",
                "pickup_location_id",
                "pickup_date",
                "car_id"
            ]
        );
    }

    #[test]
    fn test_return_must_follow_pickup() {
        let snapshot = snapshot();
        for (pickup, ret) in [("2024-01-04", "2024-01-01"), ("2024-01-04", "2024-01-04")] {
            let mut request = valid_request();
            request.pickup_date = Some(d(pickup));
            request.return_date = Some(d(ret));
            assert_eq!(field_errors(validate_booking(&request, &snapshot)), vec!["return_date"]);
        }
    }

    #[test]
    fn test_unknown_location_rejected() {
        let snapshot = snapshot();
        let mut request = valid_request();
        request.pickup_location_id = Some(99);
        assert_eq!(
            field_errors(validate_booking(&request, &snapshot)),
            vec!["pickup_location_id"]
        );
    }

    #[test]
    fn test_unknown_car_not_found() {
        let snapshot = snapshot();
        let mut request = valid_request();
        request.car_id = Some(42);
        assert!(matches!(
            validate_booking(&request, &snapshot),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_email_pattern() {
        assert!(is_valid_email("a@b.co"));
        assert!(is_valid_email("first.last@mail.example.com"));
        assert!(!is_valid_email("no-at-sign.com"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a@.com"));
        assert!(!is_valid_email("a@com."));
        assert!(!is_valid_email("@b.com"));
        assert!(!is_valid_email("a@@b.com"));
        assert!(!is_valid_email("a b@c.com"));
    }

    #[test]
    fn test_phone_pattern() {
        assert!(is_valid_phone("+6281234567"));
        assert!(is_valid_phone("(555) 123-4567"));
        assert!(is_valid_phone("555.123.4567"));
        assert!(!is_valid_phone("0812345678"));
        assert!(!is_valid_phone("call me"));
        assert!(!is_valid_phone("+"));
        assert!(!is_valid_phone("++6281234567"));
        assert!(!is_valid_phone("12345678901234567"));
    }
}
