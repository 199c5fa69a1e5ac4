use std::str::FromStr;

use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection};
use rust_decimal::Decimal;

use crate::models::{Booking, BookingStatus, Car, CarFilters, DateRange, Location, NewBooking};

const DATE_FORMAT: &str = "%Y-%m-%d";

// ── Cars ──

/// Inserts a catalog car and returns its id. `car.id` is ignored.
pub fn insert_car(conn: &Connection, car: &Car) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO cars (name, category, transmission, seats, fuel_type, price_per_day, is_available, image_url, is_featured)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            car.name,
            car.category,
            car.transmission,
            car.seats,
            car.fuel_type,
            car.price_per_day.to_string(),
            car.is_available,
            car.image_url,
            car.is_featured,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn list_cars(conn: &Connection, filters: &CarFilters) -> anyhow::Result<Vec<Car>> {
    let mut sql = "SELECT id, name, category, transmission, seats, fuel_type, price_per_day, is_available, image_url, is_featured \
                   FROM cars WHERE is_available = 1"
        .to_string();
    let mut params_vec: Vec<Box<dyn rusqlite::types::ToSql>> = vec![];

    if let Some(category) = filters.category() {
        params_vec.push(Box::new(category.to_string()));
        sql.push_str(&format!(" AND category = ?{}", params_vec.len()));
    }
    if let Some(transmission) = filters.transmission() {
        params_vec.push(Box::new(transmission.to_string()));
        sql.push_str(&format!(" AND transmission = ?{}", params_vec.len()));
    }
    // Prices are stored as decimal text; order numerically.
    sql.push_str(" ORDER BY CAST(price_per_day AS REAL) ASC, id ASC");

    let mut stmt = conn.prepare(&sql)?;
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(params_refs.as_slice(), |row| Ok(parse_car_row(row)))?;

    let mut cars = vec![];
    for row in rows {
        cars.push(row??);
    }
    Ok(cars)
}

fn parse_car_row(row: &rusqlite::Row) -> anyhow::Result<Car> {
    let price_str: String = row.get(6)?;
    let price_per_day = Decimal::from_str(&price_str)
        .with_context(|| format!("invalid price_per_day: {price_str}"))?;

    Ok(Car {
        id: row.get(0)?,
        name: row.get(1)?,
        category: row.get(2)?,
        transmission: row.get(3)?,
        seats: row.get(4)?,
        fuel_type: row.get(5)?,
        price_per_day,
        is_available: row.get(7)?,
        image_url: row.get(8)?,
        is_featured: row.get(9)?,
    })
}

// ── Locations ──

/// Inserts a pickup location and returns its id. `location.id` is ignored.
pub fn insert_location(conn: &Connection, location: &Location) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO locations (name, address, city, is_active, hours, phone)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            location.name,
            location.address,
            location.city,
            location.is_active,
            location.hours,
            location.phone,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn list_locations(conn: &Connection) -> anyhow::Result<Vec<Location>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, address, city, is_active, hours, phone
         FROM locations WHERE is_active = 1 ORDER BY city ASC, id ASC",
    )?;
    let rows = stmt.query_map([], parse_location_row)?;

    let mut locations = vec![];
    for row in rows {
        locations.push(row?);
    }
    Ok(locations)
}

pub fn get_location(conn: &Connection, id: i64) -> anyhow::Result<Option<Location>> {
    let result = conn.query_row(
        "SELECT id, name, address, city, is_active, hours, phone FROM locations WHERE id = ?1",
        params![id],
        parse_location_row,
    );

    match result {
        Ok(location) => Ok(Some(location)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn parse_location_row(row: &rusqlite::Row) -> rusqlite::Result<Location> {
    Ok(Location {
        id: row.get(0)?,
        name: row.get(1)?,
        address: row.get(2)?,
        city: row.get(3)?,
        is_active: row.get(4)?,
        hours: row.get(5)?,
        phone: row.get(6)?,
    })
}

// ── Bookings ──

const BOOKING_COLUMNS: &str = "id, car_id, car_name, customer_name, customer_email, customer_phone, pickup_location_id, \
                               pickup_date, return_date, total_days, total_price, notes, status, booking_reference, created_at";

pub fn find_conflicting_bookings(
    conn: &Connection,
    car_id: i64,
    period: &DateRange,
) -> anyhow::Result<Vec<i64>> {
    let mut stmt = conn.prepare(
        "SELECT id FROM bookings
         WHERE car_id = ?1 AND status = 'confirmed' AND pickup_date < ?2 AND return_date > ?3
         ORDER BY pickup_date ASC",
    )?;
    let rows = stmt.query_map(
        params![
            car_id,
            period.return_date.format(DATE_FORMAT).to_string(),
            period.pickup_date.format(DATE_FORMAT).to_string(),
        ],
        |row| row.get(0),
    )?;

    let mut ids = vec![];
    for row in rows {
        ids.push(row?);
    }
    Ok(ids)
}

pub fn create_booking(
    conn: &Connection,
    booking: &NewBooking,
    created_at: DateTime<Utc>,
) -> anyhow::Result<Booking> {
    conn.execute(
        "INSERT INTO bookings (car_id, car_name, customer_name, customer_email, customer_phone, pickup_location_id,
                               pickup_date, return_date, total_days, total_price, notes, status, booking_reference, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        params![
            booking.car_id,
            booking.car_name,
            booking.customer_name,
            booking.customer_email,
            booking.customer_phone,
            booking.pickup_location_id,
            booking.pickup_date.format(DATE_FORMAT).to_string(),
            booking.return_date.format(DATE_FORMAT).to_string(),
            booking.total_days,
            booking.total_price.to_string(),
            booking.notes,
            booking.status.as_str(),
            booking.booking_reference,
            created_at.to_rfc3339(),
        ],
    )?;

    let id = conn.last_insert_rowid();
    get_booking_by_id(conn, id)?.ok_or_else(|| anyhow::anyhow!("inserted booking {id} not found"))
}

pub fn get_booking_by_id(conn: &Connection, id: i64) -> anyhow::Result<Option<Booking>> {
    let result = conn.query_row(
        &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1"),
        params![id],
        |row| Ok(parse_booking_row(row)),
    );

    match result {
        Ok(booking) => Ok(Some(booking?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_booking_by_reference(
    conn: &Connection,
    reference: &str,
) -> anyhow::Result<Option<Booking>> {
    let result = conn.query_row(
        &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE booking_reference = ?1"),
        params![reference],
        |row| Ok(parse_booking_row(row)),
    );

    match result {
        Ok(booking) => Ok(Some(booking?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_recent_bookings(conn: &Connection, limit: i64) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings ORDER BY created_at DESC, id DESC LIMIT ?1"
    ))?;
    let rows = stmt.query_map(params![limit], |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<Booking> {
    let pickup_str: String = row.get(7)?;
    let return_str: String = row.get(8)?;
    let price_str: String = row.get(10)?;
    let status_str: String = row.get(12)?;
    let created_at_str: String = row.get(14)?;

    let pickup_date = NaiveDate::parse_from_str(&pickup_str, DATE_FORMAT)
        .with_context(|| format!("invalid pickup_date: {pickup_str}"))?;
    let return_date = NaiveDate::parse_from_str(&return_str, DATE_FORMAT)
        .with_context(|| format!("invalid return_date: {return_str}"))?;
    let total_price = Decimal::from_str(&price_str)
        .with_context(|| format!("invalid total_price: {price_str}"))?;
    let created_at = DateTime::parse_from_rfc3339(&created_at_str)
        .with_context(|| format!("invalid created_at: {created_at_str}"))?
        .with_timezone(&Utc);

    Ok(Booking {
        id: row.get(0)?,
        car_id: row.get(1)?,
        car_name: row.get(2)?,
        customer_name: row.get(3)?,
        customer_email: row.get(4)?,
        customer_phone: row.get(5)?,
        pickup_location_id: row.get(6)?,
        pickup_date,
        return_date,
        total_days: row.get(9)?,
        total_price,
        notes: row.get(11)?,
        status: BookingStatus::parse(&status_str),
        booking_reference: row.get(13)?,
        created_at,
    })
}

// ── Schema ──

pub fn table_columns(conn: &Connection, table: &str) -> anyhow::Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1)")?;
    let rows = stmt.query_map(params![table], |row| row.get(0))?;

    let mut columns = vec![];
    for row in rows {
        columns.push(row?);
    }
    Ok(columns)
}
