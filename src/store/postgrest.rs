use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{StoreError, TableStore, EXPECTED_SCHEMA};
use crate::models::{Booking, Car, CarFilters, DateRange, Location, NewBooking};

/// Hosted table store reached through its PostgREST endpoint (`/rest/v1/<table>`).
pub struct PostgrestStore {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl PostgrestStore {
    pub fn new(base_url: &str, api_key: String, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build store HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client,
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        self.client
            .request(method, self.table_url(table))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn fetch<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, StoreError> {
        let resp = builder.send().await.map_err(transport_error)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(classify_error(status, &body));
        }

        resp.json::<T>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }
}

#[derive(Debug, Default, Deserialize)]
struct PostgrestErrorBody {
    code: Option<String>,
    message: Option<String>,
    details: Option<String>,
}

fn transport_error(err: reqwest::Error) -> StoreError {
    if err.is_timeout() {
        StoreError::Unavailable("request timed out".to_string())
    } else {
        StoreError::Unavailable(err.to_string())
    }
}

/// Maps a PostgREST error response onto the store taxonomy.
fn classify_error(status: StatusCode, body: &str) -> StoreError {
    let parsed: PostgrestErrorBody = serde_json::from_str(body).unwrap_or_default();
    let code = parsed.code.unwrap_or_default();
    let message = parsed.message.unwrap_or_else(|| body.to_string());
    let details = parsed.details.unwrap_or_default();

    match code.as_str() {
        // exclusion_violation
        "23P01" => StoreError::Overlap,
        // unique_violation
        "23505" if message.contains("booking_reference") || details.contains("booking_reference") => {
            StoreError::DuplicateReference
        }
        // undefined_column, undefined_table, schema cache misses
        "42703" | "42P01" | "PGRST204" | "PGRST205" => StoreError::SchemaMismatch(message),
        _ if status.is_server_error()
            || status == StatusCode::REQUEST_TIMEOUT
            || status == StatusCode::TOO_MANY_REQUESTS =>
        {
            StoreError::Unavailable(format!("{status}: {message}"))
        }
        _ => StoreError::Rejected {
            code: if code.is_empty() {
                status.as_u16().to_string()
            } else {
                code
            },
            message,
        },
    }
}

fn car_query(filters: &CarFilters) -> Vec<(&'static str, String)> {
    let mut query = vec![
        ("select", "*".to_string()),
        ("is_available", "eq.true".to_string()),
    ];
    if let Some(category) = filters.category() {
        query.push(("category", format!("eq.{category}")));
    }
    if let Some(transmission) = filters.transmission() {
        query.push(("transmission", format!("eq.{transmission}")));
    }
    query.push(("order", "price_per_day.asc".to_string()));
    query
}

fn conflict_query(car_id: i64, period: &DateRange) -> Vec<(&'static str, String)> {
    vec![
        ("select", "id".to_string()),
        ("car_id", format!("eq.{car_id}")),
        ("status", "eq.confirmed".to_string()),
        ("pickup_date", format!("lt.{}", period.return_date)),
        ("return_date", format!("gt.{}", period.pickup_date)),
    ]
}

#[derive(Deserialize)]
struct IdRow {
    id: i64,
}

#[async_trait]
impl TableStore for PostgrestStore {
    async fn ping(&self) -> Result<(), StoreError> {
        let _: Vec<IdRow> = self
            .fetch(
                self.request(Method::GET, "cars")
                    .query(&[("select", "id"), ("limit", "1")]),
            )
            .await?;
        Ok(())
    }

    async fn verify_schema(&self) -> Result<(), StoreError> {
        for (table, columns) in EXPECTED_SCHEMA {
            let select = columns.join(",");
            let result: Result<Vec<serde_json::Value>, StoreError> = self
                .fetch(
                    self.request(Method::GET, table)
                        .query(&[("select", select.as_str()), ("limit", "0")]),
                )
                .await;

            match result {
                Ok(_) => tracing::debug!(table, "store table matches expected columns"),
                Err(StoreError::SchemaMismatch(msg)) => {
                    return Err(StoreError::SchemaMismatch(format!("{table}: {msg}")));
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    async fn list_cars(&self, filters: &CarFilters) -> Result<Vec<Car>, StoreError> {
        self.fetch(self.request(Method::GET, "cars").query(&car_query(filters)))
            .await
    }

    async fn list_locations(&self) -> Result<Vec<Location>, StoreError> {
        self.fetch(self.request(Method::GET, "locations").query(&[
            ("select", "*"),
            ("is_active", "eq.true"),
            ("order", "city.asc"),
        ]))
        .await
    }

    async fn get_location(&self, id: i64) -> Result<Option<Location>, StoreError> {
        let rows: Vec<Location> = self
            .fetch(
                self.request(Method::GET, "locations")
                    .query(&[("select", "*".to_string()), ("id", format!("eq.{id}"))]),
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn find_conflicting_bookings(
        &self,
        car_id: i64,
        period: &DateRange,
    ) -> Result<Vec<i64>, StoreError> {
        let rows: Vec<IdRow> = self
            .fetch(
                self.request(Method::GET, "bookings")
                    .query(&conflict_query(car_id, period)),
            )
            .await?;
        Ok(rows.into_iter().map(|r| r.id).collect())
    }

    async fn insert_booking(&self, booking: &NewBooking) -> Result<Booking, StoreError> {
        self.fetch(
            self.request(Method::POST, "bookings")
                .header("Prefer", "return=representation")
                .header(ACCEPT, "application/vnd.pgrst.object+json")
                .json(booking),
        )
        .await
    }

    async fn find_booking_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Booking>, StoreError> {
        let rows: Vec<Booking> = self
            .fetch(self.request(Method::GET, "bookings").query(&[
                ("select", "*".to_string()),
                ("booking_reference", format!("eq.{reference}")),
                ("limit", "1".to_string()),
            ]))
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn list_bookings(&self, limit: i64) -> Result<Vec<Booking>, StoreError> {
        self.fetch(self.request(Method::GET, "bookings").query(&[
            ("select", "*".to_string()),
            ("order", "created_at.desc".to_string()),
            ("limit", limit.to_string()),
        ]))
        .await
    }
}
