use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Car {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub transmission: String,
    #[serde(default = "default_seats")]
    pub seats: i32,
    #[serde(default = "default_fuel_type")]
    pub fuel_type: String,
    pub price_per_day: Decimal,
    pub is_available: bool,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub is_featured: bool,
}

fn default_seats() -> i32 {
    5
}

fn default_fuel_type() -> String {
    "Petrol".to_string()
}

/// Equality filters applied by the catalog search. Empty strings count as unset,
/// matching the "any type" option of the search form.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CarFilters {
    pub category: Option<String>,
    pub transmission: Option<String>,
}

impl CarFilters {
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn transmission(&self) -> Option<&str> {
        self.transmission
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.category().is_none() && self.transmission().is_none()
    }
}
