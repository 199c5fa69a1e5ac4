use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Location {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub city: String,
    pub is_active: bool,
    #[serde(default)]
    pub hours: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl Location {
    /// Label shown wherever a booking's pickup point is displayed.
    pub fn display_name(&self) -> String {
        format!("{}, {}", self.name, self.city)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name() {
        let location = Location {
            id: 3,
            name: "Airport Terminal".to_string(),
            address: "1 Runway Rd".to_string(),
            city: "Denpasar".to_string(),
            is_active: true,
            hours: None,
            phone: None,
        };
        assert_eq!(location.display_name(), "Airport Terminal, Denpasar");
    }
}
