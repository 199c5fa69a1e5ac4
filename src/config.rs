use std::env;
use std::time::Duration;

use crate::services::booking::WorkflowSettings;
use crate::services::reference;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    /// `supabase` (hosted PostgREST endpoint) or `sqlite` (local file).
    pub store_backend: String,
    pub store_url: String,
    pub store_key: String,
    pub database_url: String,
    pub store_timeout_secs: u64,
    pub availability_fail_open: bool,
    pub booking_ref_prefix: String,
    pub debug_routes: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            store_backend: env::var("STORE_BACKEND")
                .map(|v| v.trim().to_lowercase())
                .unwrap_or_else(|_| "supabase".to_string()),
            store_url: env::var("STORE_URL").unwrap_or_default(),
            store_key: env::var("STORE_KEY").unwrap_or_default(),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "driveease.db".to_string()),
            store_timeout_secs: env::var("STORE_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or(10),
            availability_fail_open: env::var("AVAILABILITY_FAIL_OPEN")
                .map(|v| parse_flag(&v))
                .unwrap_or(true),
            booking_ref_prefix: env::var("BOOKING_REF_PREFIX")
                .ok()
                .map(|v| v.trim().to_uppercase())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| "DE".to_string()),
            debug_routes: env::var("DEBUG_ROUTES")
                .map(|v| parse_flag(&v))
                .unwrap_or(false),
        }
    }

    /// Rejects settings the server cannot run with. Called once at startup.
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            reference::is_valid_prefix(&self.booking_ref_prefix),
            "BOOKING_REF_PREFIX must be 1-{} ASCII letters or digits, got {:?}",
            reference::MAX_PREFIX_LEN,
            self.booking_ref_prefix
        );
        Ok(())
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store_timeout_secs)
    }

    pub fn workflow_settings(&self) -> WorkflowSettings {
        WorkflowSettings {
            fail_open: self.availability_fail_open,
            reference_prefix: self.booking_ref_prefix.clone(),
            ..WorkflowSettings::default()
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("true"));
        assert!(parse_flag(" 1 "));
        assert!(parse_flag("YES"));
        assert!(!parse_flag("false"));
        assert!(!parse_flag("0"));
        assert!(!parse_flag(""));
    }

    fn config_with_prefix(prefix: &str) -> AppConfig {
        AppConfig {
            port: 3000,
            store_backend: "sqlite".to_string(),
            store_url: String::new(),
            store_key: String::new(),
            database_url: ":memory:".to_string(),
            store_timeout_secs: 10,
            availability_fail_open: true,
            booking_ref_prefix: prefix.to_string(),
            debug_routes: false,
        }
    }

    #[test]
    fn test_validate_reference_prefix() {
        assert!(config_with_prefix("DE").validate().is_ok());
        assert!(config_with_prefix("DRIVE2").validate().is_ok());
        for bad in ["DE_X", "DRIVE.EASE", "DÉ", "DRIVE-EASE", "ABCDEFGHIJKLMNOPQ"] {
            let err = config_with_prefix(bad).validate().unwrap_err();
            assert!(err.to_string().contains("BOOKING_REF_PREFIX"), "{bad}: {err}");
        }
    }

    #[test]
    fn test_workflow_settings_follow_config() {
        let config = AppConfig {
            port: 3000,
            store_backend: "sqlite".to_string(),
            store_url: String::new(),
            store_key: String::new(),
            database_url: ":memory:".to_string(),
            store_timeout_secs: 3,
            availability_fail_open: false,
            booking_ref_prefix: "RX".to_string(),
            debug_routes: false,
        };
        let settings = config.workflow_settings();
        assert!(!settings.fail_open);
        assert_eq!(settings.reference_prefix, "RX");
        assert_eq!(settings.max_reference_attempts, 3);
        assert_eq!(config.store_timeout(), Duration::from_secs(3));
    }
}
