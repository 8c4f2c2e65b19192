//! Application configuration loaded from environment variables.

use common::Money;
use domain::PricingPolicy;

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `3000`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `DATABASE_URL` — PostgreSQL connection string; the server runs on
///   the in-memory store when unset
/// - `FREE_SHIPPING_THRESHOLD_CENTS` — subtotals above this ship free
///   (default: `5000`)
/// - `SHIPPING_SURCHARGE_CENTS` — flat surcharge below the threshold
///   (default: `599`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database_url: Option<String>,
    pub free_shipping_threshold_cents: i64,
    pub shipping_surcharge_cents: i64,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: std::env::var("RUST_LOG").unwrap_or(defaults.log_level),
            database_url: std::env::var("DATABASE_URL").ok(),
            free_shipping_threshold_cents: std::env::var("FREE_SHIPPING_THRESHOLD_CENTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.free_shipping_threshold_cents),
            shipping_surcharge_cents: std::env::var("SHIPPING_SURCHARGE_CENTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.shipping_surcharge_cents),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the pricing policy configured for checkout.
    pub fn pricing(&self) -> PricingPolicy {
        PricingPolicy::new(
            Money::from_cents(self.free_shipping_threshold_cents),
            Money::from_cents(self.shipping_surcharge_cents),
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            database_url: None,
            free_shipping_threshold_cents: 5000,
            shipping_surcharge_cents: 599,
        }
    }
}
