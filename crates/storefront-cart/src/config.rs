//! # Store Configuration
//!
//! Settings that shape cart behaviour: stock tracking, quantity cap,
//! shipping, discounts, session lifetime and the database file.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     STOREFRONT_TRACK_STOCK=true                                        │
//! │     STOREFRONT_MAX_QUANTITY=25                                         │
//! │     STOREFRONT_FREE_SHIPPING_THRESHOLD=100.00                          │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/storefront/store.toml (Linux)                            │
//! │     ~/Library/Application Support/com.storefront.cart/store.toml       │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [cart]
//! track_stock = true
//! max_quantity = 25
//! discounts_enabled = true
//!
//! [shipping]
//! free_shipping_threshold_cents = 10000
//! flat_shipping_fee_cents = 1000
//!
//! [session]
//! ttl_secs = 900
//! sweep_interval_secs = 60
//!
//! [database]
//! path = "storefront.db"
//! max_connections = 5
//! ```
//!
//! A loaded config is immutable. [`crate::CartService::reload_config`] swaps
//! in a whole new snapshot.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use storefront_core::{
    FlatRateShipping, Money, ShippingRule, DEFAULT_FLAT_SHIPPING_FEE_CENTS,
    DEFAULT_FREE_SHIPPING_THRESHOLD_CENTS, DEFAULT_SESSION_TTL_SECS,
};

use crate::error::{ConfigError, ConfigResult};

// =============================================================================
// Cart Settings
// =============================================================================

/// Cart behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSettings {
    /// Global stock tracking switch. Products opt in individually too.
    #[serde(default)]
    pub track_stock: bool,

    /// Per-line quantity cap. `None` = no cap.
    #[serde(default)]
    pub max_quantity: Option<i64>,

    /// When off, every discount code is rejected.
    #[serde(default = "default_true")]
    pub discounts_enabled: bool,
}

fn default_true() -> bool {
    true
}

impl Default for CartSettings {
    fn default() -> Self {
        CartSettings {
            track_stock: false,
            max_quantity: None,
            discounts_enabled: true,
        }
    }
}

// =============================================================================
// Shipping Settings
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingSettings {
    /// Net amount at or above which shipping is free.
    #[serde(default = "default_free_threshold")]
    pub free_shipping_threshold_cents: i64,

    /// Fee charged below the threshold.
    #[serde(default = "default_flat_fee")]
    pub flat_shipping_fee_cents: i64,
}

fn default_free_threshold() -> i64 {
    DEFAULT_FREE_SHIPPING_THRESHOLD_CENTS
}

fn default_flat_fee() -> i64 {
    DEFAULT_FLAT_SHIPPING_FEE_CENTS
}

impl Default for ShippingSettings {
    fn default() -> Self {
        ShippingSettings {
            free_shipping_threshold_cents: default_free_threshold(),
            flat_shipping_fee_cents: default_flat_fee(),
        }
    }
}

// =============================================================================
// Session Settings
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Idle lifetime of a shopper session.
    #[serde(default = "default_ttl")]
    pub ttl_secs: u64,

    /// How often the sweeper purges expired sessions and orphan carts.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

fn default_ttl() -> u64 {
    DEFAULT_SESSION_TTL_SECS
}

fn default_sweep_interval() -> u64 {
    60
}

impl Default for SessionSettings {
    fn default() -> Self {
        SessionSettings {
            ttl_secs: default_ttl(),
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

// =============================================================================
// Database Settings
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("storefront.db")
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_db_path(),
            max_connections: default_max_connections(),
        }
    }
}

// =============================================================================
// Store Configuration
// =============================================================================

/// Complete store configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub cart: CartSettings,

    #[serde(default)]
    pub shipping: ShippingSettings,

    #[serde(default)]
    pub session: SessionSettings,

    #[serde(default)]
    pub database: DatabaseSettings,
}

impl StoreConfig {
    /// Loads configuration: defaults, then the TOML file, then environment.
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading store config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load store config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> ConfigResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ConfigError::SaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::SaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| ConfigError::SaveFailed(e.to_string()))?;

        info!(?path, "Store config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(max) = self.cart.max_quantity {
            if max < 1 {
                return Err(ConfigError::InvalidConfig(format!(
                    "max_quantity must be at least 1, got {}",
                    max
                )));
            }
        }

        if self.shipping.free_shipping_threshold_cents < 0 {
            return Err(ConfigError::InvalidConfig(
                "free_shipping_threshold_cents must not be negative".into(),
            ));
        }

        if self.shipping.flat_shipping_fee_cents < 0 {
            return Err(ConfigError::InvalidConfig(
                "flat_shipping_fee_cents must not be negative".into(),
            ));
        }

        if self.session.ttl_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "session ttl_secs must be greater than 0".into(),
            ));
        }

        if self.session.sweep_interval_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "sweep_interval_secs must be greater than 0".into(),
            ));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::InvalidConfig(
                "database max_connections must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies `STOREFRONT_*` environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from any key/value source. Unparseable values are
    /// logged and ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("STOREFRONT_TRACK_STOCK") {
            match parse_bool(&value) {
                Some(b) => {
                    debug!(track_stock = b, "Overriding stock tracking from environment");
                    self.cart.track_stock = b;
                }
                None => warn!(value = %value, "Invalid STOREFRONT_TRACK_STOCK"),
            }
        }

        if let Some(value) = lookup("STOREFRONT_MAX_QUANTITY") {
            let value = value.trim();
            if value.is_empty() || value.eq_ignore_ascii_case("none") {
                self.cart.max_quantity = None;
            } else if let Ok(max) = value.parse::<i64>() {
                self.cart.max_quantity = Some(max);
            } else {
                warn!(value = %value, "Invalid STOREFRONT_MAX_QUANTITY");
            }
        }

        if let Some(value) = lookup("STOREFRONT_DISCOUNTS_ENABLED") {
            match parse_bool(&value) {
                Some(b) => self.cart.discounts_enabled = b,
                None => warn!(value = %value, "Invalid STOREFRONT_DISCOUNTS_ENABLED"),
            }
        }

        if let Some(value) = lookup("STOREFRONT_FREE_SHIPPING_THRESHOLD") {
            match parse_cents(&value) {
                Some(cents) => self.shipping.free_shipping_threshold_cents = cents,
                None => warn!(value = %value, "Invalid STOREFRONT_FREE_SHIPPING_THRESHOLD"),
            }
        }

        if let Some(value) = lookup("STOREFRONT_FLAT_SHIPPING_FEE") {
            match parse_cents(&value) {
                Some(cents) => self.shipping.flat_shipping_fee_cents = cents,
                None => warn!(value = %value, "Invalid STOREFRONT_FLAT_SHIPPING_FEE"),
            }
        }

        if let Some(value) = lookup("STOREFRONT_SESSION_TTL_SECS") {
            if let Ok(secs) = value.trim().parse::<u64>() {
                self.session.ttl_secs = secs;
            }
        }

        if let Some(value) = lookup("STOREFRONT_SWEEP_INTERVAL_SECS") {
            if let Ok(secs) = value.trim().parse::<u64>() {
                self.session.sweep_interval_secs = secs;
            }
        }

        if let Some(path) = lookup("STOREFRONT_DATABASE_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "storefront", "cart")
            .map(|dirs| dirs.config_dir().join("store.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// The shipping rule these settings describe.
    pub fn shipping_rule(&self) -> Arc<dyn ShippingRule> {
        Arc::new(FlatRateShipping::new(
            Money::from_cents(self.shipping.free_shipping_threshold_cents),
            Money::from_cents(self.shipping.flat_shipping_fee_cents),
        ))
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session.ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.session.sweep_interval_secs)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// `"1250"` is cents; `"12.50"` or `"$12.50"` is a decimal amount.
fn parse_cents(value: &str) -> Option<i64> {
    let value = value.trim();
    if value.contains('.') || value.starts_with('$') {
        value.parse::<Money>().ok().map(|m| m.cents())
    } else {
        value.parse::<i64>().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = StoreConfig::default();
        assert!(!config.cart.track_stock);
        assert_eq!(config.cart.max_quantity, None);
        assert!(config.cart.discounts_enabled);
        assert_eq!(config.shipping.free_shipping_threshold_cents, 10_000);
        assert_eq!(config.session_ttl(), Duration::from_secs(900));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = StoreConfig::default();
        config.apply_overrides(env(&[
            ("STOREFRONT_TRACK_STOCK", "true"),
            ("STOREFRONT_MAX_QUANTITY", "25"),
            ("STOREFRONT_FREE_SHIPPING_THRESHOLD", "75.00"),
            ("STOREFRONT_FLAT_SHIPPING_FEE", "450"),
            ("STOREFRONT_DISCOUNTS_ENABLED", "off"),
            ("STOREFRONT_DATABASE_PATH", "/var/lib/storefront/cart.db"),
        ]));

        assert!(config.cart.track_stock);
        assert_eq!(config.cart.max_quantity, Some(25));
        assert!(!config.cart.discounts_enabled);
        assert_eq!(config.shipping.free_shipping_threshold_cents, 7500);
        assert_eq!(config.shipping.flat_shipping_fee_cents, 450);
        assert_eq!(config.database.path, PathBuf::from("/var/lib/storefront/cart.db"));
    }

    #[test]
    fn test_invalid_env_values_are_ignored() {
        let mut config = StoreConfig::default();
        config.apply_overrides(env(&[
            ("STOREFRONT_TRACK_STOCK", "maybe"),
            ("STOREFRONT_FREE_SHIPPING_THRESHOLD", "12.345"),
            ("STOREFRONT_SESSION_TTL_SECS", "soon"),
        ]));

        assert_eq!(config, StoreConfig::default());
    }

    #[test]
    fn test_config_validation() {
        let mut config = StoreConfig::default();

        config.cart.max_quantity = Some(0);
        assert!(config.validate().is_err());

        config.cart.max_quantity = Some(10);
        config.shipping.flat_shipping_fee_cents = -1;
        assert!(config.validate().is_err());

        config.shipping.flat_shipping_fee_cents = 0;
        config.session.ttl_secs = 0;
        assert!(config.validate().is_err());

        config.session.ttl_secs = 60;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_roundtrip() {
        let mut config = StoreConfig::default();
        config.cart.max_quantity = Some(5);

        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[cart]"));
        assert!(toml_str.contains("[shipping]"));

        let parsed: StoreConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let parsed: StoreConfig = toml::from_str("[cart]\ntrack_stock = true\n").unwrap();
        assert!(parsed.cart.track_stock);
        assert!(parsed.cart.discounts_enabled);
        assert_eq!(parsed.session.sweep_interval_secs, 60);
    }

    #[test]
    fn test_shipping_rule_from_config() {
        let config = StoreConfig::default();
        let rule = config.shipping_rule();
        assert_eq!(rule.quote(Money::from_cents(4000)).amount.cents(), 1000);
        assert!(rule.quote(Money::from_cents(12_000)).amount.is_zero());
    }
}
