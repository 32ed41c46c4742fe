//! Application configuration module
//!
//! Configuration is read from environment variables (and a `.env` file when
//! present) with the `CREAMERY` prefix. Nested values are separated by
//! double underscores.
//!
//! # Example
//!
//! ```no_run
//! use creamery::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod database;
mod email;
mod error;
mod payment;
mod server;

pub use database::DatabaseConfig;
pub use email::EmailConfig;
pub use error::{ConfigError, ValidationError};
pub use payment::PaymentConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    /// PostgreSQL; in-memory stores when no URL is set
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Stripe
    #[serde(default)]
    pub payment: PaymentConfig,

    /// Resend
    #[serde(default)]
    pub email: EmailConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// - `CREAMERY__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `CREAMERY__DATABASE__URL=...` -> `database.url = ...`
    /// - `CREAMERY__PAYMENT__STRIPE_SECRET_KEY=...` -> `payment.stripe_secret_key = ...`
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("CREAMERY")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all sections.
    ///
    /// Production additionally requires a database and both Stripe secrets.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.payment.validate()?;
        self.email.validate()?;

        if self.is_production() {
            if self.database.url().is_none() {
                return Err(ValidationError::MissingRequired("database.url"));
            }
            if !self.payment.is_configured() {
                return Err(ValidationError::MissingRequired("payment.stripe_secret_key"));
            }
            if self.payment.webhook_verifier().is_none() {
                return Err(ValidationError::MissingRequired("payment.stripe_webhook_secret"));
            }
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // env vars are process-global
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: &[&str] = &[
        "CREAMERY__DATABASE__URL",
        "CREAMERY__PAYMENT__STRIPE_SECRET_KEY",
        "CREAMERY__PAYMENT__STRIPE_WEBHOOK_SECRET",
        "CREAMERY__PAYMENT__CURRENCY",
        "CREAMERY__EMAIL__RESEND_API_KEY",
        "CREAMERY__SERVER__PORT",
        "CREAMERY__SERVER__ENVIRONMENT",
    ];

    fn set_full_env() {
        env::set_var("CREAMERY__DATABASE__URL", "postgresql://test@localhost/creamery");
        env::set_var("CREAMERY__PAYMENT__STRIPE_SECRET_KEY", "sk_test_xxx");
        env::set_var("CREAMERY__PAYMENT__STRIPE_WEBHOOK_SECRET", "whsec_xxx");
        env::set_var("CREAMERY__EMAIL__RESEND_API_KEY", "re_xxx");
    }

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    fn load_with(setup: impl FnOnce()) -> Result<AppConfig, ConfigError> {
        let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();
        setup();
        let result = AppConfig::load();
        clear_env();
        result
    }

    #[test]
    fn test_load_from_environment() {
        let config = load_with(set_full_env).unwrap();
        assert_eq!(
            config.database.url(),
            Some("postgresql://test@localhost/creamery")
        );
        assert!(config.payment.is_configured());
        assert!(config.email.is_configured());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_environment_is_a_valid_local_setup() {
        let config = load_with(|| {}).unwrap();
        assert_eq!(config.database.url(), None);
        assert!(!config.payment.is_configured());
        assert_eq!(config.server.port, 8080);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_custom_server_port_and_currency() {
        let config = load_with(|| {
            env::set_var("CREAMERY__SERVER__PORT", "3000");
            env::set_var("CREAMERY__PAYMENT__CURRENCY", "eur");
        })
        .unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.payment.currency().unwrap().as_str(), "eur");
    }

    #[test]
    fn test_production_requires_stripe_and_database() {
        let config = load_with(|| {
            env::set_var("CREAMERY__SERVER__ENVIRONMENT", "production");
            env::set_var("CREAMERY__DATABASE__URL", "postgresql://test@localhost/creamery");
        })
        .unwrap();
        assert!(config.is_production());
        assert_eq!(
            config.validate(),
            Err(ValidationError::MissingRequired("payment.stripe_secret_key"))
        );

        let config = load_with(|| {
            set_full_env();
            env::set_var("CREAMERY__SERVER__ENVIRONMENT", "production");
        })
        .unwrap();
        assert!(config.validate().is_ok());
    }
}
