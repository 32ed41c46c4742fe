use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

const MAX_POOL_SIZE: u32 = 100;

/// `CREAMERY__DATABASE__*`
///
/// Leaving `url` unset runs orders, ledger and webhook records in memory;
/// production validation refuses that.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub min_connections: u32,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
    /// Apply `migrations/` before serving.
    pub run_migrations: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            min_connections: 2,
            max_connections: 10,
            acquire_timeout_secs: 10,
            idle_timeout_secs: 10 * 60,
            max_lifetime_secs: 30 * 60,
            run_migrations: false,
        }
    }
}

impl DatabaseConfig {
    /// `None` for a missing or blank URL.
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref().map(str::trim).filter(|u| !u.is_empty())
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn max_lifetime(&self) -> Duration {
        Duration::from_secs(self.max_lifetime_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let is_postgres = |url: &str| ["postgres://", "postgresql://"].iter().any(|p| url.starts_with(p));
        if self.url().is_some_and(|url| !is_postgres(url)) {
            return Err(ValidationError::InvalidDatabaseUrl);
        }
        if self.max_connections > MAX_POOL_SIZE {
            return Err(ValidationError::PoolSizeTooLarge);
        }
        if self.min_connections > self.max_connections {
            return Err(ValidationError::InvalidPoolSize);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_run_in_memory() {
        let config = DatabaseConfig::default();
        assert_eq!(config.url(), None);
        assert!(!config.run_migrations);
        assert_eq!(config.idle_timeout(), Duration::from_secs(600));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn blank_url_means_in_memory() {
        let config = DatabaseConfig {
            url: Some("  ".to_string()),
            ..Default::default()
        };
        assert_eq!(config.url(), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn only_postgres_urls_are_accepted() {
        for (url, ok) in [
            ("postgres://creamery@localhost/shop", true),
            ("postgresql://creamery@localhost/shop", true),
            ("mysql://localhost/shop", false),
        ] {
            let config = DatabaseConfig {
                url: Some(url.to_string()),
                ..Default::default()
            };
            assert_eq!(config.validate().is_ok(), ok, "{}", url);
        }
    }

    #[test]
    fn pool_bounds_are_checked() {
        let inverted = DatabaseConfig {
            min_connections: 10,
            max_connections: 5,
            ..Default::default()
        };
        assert_eq!(inverted.validate(), Err(ValidationError::InvalidPoolSize));

        let oversized = DatabaseConfig {
            max_connections: MAX_POOL_SIZE + 1,
            ..Default::default()
        };
        assert_eq!(oversized.validate(), Err(ValidationError::PoolSizeTooLarge));
    }
}
