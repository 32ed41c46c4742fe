//! Payment provider configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::adapters::stripe::{StripeConfig, DEFAULT_API_BASE_URL};
use crate::domain::foundation::Currency;
use crate::domain::webhook::StripeWebhookVerifier;

/// Stripe configuration.
///
/// Both secrets are optional. Without a secret key the gateway reports
/// itself unavailable; without a webhook secret the webhook endpoint
/// rejects every delivery.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    pub stripe_secret_key: Option<SecretString>,

    pub stripe_webhook_secret: Option<SecretString>,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Pinned `Stripe-Version` header
    pub api_version: Option<String>,

    #[serde(default = "default_currency")]
    pub currency: String,

    /// Reject test-mode events
    #[serde(default)]
    pub require_livemode: bool,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl PaymentConfig {
    fn secret_key(&self) -> Option<&SecretString> {
        self.stripe_secret_key
            .as_ref()
            .filter(|k| !k.expose_secret().trim().is_empty())
    }

    fn webhook_secret(&self) -> Option<&SecretString> {
        self.stripe_webhook_secret
            .as_ref()
            .filter(|k| !k.expose_secret().trim().is_empty())
    }

    pub fn is_configured(&self) -> bool {
        self.secret_key().is_some()
    }

    pub fn is_test_mode(&self) -> bool {
        self.secret_key()
            .map(|k| k.expose_secret().starts_with("sk_test_"))
            .unwrap_or(true)
    }

    pub fn currency(&self) -> Result<Currency, ValidationError> {
        self.currency
            .parse()
            .map_err(|_| ValidationError::InvalidCurrency(self.currency.clone()))
    }

    pub fn stripe_config(&self) -> StripeConfig {
        let mut config = StripeConfig::new(self.secret_key().cloned())
            .with_base_url(self.api_base_url.as_str())
            .with_timeout(Duration::from_secs(self.timeout_secs));
        if let Some(version) = self.api_version.as_deref().filter(|v| !v.is_empty()) {
            config = config.with_api_version(version);
        }
        config
    }

    pub fn webhook_verifier(&self) -> Option<StripeWebhookVerifier> {
        self.webhook_secret().map(|secret| {
            StripeWebhookVerifier::new(secret.clone()).with_require_livemode(self.require_livemode)
        })
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(key) = self.secret_key() {
            let key = key.expose_secret();
            if !key.starts_with("sk_") && !key.starts_with("rk_") {
                return Err(ValidationError::InvalidStripeKey);
            }
        }
        if let Some(secret) = self.webhook_secret() {
            if !secret.expose_secret().starts_with("whsec_") {
                return Err(ValidationError::InvalidStripeWebhookSecret);
            }
        }
        if !self.api_base_url.starts_with("http://") && !self.api_base_url.starts_with("https://") {
            return Err(ValidationError::InvalidApiBaseUrl);
        }
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        self.currency()?;
        Ok(())
    }
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            stripe_secret_key: None,
            stripe_webhook_secret: None,
            api_base_url: default_api_base_url(),
            api_version: None,
            currency: default_currency(),
            require_livemode: false,
            timeout_secs: default_timeout(),
        }
    }
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_currency() -> String {
    "usd".to_string()
}

fn default_timeout() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> PaymentConfig {
        PaymentConfig {
            stripe_secret_key: Some(SecretString::new("sk_test_xxx".to_string())),
            stripe_webhook_secret: Some(SecretString::new("whsec_xxx".to_string())),
            ..Default::default()
        }
    }

    #[test]
    fn test_unconfigured_defaults_are_valid() {
        let config = PaymentConfig::default();
        assert!(config.validate().is_ok());
        assert!(!config.is_configured());
        assert!(config.webhook_verifier().is_none());
        assert!(!config.stripe_config().is_configured());
    }

    #[test]
    fn test_configured_keys() {
        let config = configured();
        assert!(config.validate().is_ok());
        assert!(config.is_configured());
        assert!(config.is_test_mode());
        assert!(config.webhook_verifier().is_some());
    }

    #[test]
    fn test_blank_secret_counts_as_absent() {
        let config = PaymentConfig {
            stripe_secret_key: Some(SecretString::new("  ".to_string())),
            ..Default::default()
        };
        assert!(!config.is_configured());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_publishable_key() {
        let config = PaymentConfig {
            stripe_secret_key: Some(SecretString::new("pk_test_xxx".to_string())),
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidStripeKey));
    }

    #[test]
    fn test_validation_rejects_bad_webhook_secret() {
        let config = PaymentConfig {
            stripe_webhook_secret: Some(SecretString::new("secret".to_string())),
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::InvalidStripeWebhookSecret)
        );
    }

    #[test]
    fn test_validation_rejects_bad_currency() {
        let config = PaymentConfig {
            currency: "dollars".to_string(),
            ..configured()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::InvalidCurrency("dollars".to_string()))
        );
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let debug = format!("{:?}", configured());
        assert!(!debug.contains("sk_test_xxx"));
        assert!(!debug.contains("whsec_xxx"));
    }
}
