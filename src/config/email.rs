//! Order e-mail configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;
use crate::adapters::notification::{ResendConfig, DEFAULT_RESEND_API_URL};

/// Resend configuration for order e-mails.
///
/// Without an API key, notifications are only logged.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    pub resend_api_key: Option<SecretString>,

    #[serde(default = "default_from_email")]
    pub from_email: String,

    #[serde(default = "default_from_name")]
    pub from_name: String,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
}

impl EmailConfig {
    fn api_key(&self) -> Option<&SecretString> {
        self.resend_api_key
            .as_ref()
            .filter(|k| !k.expose_secret().trim().is_empty())
    }

    pub fn is_configured(&self) -> bool {
        self.api_key().is_some()
    }

    pub fn from_header(&self) -> String {
        format!("{} <{}>", self.from_name, self.from_email)
    }

    pub fn resend_config(&self) -> Option<ResendConfig> {
        self.api_key().map(|api_key| ResendConfig {
            api_key: api_key.clone(),
            from: self.from_header(),
            api_base_url: self.api_base_url.clone(),
        })
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(key) = self.api_key() {
            if !key.expose_secret().starts_with("re_") {
                return Err(ValidationError::InvalidResendKey);
            }
        }
        let mut parts = self.from_email.splitn(2, '@');
        let valid_email = matches!(
            (parts.next(), parts.next()),
            (Some(local), Some(domain)) if !local.is_empty() && domain.contains('.')
        );
        if !valid_email {
            return Err(ValidationError::InvalidFromEmail);
        }
        Ok(())
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            resend_api_key: None,
            from_email: default_from_email(),
            from_name: default_from_name(),
            api_base_url: default_api_base_url(),
        }
    }
}

fn default_from_email() -> String {
    "orders@creamery.example.com".to_string()
}

fn default_from_name() -> String {
    "Creamery".to_string()
}

fn default_api_base_url() -> String {
    DEFAULT_RESEND_API_URL.to_string()
}
