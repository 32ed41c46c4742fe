use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read CREAMERY__* settings: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("invalid settings: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// A setting that loaded but cannot be used. Messages name the variable to fix.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} must be set in production")]
    MissingRequired(&'static str),

    // server
    #[error("CREAMERY__SERVER__PORT must be non-zero")]
    InvalidPort,
    #[error("CREAMERY__SERVER__REQUEST_TIMEOUT_SECS must be between 1 and 300")]
    InvalidTimeout,
    #[error("'{0}' is not a listen address")]
    InvalidSocketAddr(String),

    // database
    #[error("CREAMERY__DATABASE__URL must be a postgres:// URL")]
    InvalidDatabaseUrl,
    #[error("database min_connections is larger than max_connections")]
    InvalidPoolSize,
    #[error("database max_connections is above 100")]
    PoolSizeTooLarge,

    // payment
    #[error("Stripe secret key must start with sk_ or rk_")]
    InvalidStripeKey,
    #[error("Stripe webhook secret must start with whsec_")]
    InvalidStripeWebhookSecret,
    #[error("payment API base URL must be http(s)")]
    InvalidApiBaseUrl,
    #[error("'{0}' is not a three-letter currency code")]
    InvalidCurrency(String),

    // email
    #[error("Resend API key must start with re_")]
    InvalidResendKey,
    #[error("sender address is not an e-mail address")]
    InvalidFromEmail,
}
