//! Creamery API server.

use std::sync::Arc;

use axum::Router;
use http::{header, HeaderName, HeaderValue, Method};
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use creamery::adapters::http::middleware::auth::{
    USER_EMAIL_HEADER, USER_ID_HEADER, USER_ROLE_HEADER,
};
use creamery::adapters::http::{api_router, AppDependencies, AppState};
use creamery::adapters::memory::{
    InMemoryOrderRepository, InMemoryProductCatalog, InMemoryTransactionLedger,
    InMemoryWebhookEventRepository,
};
use creamery::adapters::notification::{
    LoggingNotificationDispatcher, ResendNotificationDispatcher,
};
use creamery::adapters::postgres::{
    PostgresOrderRepository, PostgresProductCatalog, PostgresTransactionLedger,
    PostgresWebhookEventRepository,
};
use creamery::adapters::stripe::StripePaymentGateway;
use creamery::config::{AppConfig, ConfigError, ServerConfig, ValidationError};
use creamery::ports::{NotificationDispatcher, PaymentGateway};

#[derive(Debug, Error)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Database connection failed: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ValidationError> for StartupError {
    fn from(err: ValidationError) -> Self {
        StartupError::Config(ConfigError::from(err))
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        // Tracing may not be installed yet.
        eprintln!("creamery failed to start: {}", e);
        tracing::error!(error = %e, "Fatal error");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), StartupError> {
    let config = AppConfig::load()?;
    init_tracing(&config.server);
    config.validate()?;

    tracing::info!(
        environment = ?config.server.environment,
        version = env!("CARGO_PKG_VERSION"),
        "Starting creamery"
    );

    let deps = build_dependencies(&config).await?;
    let app = with_transport_layers(api_router(AppState::new(deps)), &config.server);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shut down cleanly");
    Ok(())
}

/// `RUST_LOG` overrides `server.log_level`. JSON lines in production.
fn init_tracing(server: &ServerConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&server.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    if server.is_production() {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

async fn build_dependencies(config: &AppConfig) -> Result<AppDependencies, StartupError> {
    let currency = config.payment.currency()?;

    let gateway: Arc<dyn PaymentGateway> =
        Arc::new(StripePaymentGateway::new(config.payment.stripe_config()));
    if !config.payment.is_configured() {
        tracing::warn!("No Stripe secret key configured; payments are unavailable");
    } else if config.payment.is_test_mode() {
        tracing::info!("Stripe is in test mode");
    }

    let webhook_verifier = config.payment.webhook_verifier();
    if webhook_verifier.is_none() {
        tracing::warn!("No Stripe webhook secret configured; webhook deliveries will be refused");
    }

    let notifier: Arc<dyn NotificationDispatcher> = match config.email.resend_config() {
        Some(resend) => Arc::new(ResendNotificationDispatcher::new(resend)),
        None => {
            tracing::warn!("No Resend API key configured; order e-mails are only logged");
            Arc::new(LoggingNotificationDispatcher)
        }
    };

    let deps = match config.database.url() {
        Some(url) => {
            let db = &config.database;
            let pool = PgPoolOptions::new()
                .min_connections(db.min_connections)
                .max_connections(db.max_connections)
                .acquire_timeout(db.acquire_timeout())
                .idle_timeout(Some(db.idle_timeout()))
                .max_lifetime(Some(db.max_lifetime()))
                .connect(url)
                .await?;
            tracing::info!(max_connections = db.max_connections, "Database pool ready");

            if db.run_migrations {
                sqlx::migrate!("./migrations").run(&pool).await?;
                tracing::info!("Migrations applied");
            }

            AppDependencies {
                orders: Arc::new(PostgresOrderRepository::new(pool.clone())),
                ledger: Arc::new(PostgresTransactionLedger::new(pool.clone())),
                catalog: Arc::new(PostgresProductCatalog::new(pool.clone())),
                webhook_events: Arc::new(PostgresWebhookEventRepository::new(pool)),
                gateway,
                notifier,
                webhook_verifier,
                currency,
            }
        }
        None => {
            tracing::warn!("No database URL configured; using in-memory stores");
            AppDependencies {
                orders: Arc::new(InMemoryOrderRepository::new()),
                ledger: Arc::new(InMemoryTransactionLedger::new()),
                catalog: Arc::new(InMemoryProductCatalog::new()),
                webhook_events: Arc::new(InMemoryWebhookEventRepository::new()),
                gateway,
                notifier,
                webhook_verifier,
                currency,
            }
        }
    };

    Ok(deps)
}

fn with_transport_layers(router: Router, server: &ServerConfig) -> Router {
    router
        .layer(cors_layer(server))
        .layer(TimeoutLayer::new(server.request_timeout()))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = server
        .cors_origins_list()
        .into_iter()
        .filter_map(|origin| match HeaderValue::from_str(&origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if origins.is_empty() && !server.is_production() {
        return CorsLayer::permissive();
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PATCH])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static(USER_ID_HEADER),
            HeaderName::from_static(USER_EMAIL_HEADER),
            HeaderName::from_static(USER_ROLE_HEADER),
        ])
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
