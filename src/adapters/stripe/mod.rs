//! Stripe payment gateway adapter.
//!
//! Implements the `PaymentGateway` port against the PaymentIntents API:
//! - Intent creation with the order id in metadata
//! - Confirmation and decline reporting
//! - Full and partial refunds
//! - Status lookups and an availability probe
//!
//! Webhook signature verification lives with the webhook domain, since it
//! needs only the signing secret and no API access.
//!
//! # Configuration
//!
//! - `CREAMERY__PAYMENT__STRIPE_SECRET_KEY`: secret API key. When absent the
//!   gateway reports itself unavailable instead of failing startup.

mod api_types;
mod gateway;
mod mock;

pub use api_types::{ExpandableId, StripeApiError, StripePaymentIntent, StripeRefund};
pub use gateway::{StripeConfig, StripePaymentGateway, DEFAULT_API_BASE_URL};
pub use mock::{MethodCall, MockPaymentGateway};
