//! Customer notification adapters.

mod logging;
mod resend;

pub use logging::LoggingNotificationDispatcher;
pub use resend::{ResendConfig, ResendNotificationDispatcher, DEFAULT_RESEND_API_URL};
