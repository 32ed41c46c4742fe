//! CheckPaymentAvailabilityHandler - Whether checkout can take payments.

use std::sync::Arc;

use crate::ports::PaymentGateway;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckPaymentAvailabilityResult {
    pub available: bool,
}

pub struct CheckPaymentAvailabilityHandler {
    gateway: Arc<dyn PaymentGateway>,
}

impl CheckPaymentAvailabilityHandler {
    pub fn new(gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { gateway }
    }

    pub async fn handle(&self) -> CheckPaymentAvailabilityResult {
        let available = self.gateway.is_available().await;
        if !available {
            tracing::debug!("Payment gateway reported unavailable");
        }
        CheckPaymentAvailabilityResult { available }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::stripe::MockPaymentGateway;

    #[tokio::test]
    async fn reports_gateway_availability() {
        let gateway = MockPaymentGateway::new();
        let handler = CheckPaymentAvailabilityHandler::new(Arc::new(gateway.clone()));
        assert!(handler.handle().await.available);

        gateway.set_available(false);
        assert!(!handler.handle().await.available);
    }
}
