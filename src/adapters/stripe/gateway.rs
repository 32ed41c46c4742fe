//! Stripe PaymentIntents adapter.
//!
//! Implements [`PaymentGateway`] over Stripe's form-encoded REST API.
//!
//! ```ignore
//! let config = StripeConfig::new(Some(secret_key)).with_api_version("2024-06-20");
//! let gateway = StripePaymentGateway::new(config);
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;

use crate::domain::foundation::Money;
use crate::domain::payment::PaymentIntentStatus;
use crate::domain::webhook::ORDER_ID_METADATA_KEY;
use crate::ports::{
    ConfirmOutcome, CreateIntentRequest, PaymentError, PaymentErrorCode, PaymentGateway,
    PaymentIntent, RefundOutcome,
};

use super::api_types::{StripeApiError, StripeErrorEnvelope, StripePaymentIntent, StripeRefund};

pub const DEFAULT_API_BASE_URL: &str = "https://api.stripe.com";

/// Stripe API configuration.
#[derive(Clone)]
pub struct StripeConfig {
    /// `sk_live_...` / `sk_test_...`. `None` switches the gateway off.
    secret_key: Option<SecretString>,
    api_base_url: String,
    /// Sent as `Stripe-Version` when set.
    api_version: Option<String>,
    timeout: Duration,
}

impl StripeConfig {
    pub fn new(secret_key: Option<SecretString>) -> Self {
        Self {
            secret_key,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_version: None,
            timeout: Duration::from_secs(30),
        }
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = Some(version.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn is_configured(&self) -> bool {
        self.secret_key.is_some()
    }
}

pub struct StripePaymentGateway {
    config: StripeConfig,
    http_client: reqwest::Client,
}

impl StripePaymentGateway {
    pub fn new(config: StripeConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Falling back to default HTTP client for Stripe");
                reqwest::Client::new()
            });
        Self {
            config,
            http_client,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base_url, path)
    }

    fn secret_key(&self) -> Result<&SecretString, PaymentError> {
        self.config
            .secret_key
            .as_ref()
            .ok_or_else(|| PaymentError::unavailable("Stripe secret key is not configured"))
    }

    fn authorize(&self, builder: RequestBuilder) -> Result<RequestBuilder, PaymentError> {
        let key = self.secret_key()?;
        let builder = builder.basic_auth(key.expose_secret(), Option::<&str>::None);
        Ok(match &self.config.api_version {
            Some(version) => builder.header("Stripe-Version", version),
            None => builder,
        })
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, PaymentError> {
        self.authorize(builder)?
            .send()
            .await
            .map_err(|e| PaymentError::network(e.to_string()))
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> Result<T, PaymentError> {
        response.json().await.map_err(|e| {
            PaymentError::provider(format!("Failed to parse Stripe response: {}", e))
        })
    }

    /// Splits a non-2xx response into its status and decoded error body.
    async fn read_error(response: Response) -> (StatusCode, StripeApiError) {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let error = serde_json::from_str::<StripeErrorEnvelope>(&body)
            .map(|envelope| envelope.error)
            .unwrap_or_else(|_| StripeApiError {
                message: Some(body),
                ..StripeApiError::default()
            });
        (status, error)
    }

    fn classify(status: StatusCode, error: &StripeApiError) -> PaymentError {
        let message = error.display_message();
        let err = match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                PaymentError::authentication(message)
            }
            StatusCode::NOT_FOUND => PaymentError::new(PaymentErrorCode::NotFound, message),
            StatusCode::TOO_MANY_REQUESTS => {
                PaymentError::new(PaymentErrorCode::RateLimitExceeded, message)
            }
            StatusCode::PAYMENT_REQUIRED if error.is_card_error() => {
                PaymentError::new(PaymentErrorCode::CardDeclined, message)
            }
            s if s.is_client_error() => PaymentError::invalid_request(message),
            _ => PaymentError::provider(format!("Stripe API error: {}", message)),
        };
        match &error.code {
            Some(code) => err.with_provider_code(code.clone()),
            None => err,
        }
    }

    async fn expect_success<T: DeserializeOwned>(
        response: Response,
        operation: &'static str,
    ) -> Result<T, PaymentError> {
        if response.status().is_success() {
            return Self::parse(response).await;
        }
        let (status, error) = Self::read_error(response).await;
        tracing::error!(
            operation,
            status = %status,
            code = ?error.code,
            error = %error.display_message(),
            "Stripe request failed"
        );
        Err(Self::classify(status, &error))
    }

    async fn retrieve_intent(&self, intent_id: &str) -> Result<PaymentIntent, PaymentError> {
        let response = self
            .send(self.http_client.get(self.url(&format!("/v1/payment_intents/{}", intent_id))))
            .await?;
        let intent: StripePaymentIntent = Self::expect_success(response, "retrieve_intent").await?;
        Ok(intent.into())
    }
}

#[async_trait]
impl PaymentGateway for StripePaymentGateway {
    async fn create_intent(
        &self,
        request: CreateIntentRequest,
    ) -> Result<PaymentIntent, PaymentError> {
        let amount = Money::positive("amount", request.amount.minor_units())
            .map_err(|e| PaymentError::invalid_request(e.to_string()))?;
        self.secret_key()?;

        let mut params: Vec<(String, String)> = vec![
            ("amount".into(), amount.minor_units().to_string()),
            ("currency".into(), request.currency.as_str().to_string()),
            ("automatic_payment_methods[enabled]".into(), "true".into()),
        ];
        if let Some(description) = &request.description {
            params.push(("description".into(), description.clone()));
        }
        for (key, value) in &request.metadata {
            if key != ORDER_ID_METADATA_KEY {
                params.push((format!("metadata[{}]", key), value.clone()));
            }
        }
        params.push((
            format!("metadata[{}]", ORDER_ID_METADATA_KEY),
            request.order_id.to_string(),
        ));

        let builder = self
            .http_client
            .post(self.url("/v1/payment_intents"))
            .header("Idempotency-Key", uuid::Uuid::new_v4().to_string())
            .form(&params);
        let response = self.send(builder).await?;
        let intent: StripePaymentIntent = Self::expect_success(response, "create_intent").await?;

        tracing::info!(
            intent_id = %intent.id,
            order_id = %request.order_id,
            amount = intent.amount,
            "Created payment intent"
        );
        Ok(intent.into())
    }

    async fn confirm(
        &self,
        intent_id: &str,
        payment_method_id: Option<&str>,
    ) -> Result<ConfirmOutcome, PaymentError> {
        let intent = self.retrieve_intent(intent_id).await?;

        if intent.status.is_succeeded() {
            return Ok(ConfirmOutcome {
                succeeded: true,
                intent,
                decline_message: None,
            });
        }

        let method = match (intent.status.clone(), payment_method_id) {
            (PaymentIntentStatus::RequiresPaymentMethod, Some(method)) => method,
            _ => {
                return Ok(ConfirmOutcome {
                    succeeded: false,
                    intent,
                    decline_message: None,
                })
            }
        };

        let builder = self
            .http_client
            .post(self.url(&format!("/v1/payment_intents/{}/confirm", intent_id)))
            .form(&[("payment_method", method)]);
        let response = self.send(builder).await?;

        if response.status().is_success() {
            let confirmed: PaymentIntent = Self::parse::<StripePaymentIntent>(response).await?.into();
            return Ok(ConfirmOutcome {
                succeeded: confirmed.status.is_succeeded(),
                intent: confirmed,
                decline_message: None,
            });
        }

        let (status, error) = Self::read_error(response).await;
        if error.is_card_error() {
            tracing::info!(
                intent_id,
                decline_code = ?error.decline_code,
                "Payment declined"
            );
            let declined = match error.payment_intent.clone() {
                Some(pi) => (*pi).into(),
                None => self.retrieve_intent(intent_id).await?,
            };
            return Ok(ConfirmOutcome {
                succeeded: false,
                intent: declined,
                decline_message: Some(error.display_message()),
            });
        }
        Err(Self::classify(status, &error))
    }

    async fn refund(
        &self,
        intent_id: &str,
        amount: Option<Money>,
    ) -> Result<RefundOutcome, PaymentError> {
        let mut params = vec![("payment_intent", intent_id.to_string())];
        if let Some(amount) = amount {
            params.push(("amount", amount.minor_units().to_string()));
        }

        let builder = self
            .http_client
            .post(self.url("/v1/refunds"))
            .header("Idempotency-Key", uuid::Uuid::new_v4().to_string())
            .form(&params);
        let response = self.send(builder).await?;

        if response.status().is_success() {
            let refund: StripeRefund = Self::parse(response).await?;
            if refund.is_failed() {
                return Ok(RefundOutcome {
                    success: false,
                    refund_id: Some(refund.id),
                    amount: Some(refund.amount),
                    message: refund
                        .failure_reason
                        .unwrap_or_else(|| "Refund failed".to_string()),
                });
            }
            tracing::info!(intent_id, refund_id = %refund.id, amount = refund.amount, "Refund issued");
            return Ok(RefundOutcome {
                success: true,
                refund_id: Some(refund.id),
                amount: Some(refund.amount),
                message: "Refund processed".to_string(),
            });
        }

        let (status, error) = Self::read_error(response).await;
        if status == StatusCode::BAD_REQUEST || status == StatusCode::PAYMENT_REQUIRED {
            // e.g. amount exceeds what was captured, or already refunded
            tracing::warn!(intent_id, error = %error.display_message(), "Refund rejected by Stripe");
            return Ok(RefundOutcome::rejected(error.display_message()));
        }
        Err(Self::classify(status, &error))
    }

    async fn get_status(&self, intent_id: &str) -> Result<PaymentIntent, PaymentError> {
        self.retrieve_intent(intent_id).await
    }

    async fn is_available(&self) -> bool {
        let builder = self.http_client.get(self.url("/v1/balance"));
        match self.send(builder).await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                if e.code != PaymentErrorCode::GatewayUnavailable {
                    tracing::warn!(error = %e, "Stripe availability probe failed");
                }
                false
            }
        }
    }
}
