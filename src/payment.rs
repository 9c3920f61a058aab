//! Payment gateway seam.
//!
//! Checkout only needs one thing from the gateway: a payment intent for an amount, and
//! the client secret the browser uses to confirm it.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::domain::value_objects::Money;

#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("payment gateway not configured")]
    NotConfigured,

    #[error("amount {0} cannot be charged")]
    UnchargeableAmount(Money),

    #[error("payment gateway request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("payment gateway rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: String,
    /// Minor units (cents).
    pub amount: i64,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_intent(&self, amount: Money) -> Result<PaymentIntent, PaymentError>;
}

/// Stripe's payment-intents API over plain HTTPS.
#[derive(Debug, Clone)]
pub struct StripeGateway {
    client: reqwest::Client,
    base_url: String,
    secret_key: Option<String>,
    currency: String,
}

#[derive(Debug, Deserialize)]
struct IntentResponse {
    id: String,
    client_secret: String,
    amount: i64,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

impl StripeGateway {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, secret_key: Option<String>, currency: impl Into<String>) -> Self {
        Self { client, base_url: base_url.into().trim_end_matches('/').to_string(), secret_key, currency: currency.into() }
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_intent(&self, amount: Money) -> Result<PaymentIntent, PaymentError> {
        let secret_key = self.secret_key.as_deref().ok_or(PaymentError::NotConfigured)?;
        let cents = amount.to_minor_units().filter(|c| *c > 0).ok_or(PaymentError::UnchargeableAmount(amount))?;

        let response = self.client
            .post(format!("{}/v1/payment_intents", self.base_url))
            .bearer_auth(secret_key)
            .form(&[
                ("amount", cents.to_string()),
                ("currency", self.currency.clone()),
                ("automatic_payment_methods[enabled]", "true".to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.json::<ErrorResponse>().await.map(|e| e.error.message).unwrap_or_else(|_| status.to_string());
            return Err(PaymentError::Rejected { status: status.as_u16(), message });
        }

        let intent: IntentResponse = response.json().await?;
        tracing::info!(intent = %intent.id, amount = intent.amount, "payment intent created");
        Ok(PaymentIntent { id: intent.id, client_secret: intent.client_secret, amount: intent.amount })
    }
}
