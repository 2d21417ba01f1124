//! Mercado Pago checkout integration
//!
//! Creates a hosted checkout preference for the pro product and returns its
//! payment URL. Everything beyond preference creation (webhooks, capture)
//! lives on the gateway side.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

const PREFERENCES_URL: &str = "https://api.mercadopago.com/checkout/preferences";

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("gateway rejected the preference ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("gateway response missing checkout URL")]
    MissingUrl,
}

#[derive(Debug, Serialize)]
struct PreferenceRequest<'a> {
    items: Vec<PreferenceItem<'a>>,
}

#[derive(Debug, Serialize)]
struct PreferenceItem<'a> {
    title: &'a str,
    quantity: u32,
    unit_price: f64,
    currency_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct PreferenceResponse {
    #[serde(default)]
    init_point: Option<String>,
}

/// Client for creating checkout preferences.
pub struct CheckoutClient {
    client: Client,
    access_token: String,
    product_title: String,
    product_price: f64,
    currency: String,
}

impl CheckoutClient {
    pub fn new(
        access_token: &str,
        product_title: &str,
        product_price: f64,
        currency: &str,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("tubebrief/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(CheckoutClient {
            client,
            access_token: access_token.to_string(),
            product_title: product_title.to_string(),
            product_price,
            currency: currency.to_string(),
        })
    }

    /// Create a preference for one unit of the pro product and return the
    /// hosted checkout URL.
    pub async fn create_preference(&self) -> Result<String, PaymentError> {
        let body = PreferenceRequest {
            items: vec![PreferenceItem {
                title: &self.product_title,
                quantity: 1,
                unit_price: self.product_price,
                currency_id: &self.currency,
            }],
        };

        debug!(title = %self.product_title, "creating checkout preference");

        let response = self
            .client
            .post(PREFERENCES_URL)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PaymentError::Rejected {
                status: status.as_u16(),
                message: message.chars().take(500).collect(),
            });
        }

        let parsed: PreferenceResponse = response.json().await?;
        let url = parsed.init_point.ok_or(PaymentError::MissingUrl)?;

        info!("checkout preference created");
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preference_request_serializes_single_item() {
        let body = PreferenceRequest {
            items: vec![PreferenceItem {
                title: "TubeBrief Pro",
                quantity: 1,
                unit_price: 9.90,
                currency_id: "BRL",
            }],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["items"][0]["title"], "TubeBrief Pro");
        assert_eq!(json["items"][0]["quantity"], 1);
        assert_eq!(json["items"][0]["currency_id"], "BRL");
    }

    #[test]
    fn response_without_init_point_is_detected() {
        let parsed: PreferenceResponse = serde_json::from_str(r#"{"id": "123"}"#).unwrap();
        assert!(parsed.init_point.is_none());
    }
}
