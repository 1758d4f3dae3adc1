//! Yandex Delivery B2B platform client.
//!
//! One call: the pricing calculator. Yandex quotes a single express
//! option per request, so this client returns at most one
//! [`DeliveryQuote`].
//!
//! # API Reference
//!
//! - Base URL: `https://b2b-authproxy.taxi.yandex.net`
//! - Auth: static OAuth token via `Authorization: Bearer <token>`

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use sweet_delights_core::{DeliveryProvider, Money};

use super::DeliveryQuote;
use crate::config::YandexDeliveryConfig;

/// B2B platform base URL.
const BASE_URL: &str = "https://b2b-authproxy.taxi.yandex.net";

/// Errors that can occur when talking to Yandex Delivery.
#[derive(Debug, Error)]
pub enum YandexDeliveryError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Response was well-formed but not understandable.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Yandex Delivery API client.
#[derive(Clone)]
pub struct YandexDeliveryClient {
    inner: Arc<YandexDeliveryClientInner>,
}

struct YandexDeliveryClientInner {
    client: reqwest::Client,
}

// ============================================================================
// Wire types (the subset the storefront consumes)
// ============================================================================

#[derive(Serialize)]
struct PricingRequest {
    destination: Destination,
    places: Vec<Place>,
    tariff: &'static str,
}

#[derive(Serialize)]
struct Destination {
    address: String,
}

#[derive(Serialize)]
struct Place {
    physical_dims: PhysicalDims,
}

#[derive(Serialize)]
struct PhysicalDims {
    /// Gross weight in grams.
    weight_gross: i64,
}

#[derive(Deserialize)]
struct PricingResponse {
    /// Total as a decimal string, e.g. `"438.00"`.
    pricing_total: String,
}

impl YandexDeliveryClient {
    /// Create a new Yandex Delivery API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &YandexDeliveryConfig) -> Result<Self, reqwest::Error> {
        let mut headers = reqwest::header::HeaderMap::new();
        let auth_value = format!("Bearer {}", config.token.expose_secret());
        if let Ok(mut value) = reqwest::header::HeaderValue::from_str(&auth_value) {
            value.set_sensitive(true);
            headers.insert(reqwest::header::AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(15))
            .build()?;

        Ok(Self {
            inner: Arc::new(YandexDeliveryClientInner { client }),
        })
    }

    /// Quote express delivery to a street address.
    ///
    /// # Errors
    ///
    /// Returns `YandexDeliveryError` if the request fails or the price
    /// string cannot be parsed.
    #[instrument(skip(self))]
    pub async fn calculate(
        &self,
        address: &str,
        weight_grams: i64,
    ) -> Result<DeliveryQuote, YandexDeliveryError> {
        let request = PricingRequest {
            destination: Destination {
                address: address.to_owned(),
            },
            places: vec![Place {
                physical_dims: PhysicalDims {
                    weight_gross: weight_grams,
                },
            }],
            tariff: "express",
        };

        let url = format!("{BASE_URL}/api/b2b/platform/pricing-calculator");
        let response = self.inner.client.post(&url).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(YandexDeliveryError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: PricingResponse = response
            .json()
            .await
            .map_err(|e| YandexDeliveryError::Parse(e.to_string()))?;

        let cost = parse_pricing_total(&body.pricing_total)?;

        Ok(DeliveryQuote {
            provider: DeliveryProvider::YandexDelivery,
            tariff: "Яндекс Доставка (экспресс)".to_owned(),
            cost,
            min_days: Some(0),
            max_days: Some(1),
        })
    }
}

/// Parse the platform's `pricing_total` string.
///
/// The field is a plain decimal, optionally suffixed with a currency code
/// (`"438.00 RUB"`).
fn parse_pricing_total(raw: &str) -> Result<Money, YandexDeliveryError> {
    let number = raw.split_whitespace().next().unwrap_or(raw);
    let amount: Decimal = number
        .parse()
        .map_err(|_| YandexDeliveryError::Parse(format!("bad pricing_total: {raw}")))?;
    Money::new(amount).map_err(|_| YandexDeliveryError::Parse(format!("bad pricing_total: {raw}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_pricing_request_shape() {
        let request = PricingRequest {
            destination: Destination {
                address: "Москва, Тверская 1".to_owned(),
            },
            places: vec![Place {
                physical_dims: PhysicalDims { weight_gross: 900 },
            }],
            tariff: "express",
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["destination"]["address"], "Москва, Тверская 1");
        assert_eq!(json["places"][0]["physical_dims"]["weight_gross"], 900);
        assert_eq!(json["tariff"], "express");
    }

    #[test]
    fn test_parse_pricing_total_plain() {
        assert_eq!(
            parse_pricing_total("438.00").unwrap(),
            Money::from_kopecks(43_800)
        );
    }

    #[test]
    fn test_parse_pricing_total_with_currency() {
        assert_eq!(
            parse_pricing_total("438.00 RUB").unwrap(),
            Money::from_kopecks(43_800)
        );
    }

    #[test]
    fn test_parse_pricing_total_garbage() {
        assert!(parse_pricing_total("free").is_err());
        assert!(parse_pricing_total("-10.00").is_err());
    }
}
