//! CDEK v2 API client.
//!
//! Covers the two calls the storefront makes: tariff quotes and order
//! tracking. OAuth tokens (client-credentials grant, ~1 hour lifetime)
//! are cached and refreshed on expiry.
//!
//! # API Reference
//!
//! - Base URL: `https://api.cdek.ru` (sandbox: `https://api.edu.cdek.ru`)
//! - Auth: `POST /v2/oauth/token`, then `Authorization: Bearer <token>`

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use sweet_delights_core::{DeliveryProvider, Money};

use super::DeliveryQuote;
use crate::config::CdekConfig;

/// City code of the shop's dispatch warehouse (Moscow).
const SHOP_CITY_CODE: i32 = 44;

/// Refresh tokens a bit before CDEK's one-hour expiry.
const TOKEN_TTL: Duration = Duration::from_secs(50 * 60);

/// Errors that can occur when talking to CDEK.
#[derive(Debug, Error, Clone)]
pub enum CdekError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(Arc<reqwest::Error>),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// OAuth token request was rejected.
    #[error("Unauthorized: token request rejected")]
    Unauthorized,

    /// Response was well-formed but missing the fields we need.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for CdekError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(Arc::new(e))
    }
}

/// CDEK API client.
#[derive(Clone)]
pub struct CdekClient {
    inner: Arc<CdekClientInner>,
}

struct CdekClientInner {
    client: reqwest::Client,
    base_url: String,
    client_id: String,
    client_secret: SecretString,
    /// One entry keyed by client id; moka handles the TTL.
    token_cache: Cache<String, String>,
}

// ============================================================================
// Wire types (the subset the storefront consumes)
// ============================================================================

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Serialize)]
struct Location {
    code: i32,
}

#[derive(Serialize)]
struct Package {
    /// Weight in grams.
    weight: i64,
}

#[derive(Serialize)]
struct TariffListRequest {
    from_location: Location,
    to_location: Location,
    packages: Vec<Package>,
}

#[derive(Deserialize)]
struct TariffListResponse {
    #[serde(default)]
    tariff_codes: Vec<Tariff>,
}

#[derive(Deserialize)]
struct Tariff {
    tariff_name: String,
    delivery_sum: Decimal,
    period_min: Option<i32>,
    period_max: Option<i32>,
}

#[derive(Deserialize)]
struct OrdersResponse {
    entity: Option<OrderEntity>,
}

#[derive(Deserialize)]
struct OrderEntity {
    #[serde(default)]
    statuses: Vec<OrderStatusEntry>,
}

/// One tracking event of a CDEK order.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OrderStatusEntry {
    /// Status code (e.g. `CREATED`, `DELIVERED`).
    pub code: String,
    /// Human-readable status name.
    pub name: String,
    /// When the status was reached.
    pub date_time: String,
    /// City where the parcel was at that point.
    pub city: Option<String>,
}

impl CdekClient {
    /// Create a new CDEK API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &CdekConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;

        Ok(Self {
            inner: Arc::new(CdekClientInner {
                client,
                base_url: config.base_url.clone(),
                client_id: config.client_id.clone(),
                client_secret: config.client_secret.clone(),
                token_cache: Cache::builder()
                    .max_capacity(1)
                    .time_to_live(TOKEN_TTL)
                    .build(),
            }),
        })
    }

    /// Get a bearer token, fetching a fresh one when the cache expired.
    async fn token(&self) -> Result<String, CdekError> {
        let inner = Arc::clone(&self.inner);
        self.inner
            .token_cache
            .try_get_with(self.inner.client_id.clone(), async move {
                fetch_token(&inner).await
            })
            .await
            .map_err(|e: Arc<CdekError>| (*e).clone())
    }

    /// Quote delivery tariffs to a destination city.
    ///
    /// # Errors
    ///
    /// Returns `CdekError` if the request or authentication fails.
    #[instrument(skip(self))]
    pub async fn calculate(
        &self,
        to_city_code: i32,
        weight_grams: i64,
    ) -> Result<Vec<DeliveryQuote>, CdekError> {
        let token = self.token().await?;

        let request = TariffListRequest {
            from_location: Location {
                code: SHOP_CITY_CODE,
            },
            to_location: Location { code: to_city_code },
            packages: vec![Package {
                weight: weight_grams,
            }],
        };

        let url = format!("{}/v2/calculator/tarifflist", self.inner.base_url);
        let response = self
            .inner
            .client
            .post(&url)
            .bearer_auth(&token)
            .json(&request)
            .send()
            .await?;

        let body: TariffListResponse = handle_response(response).await?;

        let quotes = body
            .tariff_codes
            .into_iter()
            .filter_map(|tariff| {
                let cost = Money::new(tariff.delivery_sum).ok()?;
                Some(DeliveryQuote {
                    provider: DeliveryProvider::Cdek,
                    tariff: tariff.tariff_name,
                    cost,
                    min_days: tariff.period_min,
                    max_days: tariff.period_max,
                })
            })
            .collect();

        Ok(quotes)
    }

    /// Fetch tracking events for an order by our order number
    /// (`im_number` on the CDEK side).
    ///
    /// Returns `None` if CDEK doesn't know the order (yet).
    ///
    /// # Errors
    ///
    /// Returns `CdekError` if the request or authentication fails.
    #[instrument(skip(self))]
    pub async fn track(
        &self,
        im_number: &str,
    ) -> Result<Option<Vec<OrderStatusEntry>>, CdekError> {
        let token = self.token().await?;

        let url = format!("{}/v2/orders", self.inner.base_url);
        let response = self
            .inner
            .client
            .get(&url)
            .bearer_auth(&token)
            .query(&[("im_number", im_number)])
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let body: OrdersResponse = handle_response(response).await?;
        Ok(body.entity.map(|entity| entity.statuses))
    }
}

async fn fetch_token(inner: &CdekClientInner) -> Result<String, CdekError> {
    let url = format!("{}/v2/oauth/token", inner.base_url);
    let response = inner
        .client
        .post(&url)
        .form(&[
            ("grant_type", "client_credentials"),
            ("client_id", inner.client_id.as_str()),
            ("client_secret", inner.client_secret.expose_secret()),
        ])
        .send()
        .await?;

    if response.status() == reqwest::StatusCode::UNAUTHORIZED
        || response.status() == reqwest::StatusCode::BAD_REQUEST
    {
        return Err(CdekError::Unauthorized);
    }

    let token: TokenResponse = handle_response(response).await?;
    Ok(token.access_token)
}

async fn handle_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, CdekError> {
    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(CdekError::Api {
            status: status.as_u16(),
            message,
        });
    }

    response
        .json::<T>()
        .await
        .map_err(|e| CdekError::Parse(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_tariff_request_serializes_to_cdek_shape() {
        let request = TariffListRequest {
            from_location: Location { code: 44 },
            to_location: Location { code: 137 },
            packages: vec![Package { weight: 1200 }],
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["from_location"]["code"], 44);
        assert_eq!(json["to_location"]["code"], 137);
        assert_eq!(json["packages"][0]["weight"], 1200);
    }

    #[test]
    fn test_tariff_response_parses() {
        let body = r#"{
            "tariff_codes": [
                {"tariff_code": 136, "tariff_name": "Посылка склад-склад",
                 "delivery_mode": 4, "delivery_sum": 385.0,
                 "period_min": 2, "period_max": 4}
            ]
        }"#;

        let parsed: TariffListResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.tariff_codes.len(), 1);
        let tariff = parsed.tariff_codes.first().unwrap();
        assert_eq!(tariff.tariff_name, "Посылка склад-склад");
        assert_eq!(tariff.period_min, Some(2));
    }

    #[test]
    fn test_tariff_response_tolerates_missing_list() {
        let parsed: TariffListResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.tariff_codes.is_empty());
    }

    #[test]
    fn test_orders_response_parses_statuses() {
        let body = r#"{
            "entity": {
                "uuid": "72753031-...",
                "statuses": [
                    {"code": "CREATED", "name": "Создан",
                     "date_time": "2026-02-01T10:00:00+0000", "city": "Москва"},
                    {"code": "DELIVERED", "name": "Вручен",
                     "date_time": "2026-02-05T15:30:00+0000"}
                ]
            }
        }"#;

        let parsed: OrdersResponse = serde_json::from_str(body).unwrap();
        let statuses = parsed.entity.unwrap().statuses;
        assert_eq!(statuses.len(), 2);
        assert_eq!(statuses.first().unwrap().code, "CREATED");
        assert_eq!(statuses.get(1).unwrap().city, None);
    }
}
