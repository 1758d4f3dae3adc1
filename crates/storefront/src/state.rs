//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::clients::{CdekClient, RobokassaClient, TelegramClient, YandexDeliveryClient};
use crate::config::StorefrontConfig;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and provider clients.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    cdek: CdekClient,
    yandex_delivery: YandexDeliveryClient,
    robokassa: RobokassaClient,
    telegram: Option<TelegramClient>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if a provider client fails to build its HTTP client.
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Result<Self, reqwest::Error> {
        let cdek = CdekClient::new(&config.cdek)?;
        let yandex_delivery = YandexDeliveryClient::new(&config.yandex_delivery)?;
        let robokassa = RobokassaClient::new(&config.robokassa);
        let telegram = config
            .telegram
            .as_ref()
            .map(TelegramClient::new)
            .transpose()?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                cdek,
                yandex_delivery,
                robokassa,
                telegram,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the CDEK API client.
    #[must_use]
    pub fn cdek(&self) -> &CdekClient {
        &self.inner.cdek
    }

    /// Get a reference to the Yandex Delivery API client.
    #[must_use]
    pub fn yandex_delivery(&self) -> &YandexDeliveryClient {
        &self.inner.yandex_delivery
    }

    /// Get a reference to the Robokassa payment helper.
    #[must_use]
    pub fn robokassa(&self) -> &RobokassaClient {
        &self.inner.robokassa
    }

    /// Get the Telegram notifier, if configured.
    #[must_use]
    pub fn telegram(&self) -> Option<&TelegramClient> {
        self.inner.telegram.as_ref()
    }
}
