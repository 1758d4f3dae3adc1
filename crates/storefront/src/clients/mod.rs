//! Typed clients for third-party providers.
//!
//! Each client wraps `reqwest` with default headers and maps provider
//! responses into the narrow set of fields the storefront consumes.

pub mod cdek;
pub mod robokassa;
pub mod telegram;
pub mod yandex_delivery;

pub use cdek::{CdekClient, CdekError};
pub use robokassa::RobokassaClient;
pub use telegram::{TelegramClient, TelegramError};
pub use yandex_delivery::{YandexDeliveryClient, YandexDeliveryError};

use serde::Serialize;

use sweet_delights_core::{DeliveryProvider, Money};

/// A delivery quote returned to the client, provider-agnostic.
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryQuote {
    /// Which provider produced the quote.
    pub provider: DeliveryProvider,
    /// Provider's tariff name (e.g. "Посылка склад-дверь").
    pub tariff: String,
    /// Quoted cost.
    pub cost: Money,
    /// Fastest estimate, in days.
    pub min_days: Option<i32>,
    /// Slowest estimate, in days.
    pub max_days: Option<i32>,
}
