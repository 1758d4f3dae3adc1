//! Product domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use sweet_delights_core::{Money, ProductId};

/// A catalog product.
///
/// Serialized directly in API responses; there is no separate view type
/// because the catalog has no hidden fields.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    /// Unique product ID.
    pub id: ProductId,
    /// URL-safe slug, unique across the catalog.
    pub handle: String,
    /// Display title.
    pub title: String,
    /// Long description.
    pub description: String,
    /// Category slug (e.g. "chocolate", "caramel", "gift-sets").
    pub category: String,
    /// Unit price.
    pub price: Money,
    /// Shipping weight in grams; feeds delivery quotes.
    pub weight_grams: i32,
    /// Whether the product can currently be ordered.
    pub available: bool,
    /// When the product was created.
    pub created_at: DateTime<Utc>,
}
