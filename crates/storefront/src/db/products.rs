//! Product repository for catalog operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use sweet_delights_core::{Money, ProductId};

use super::RepositoryError;
use crate::models::product::Product;

/// Database row for a product.
#[derive(sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    handle: String,
    title: String,
    description: String,
    category: String,
    price: Money,
    weight_grams: i32,
    available: bool,
    created_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            handle: row.handle,
            title: row.title,
            description: row.description,
            category: row.category,
            price: row.price,
            weight_grams: row.weight_grams,
            available: row.available,
            created_at: row.created_at,
        }
    }
}

const PRODUCT_COLUMNS: &str =
    "id, handle, title, description, category, price, weight_grams, available, created_at";

/// Page size for catalog listings.
const PAGE_SIZE: i64 = 24;

/// Fields accepted when creating or updating a product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub handle: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub price: Money,
    pub weight_grams: i32,
    pub available: bool,
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List available products, optionally filtered by category,
    /// newest first. `page` is zero-based.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_available(
        &self,
        category: Option<&str>,
        page: i64,
    ) -> Result<Vec<Product>, RepositoryError> {
        let offset = page.max(0) * PAGE_SIZE;

        let rows: Vec<ProductRow> = match category {
            Some(category) => {
                sqlx::query_as(&format!(
                    "SELECT {PRODUCT_COLUMNS} FROM products \
                     WHERE available AND category = $1 \
                     ORDER BY created_at DESC, id DESC \
                     LIMIT $2 OFFSET $3"
                ))
                .bind(category)
                .bind(PAGE_SIZE)
                .bind(offset)
                .fetch_all(self.pool)
                .await?
            }
            None => {
                sqlx::query_as(&format!(
                    "SELECT {PRODUCT_COLUMNS} FROM products \
                     WHERE available \
                     ORDER BY created_at DESC, id DESC \
                     LIMIT $1 OFFSET $2"
                ))
                .bind(PAGE_SIZE)
                .bind(offset)
                .fetch_all(self.pool)
                .await?
            }
        };

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// List every product, including unavailable ones. Admin view.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Get a product by its handle.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_handle(&self, handle: &str) -> Result<Option<Product>, RepositoryError> {
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE handle = $1"
        ))
        .bind(handle)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Product::from))
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Product::from))
    }

    /// Create a product. Admin only.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the handle already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        let row: ProductRow = sqlx::query_as(&format!(
            "INSERT INTO products (handle, title, description, category, price, weight_grams, available) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(&product.handle)
        .bind(&product.title)
        .bind(&product.description)
        .bind(&product.category)
        .bind(product.price)
        .bind(product.weight_grams)
        .bind(product.available)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("handle already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        Ok(Product::from(row))
    }

    /// Update a product in place. Admin only.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        id: ProductId,
        product: &NewProduct,
    ) -> Result<Product, RepositoryError> {
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            "UPDATE products \
             SET handle = $2, title = $3, description = $4, category = $5, \
                 price = $6, weight_grams = $7, available = $8 \
             WHERE id = $1 \
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id)
        .bind(&product.handle)
        .bind(&product.title)
        .bind(&product.description)
        .bind(&product.category)
        .bind(product.price)
        .bind(product.weight_grams)
        .bind(product.available)
        .fetch_optional(self.pool)
        .await?;

        row.map(Product::from).ok_or(RepositoryError::NotFound)
    }
}
