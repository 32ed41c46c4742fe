//! PostgreSQL implementation of ProductCatalog.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::foundation::{DomainError, Money, ProductId};
use crate::ports::{CatalogProduct, ProductCatalog};

use super::{corrupt, db_error};

pub struct PostgresProductCatalog {
    pool: PgPool,
}

impl PostgresProductCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i64,
    name: String,
    price: i64,
    is_available: bool,
}

impl TryFrom<ProductRow> for CatalogProduct {
    type Error = DomainError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        Ok(CatalogProduct {
            id: ProductId::new(row.id).map_err(corrupt)?,
            name: row.name,
            price: Money::try_new("price", row.price).map_err(corrupt)?,
            is_available: row.is_available,
        })
    }
}

#[async_trait]
impl ProductCatalog for PostgresProductCatalog {
    async fn find_many(&self, ids: &[ProductId]) -> Result<Vec<CatalogProduct>, DomainError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let raw: Vec<i64> = ids.iter().map(ProductId::value).collect();

        let rows: Vec<ProductRow> = sqlx::query_as(
            "SELECT id, name, price, is_available FROM products WHERE id = ANY($1)",
        )
        .bind(&raw)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to fetch products", e))?;

        rows.into_iter().map(CatalogProduct::try_from).collect()
    }
}
