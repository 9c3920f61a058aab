use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::aggregates::Product;
use crate::domain::value_objects::Money;
use crate::repository::{ProductCatalog, StoreError};
use super::PgStore;

#[derive(Debug, Clone, sqlx::FromRow)]
pub(super) struct ProductRow {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub price: Decimal,
    pub images: Vec<String>,
    pub stock: i32,
    pub published: bool,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self { id: row.id, name: row.name, slug: row.slug, price: Money::new(row.price), images: row.images, stock: row.stock, published: row.published }
    }
}

#[async_trait]
impl ProductCatalog for PgStore {
    async fn product(&self, id: Uuid) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query_as::<_, ProductRow>("SELECT id, name, slug, price, images, stock, published FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(row.map(Product::from))
    }
}
