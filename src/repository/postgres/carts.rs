use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::postgres::{PgArguments, Postgres};
use sqlx::query::Query;
use uuid::Uuid;

use crate::domain::aggregates::{CartItem, Product};
use crate::domain::value_objects::{Money, Owner, SessionId, UserId};
use crate::repository::{CartStore, StoreError};
use super::{to_i32, to_u32, PgStore};

/// Owner predicate on `$1`. Each branch matches one of the partial unique indexes.
fn owner_filter(owner: &Owner) -> &'static str {
    match owner {
        Owner::User(_) => "ci.user_id = $1",
        Owner::Session(_) => "ci.session_id = $1",
    }
}

fn bind_owner<'q>(query: Query<'q, Postgres, PgArguments>, owner: &'q Owner) -> Query<'q, Postgres, PgArguments> {
    match owner {
        Owner::User(user) => query.bind(user.as_uuid()),
        Owner::Session(session) => query.bind(session.as_str()),
    }
}

const UPSERT_USER_ITEM_SQL: &str = "INSERT INTO cart_items (id, user_id, session_id, product_id, quantity) \
     VALUES ($1, $2, $3, $4, $5) \
     ON CONFLICT (user_id, product_id) WHERE user_id IS NOT NULL DO UPDATE SET \
         quantity = LEAST(cart_items.quantity + EXCLUDED.quantity, $6), \
         updated_at = NOW()";

const UPSERT_SESSION_ITEM_SQL: &str = "INSERT INTO cart_items (id, user_id, session_id, product_id, quantity) \
     VALUES ($1, $2, $3, $4, $5) \
     ON CONFLICT (session_id, product_id) WHERE session_id IS NOT NULL DO UPDATE SET \
         quantity = LEAST(cart_items.quantity + EXCLUDED.quantity, $6), \
         updated_at = NOW()";

#[derive(Debug, Clone, sqlx::FromRow)]
struct CartItemRow {
    id: Uuid,
    quantity: i32,
    product_id: Uuid,
    name: String,
    slug: String,
    price: Decimal,
    images: Vec<String>,
    stock: i32,
    published: bool,
}

impl TryFrom<CartItemRow> for CartItem {
    type Error = StoreError;

    fn try_from(row: CartItemRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            quantity: to_u32(row.quantity, "cart_items.quantity")?,
            product: Product { id: row.product_id, name: row.name, slug: row.slug, price: Money::new(row.price), images: row.images, stock: row.stock, published: row.published },
        })
    }
}

#[async_trait]
impl CartStore for PgStore {
    async fn items(&self, owner: &Owner) -> Result<Vec<CartItem>, StoreError> {
        let sql = format!(
            "SELECT ci.id, ci.quantity, p.id AS product_id, p.name, p.slug, p.price, p.images, p.stock, p.published \
             FROM cart_items ci JOIN products p ON p.id = ci.product_id \
             WHERE {} ORDER BY ci.created_at, ci.id",
            owner_filter(owner)
        );
        let query = sqlx::query_as::<_, CartItemRow>(&sql);
        let query = match owner {
            Owner::User(user) => query.bind(user.as_uuid()),
            Owner::Session(session) => query.bind(session.as_str()),
        };
        query
            .fetch_all(self.pool())
            .await?
            .into_iter()
            .map(CartItem::try_from)
            .collect()
    }

    async fn add_or_merge(&self, owner: &Owner, product_id: Uuid, quantity: u32, cap: u32) -> Result<(), StoreError> {
        let (user_id, session_id) = owner.columns();
        let sql = if owner.is_user() { UPSERT_USER_ITEM_SQL } else { UPSERT_SESSION_ITEM_SQL };
        sqlx::query(sql)
            .bind(Uuid::now_v7())
            .bind(user_id)
            .bind(session_id)
            .bind(product_id)
            .bind(to_i32(quantity, "cart_items.quantity")?)
            .bind(to_i32(cap, "cart_items.quantity")?)
            .execute(self.pool())
            .await?;
        Ok(())
    }

    async fn set_quantity(&self, owner: &Owner, item_id: Uuid, quantity: u32) -> Result<u64, StoreError> {
        let sql = format!(
            "UPDATE cart_items ci SET quantity = $3, updated_at = NOW() WHERE {} AND ci.id = $2",
            owner_filter(owner)
        );
        let result = bind_owner(sqlx::query(&sql), owner)
            .bind(item_id)
            .bind(to_i32(quantity, "cart_items.quantity")?)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected())
    }

    async fn remove(&self, owner: &Owner, item_id: Uuid) -> Result<u64, StoreError> {
        let sql = format!("DELETE FROM cart_items ci WHERE {} AND ci.id = $2", owner_filter(owner));
        let result = bind_owner(sqlx::query(&sql), owner)
            .bind(item_id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected())
    }

    async fn move_to_user(&self, session: &SessionId, item: &CartItem, user: UserId) -> Result<(), StoreError> {
        let mut tx = self.pool().begin().await?;

        // Claiming the session row first makes a concurrent or repeated sync a no-op.
        let claimed: Option<i32> = sqlx::query_scalar("DELETE FROM cart_items WHERE id = $1 AND session_id = $2 RETURNING quantity")
            .bind(item.id)
            .bind(session.as_str())
            .fetch_optional(&mut *tx)
            .await?;

        let Some(quantity) = claimed else {
            tx.rollback().await?;
            return Ok(());
        };

        sqlx::query(UPSERT_USER_ITEM_SQL)
            .bind(Uuid::now_v7())
            .bind(Some(user.as_uuid()))
            .bind(None::<String>)
            .bind(item.product.id)
            .bind(quantity)
            .bind(to_i32(item.product.available(), "cart_items.quantity")?)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}
