use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use uuid::Uuid;

use crate::domain::aggregates::{NewOrder, Order, OrderLine, OrderTotals, ShippingAddress};
use crate::domain::value_objects::{Money, UserId};
use crate::repository::{OrderStore, Placement, StoreError};
use super::{to_i32, to_u32, PgStore};

/// Conditional so that concurrent redemptions of a limited coupon cannot overshoot.
const REDEEM_COUPON_SQL: &str = "UPDATE coupons SET used_count = used_count + 1, updated_at = NOW() \
     WHERE id = $1 AND active AND starts_at <= NOW() AND ends_at >= NOW() \
       AND (max_uses IS NULL OR used_count < max_uses)";

const INSERT_ORDER_SQL: &str = "INSERT INTO orders \
         (id, order_number, user_id, status, payment_method, subtotal, shipping_cost, discount, total, coupon_code, \
          shipping_street, shipping_city, shipping_state, shipping_zip, shipping_cpf, shipping_phone) \
     VALUES ($1, $2, $3, 'PENDING', $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15) \
     RETURNING created_at";

const INSERT_ORDER_ITEM_SQL: &str = "INSERT INTO order_items (id, order_id, product_id, name, price, quantity, image) \
     VALUES ($1, $2, $3, $4, $5, $6, $7)";

const ORDER_COLUMNS: &str = "id, order_number, user_id, status, payment_method, subtotal, shipping_cost, discount, total, coupon_code, \
     shipping_street, shipping_city, shipping_state, shipping_zip, shipping_cpf, shipping_phone, payment_id, created_at";

#[derive(Debug, Clone, sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    order_number: String,
    user_id: Uuid,
    status: String,
    payment_method: String,
    subtotal: Decimal,
    shipping_cost: Decimal,
    discount: Decimal,
    total: Decimal,
    coupon_code: Option<String>,
    shipping_street: String,
    shipping_city: String,
    shipping_state: String,
    shipping_zip: String,
    shipping_cpf: Option<String>,
    shipping_phone: Option<String>,
    payment_id: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct OrderItemRow {
    id: Uuid,
    order_id: Uuid,
    product_id: Uuid,
    name: String,
    price: Decimal,
    quantity: i32,
    image: Option<String>,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderLine>) -> Result<Order, StoreError> {
        Ok(Order {
            id: self.id,
            order_number: self.order_number,
            user_id: UserId::new(self.user_id),
            status: self.status.parse().map_err(StoreError::Corrupt)?,
            payment_method: self.payment_method.parse().map_err(StoreError::Corrupt)?,
            // Stored as written at commit; never recomputed on read.
            totals: OrderTotals {
                subtotal: Money::new(self.subtotal),
                shipping_cost: Money::new(self.shipping_cost),
                discount: Money::new(self.discount),
                total: Money::new(self.total),
            },
            coupon_code: self.coupon_code,
            shipping: ShippingAddress {
                street: self.shipping_street,
                city: self.shipping_city,
                state: self.shipping_state,
                zip: self.shipping_zip,
                cpf: self.shipping_cpf,
                phone: self.shipping_phone,
            },
            payment_id: self.payment_id,
            items,
            created_at: self.created_at,
        })
    }
}

impl TryFrom<OrderItemRow> for OrderLine {
    type Error = StoreError;

    fn try_from(row: OrderItemRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            product_id: row.product_id,
            name: row.name,
            price: Money::new(row.price),
            quantity: to_u32(row.quantity, "order_items.quantity")?,
            image: row.image,
        })
    }
}

impl PgStore {
    async fn attach_items(&self, rows: Vec<OrderRow>) -> Result<Vec<Order>, StoreError> {
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let item_rows = sqlx::query_as::<_, OrderItemRow>(
            "SELECT id, order_id, product_id, name, price, quantity, image FROM order_items WHERE order_id = ANY($1) ORDER BY id",
        )
        .bind(&ids)
        .fetch_all(self.pool())
        .await?;

        let mut by_order: HashMap<Uuid, Vec<OrderLine>> = HashMap::new();
        for row in item_rows {
            let order_id = row.order_id;
            by_order.entry(order_id).or_default().push(OrderLine::try_from(row)?);
        }

        rows.into_iter()
            .map(|row| {
                let items = by_order.remove(&row.id).unwrap_or_default();
                row.into_order(items)
            })
            .collect()
    }
}

#[async_trait]
impl OrderStore for PgStore {
    async fn place(&self, order: &NewOrder) -> Result<Placement, StoreError> {
        let mut tx = self.pool().begin().await?;

        if let Some((coupon_id, code)) = &order.coupon {
            let redeemed = sqlx::query(REDEEM_COUPON_SQL).bind(coupon_id).execute(&mut *tx).await?.rows_affected();
            if redeemed == 0 {
                tracing::warn!(coupon = %code, "coupon no longer redeemable at commit");
                tx.rollback().await?;
                return Ok(Placement::CouponUnavailable);
            }
        }

        let created_at: DateTime<Utc> = sqlx::query_scalar(INSERT_ORDER_SQL)
            .bind(order.id)
            .bind(&order.order_number)
            .bind(order.user_id.as_uuid())
            .bind(order.payment_method.as_str())
            .bind(order.totals.subtotal.amount())
            .bind(order.totals.shipping_cost.amount())
            .bind(order.totals.discount.amount())
            .bind(order.totals.total.amount())
            .bind(order.coupon.as_ref().map(|(_, code)| code.as_str()))
            .bind(&order.shipping.street)
            .bind(&order.shipping.city)
            .bind(&order.shipping.state)
            .bind(&order.shipping.zip)
            .bind(order.shipping.cpf.as_deref())
            .bind(order.shipping.phone.as_deref())
            .fetch_one(&mut *tx)
            .await?;

        let placed = Order::placed(order, created_at);
        for line in &placed.items {
            sqlx::query(INSERT_ORDER_ITEM_SQL)
                .bind(line.id)
                .bind(placed.id)
                .bind(line.product_id)
                .bind(&line.name)
                .bind(line.price.amount())
                .bind(to_i32(line.quantity, "order_items.quantity")?)
                .bind(line.image.as_deref())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(Placement::Placed(placed))
    }

    async fn list_for_user(&self, user: UserId) -> Result<Vec<Order>, StoreError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC"))
            .bind(user.as_uuid())
            .fetch_all(self.pool())
            .await?;
        self.attach_items(rows).await
    }

    async fn find_for_user(&self, user: UserId, id: Uuid) -> Result<Option<Order>, StoreError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 AND user_id = $2"))
            .bind(id)
            .bind(user.as_uuid())
            .fetch_optional(self.pool())
            .await?;
        match row {
            Some(row) => Ok(self.attach_items(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn record_payment(&self, user: UserId, id: Uuid, payment_id: &str) -> Result<u64, StoreError> {
        let result = sqlx::query("UPDATE orders SET payment_id = $3, status = 'PAID', updated_at = NOW() WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user.as_uuid())
            .bind(payment_id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected())
    }
}
