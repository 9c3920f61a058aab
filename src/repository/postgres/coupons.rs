use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::aggregates::Coupon;
use crate::domain::value_objects::{CouponCode, Money};
use crate::repository::{CouponStore, StoreError};
use super::PgStore;

#[derive(Debug, Clone, sqlx::FromRow)]
struct CouponRow {
    id: Uuid,
    code: String,
    discount_type: String,
    value: Decimal,
    min_purchase: Option<Decimal>,
    max_uses: Option<i32>,
    used_count: i32,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    active: bool,
}

impl TryFrom<CouponRow> for Coupon {
    type Error = StoreError;

    fn try_from(row: CouponRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            code: CouponCode::new(row.code).map_err(|e| StoreError::Corrupt(e.to_string()))?,
            kind: row.discount_type.parse().map_err(StoreError::Corrupt)?,
            value: row.value,
            min_purchase: row.min_purchase.map(Money::new),
            max_uses: row.max_uses,
            used_count: row.used_count,
            starts_at: row.starts_at,
            ends_at: row.ends_at,
            active: row.active,
        })
    }
}

#[async_trait]
impl CouponStore for PgStore {
    async fn find_by_code(&self, code: &CouponCode) -> Result<Option<Coupon>, StoreError> {
        sqlx::query_as::<_, CouponRow>(
            "SELECT id, code, discount_type, value, min_purchase, max_uses, used_count, starts_at, ends_at, active \
             FROM coupons WHERE code = $1",
        )
        .bind(code.as_str())
        .fetch_optional(self.pool())
        .await?
        .map(Coupon::try_from)
        .transpose()
    }
}
