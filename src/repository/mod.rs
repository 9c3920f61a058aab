//! Storage seams.
//!
//! Services talk to storage only through these traits. [`postgres`] is the production
//! implementation; tests run against the in-memory store.

pub mod postgres;

#[cfg(test)]
pub(crate) mod memory;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::aggregates::{CartItem, Coupon, NewOrder, Order, Product};
use crate::domain::value_objects::{CouponCode, Owner, SessionId, UserId};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error("stored row is malformed: {0}")]
    Corrupt(String),

    #[error("value does not fit its column: {0}")]
    OutOfRange(String),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Outcome of writing an order together with its coupon redemption.
#[derive(Debug, Clone, PartialEq)]
pub enum Placement {
    Placed(Order),
    /// The coupon stopped being redeemable between pricing and writing. Nothing was
    /// written.
    CouponUnavailable,
}

#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn product(&self, id: Uuid) -> Result<Option<Product>, StoreError>;
}

#[async_trait]
pub trait CartStore: Send + Sync {
    /// Every line held by `owner`, joined with its product.
    async fn items(&self, owner: &Owner) -> Result<Vec<CartItem>, StoreError>;

    /// Creates the (owner, product) line with `quantity`, or folds `quantity` into the
    /// existing line capped at `cap`, as one atomic statement.
    async fn add_or_merge(&self, owner: &Owner, product_id: Uuid, quantity: u32, cap: u32) -> Result<(), StoreError>;

    /// Rows touched; zero when `item_id` is not held by `owner`.
    async fn set_quantity(&self, owner: &Owner, item_id: Uuid, quantity: u32) -> Result<u64, StoreError>;

    async fn remove(&self, owner: &Owner, item_id: Uuid) -> Result<u64, StoreError>;

    /// Folds one session line into the user's cart and deletes the session row, atomically.
    async fn move_to_user(&self, session: &SessionId, item: &CartItem, user: UserId) -> Result<(), StoreError>;
}

#[async_trait]
pub trait CouponStore: Send + Sync {
    async fn find_by_code(&self, code: &CouponCode) -> Result<Option<Coupon>, StoreError>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Writes the order and, when it carries a coupon, increments that coupon's usage
    /// counter in the same transaction. The increment only applies while the coupon is
    /// still redeemable; otherwise nothing is written.
    async fn place(&self, order: &NewOrder) -> Result<Placement, StoreError>;

    async fn list_for_user(&self, user: UserId) -> Result<Vec<Order>, StoreError>;

    async fn find_for_user(&self, user: UserId, id: Uuid) -> Result<Option<Order>, StoreError>;

    /// Rows touched; zero when the order is not the user's.
    async fn record_payment(&self, user: UserId, id: Uuid, payment_id: &str) -> Result<u64, StoreError>;
}
