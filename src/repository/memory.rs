//! In-memory store used by service and router tests.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::aggregates::{CartItem, Coupon, NewOrder, Order, Product};
use crate::domain::value_objects::{CouponCode, Owner, SessionId, UserId};
use super::{CartStore, CouponStore, OrderStore, Placement, ProductCatalog, StoreError};

#[derive(Debug, Clone)]
struct CartRow {
    id: Uuid,
    owner: Owner,
    product_id: Uuid,
    quantity: u32,
}

#[derive(Debug, Default)]
struct State {
    products: HashMap<Uuid, Product>,
    cart: Vec<CartRow>,
    coupons: HashMap<Uuid, Coupon>,
    orders: Vec<Order>,
    fail_next_order: bool,
}

#[derive(Debug, Default)]
pub(crate) struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub(crate) async fn insert_product(&self, product: Product) {
        self.state.lock().await.products.insert(product.id, product);
    }

    pub(crate) async fn set_stock(&self, product_id: Uuid, stock: i32) {
        if let Some(p) = self.state.lock().await.products.get_mut(&product_id) { p.stock = stock; }
    }

    pub(crate) async fn insert_coupon(&self, coupon: Coupon) {
        self.state.lock().await.coupons.insert(coupon.id, coupon);
    }

    pub(crate) async fn coupon(&self, id: Uuid) -> Option<Coupon> {
        self.state.lock().await.coupons.get(&id).cloned()
    }

    /// Writes a cart row directly, bypassing the add rules.
    pub(crate) async fn put_cart_row(&self, owner: Owner, product_id: Uuid, quantity: u32) -> Uuid {
        let id = Uuid::new_v4();
        self.state.lock().await.cart.push(CartRow { id, owner, product_id, quantity });
        id
    }

    /// `(product_id, stored quantity)` for every row held by `owner`.
    pub(crate) async fn stored(&self, owner: &Owner) -> Vec<(Uuid, u32)> {
        self.state.lock().await.cart.iter().filter(|r| &r.owner == owner).map(|r| (r.product_id, r.quantity)).collect()
    }

    pub(crate) async fn order_count(&self) -> usize { self.state.lock().await.orders.len() }

    pub(crate) async fn fail_next_order(&self) { self.state.lock().await.fail_next_order = true; }
}

/// Same rule as the `LEAST(quantity + incoming, cap)` upsert in the Postgres store.
fn merged_quantity(existing: u32, incoming: u32, cap: u32) -> u32 {
    existing.saturating_add(incoming).min(cap)
}

fn fold(state: &mut State, owner: &Owner, product_id: Uuid, quantity: u32, cap: u32) {
    match state.cart.iter_mut().find(|r| &r.owner == owner && r.product_id == product_id) {
        Some(row) => row.quantity = merged_quantity(row.quantity, quantity, cap),
        None => state.cart.push(CartRow { id: Uuid::new_v4(), owner: owner.clone(), product_id, quantity }),
    }
}

#[async_trait]
impl ProductCatalog for MemoryStore {
    async fn product(&self, id: Uuid) -> Result<Option<Product>, StoreError> {
        Ok(self.state.lock().await.products.get(&id).cloned())
    }
}

#[async_trait]
impl CartStore for MemoryStore {
    async fn items(&self, owner: &Owner) -> Result<Vec<CartItem>, StoreError> {
        let state = self.state.lock().await;
        state.cart.iter()
            .filter(|r| &r.owner == owner)
            .map(|r| {
                let product = state.products.get(&r.product_id).cloned()
                    .ok_or_else(|| StoreError::Corrupt(format!("dangling product {}", r.product_id)))?;
                Ok(CartItem { id: r.id, product, quantity: r.quantity })
            })
            .collect()
    }

    async fn add_or_merge(&self, owner: &Owner, product_id: Uuid, quantity: u32, cap: u32) -> Result<(), StoreError> {
        fold(&mut *self.state.lock().await, owner, product_id, quantity, cap);
        Ok(())
    }

    async fn set_quantity(&self, owner: &Owner, item_id: Uuid, quantity: u32) -> Result<u64, StoreError> {
        let mut state = self.state.lock().await;
        let mut touched = 0;
        for row in state.cart.iter_mut().filter(|r| &r.owner == owner && r.id == item_id) {
            row.quantity = quantity;
            touched += 1;
        }
        Ok(touched)
    }

    async fn remove(&self, owner: &Owner, item_id: Uuid) -> Result<u64, StoreError> {
        let mut state = self.state.lock().await;
        let before = state.cart.len();
        state.cart.retain(|r| !(&r.owner == owner && r.id == item_id));
        Ok((before - state.cart.len()) as u64)
    }

    async fn move_to_user(&self, session: &SessionId, item: &CartItem, user: UserId) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        let session_owner = Owner::Session(session.clone());
        let Some(pos) = state.cart.iter().position(|r| r.id == item.id && r.owner == session_owner) else {
            return Ok(());
        };
        let claimed = state.cart.remove(pos);
        fold(&mut state, &Owner::User(user), claimed.product_id, claimed.quantity, item.product.available());
        Ok(())
    }
}

#[async_trait]
impl CouponStore for MemoryStore {
    async fn find_by_code(&self, code: &CouponCode) -> Result<Option<Coupon>, StoreError> {
        Ok(self.state.lock().await.coupons.values().find(|c| &c.code == code).cloned())
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn place(&self, order: &NewOrder) -> Result<Placement, StoreError> {
        let mut state = self.state.lock().await;
        if let Some((coupon_id, _)) = &order.coupon {
            let redeemable = state.coupons.get(coupon_id).is_some_and(|c| c.check_redeemable(Utc::now()).is_ok());
            if !redeemable { return Ok(Placement::CouponUnavailable); }
        }
        if state.fail_next_order {
            state.fail_next_order = false;
            return Err(StoreError::Unavailable("order insert failed".into()));
        }
        if let Some(c) = order.coupon.as_ref().and_then(|(id, _)| state.coupons.get_mut(id)) {
            c.used_count += 1;
        }
        let placed = Order::placed(order, Utc::now());
        state.orders.push(placed.clone());
        Ok(Placement::Placed(placed))
    }

    async fn list_for_user(&self, user: UserId) -> Result<Vec<Order>, StoreError> {
        let state = self.state.lock().await;
        let mut orders: Vec<Order> = state.orders.iter().filter(|o| o.user_id == user).cloned().collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn find_for_user(&self, user: UserId, id: Uuid) -> Result<Option<Order>, StoreError> {
        Ok(self.state.lock().await.orders.iter().find(|o| o.user_id == user && o.id == id).cloned())
    }

    async fn record_payment(&self, user: UserId, id: Uuid, payment_id: &str) -> Result<u64, StoreError> {
        let mut state = self.state.lock().await;
        let Some(order) = state.orders.iter_mut().find(|o| o.user_id == user && o.id == id) else { return Ok(0) };
        order.payment_id = Some(payment_id.to_string());
        order.status = crate::domain::aggregates::OrderStatus::Paid;
        Ok(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merged_quantity_caps_at_stock() {
        assert_eq!(merged_quantity(2, 3, 10), 5);
        assert_eq!(merged_quantity(8, 5, 10), 10);
        assert_eq!(merged_quantity(u32::MAX, 1, 4), 4);
    }
}
