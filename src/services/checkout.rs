//! Checkout service: payment-intent quotes, order creation and order history.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::aggregates::order::generate_order_number;
use crate::domain::aggregates::{CheckoutLine, CouponPolicy, NewOrder, Order, PaymentMethod, ShippingAddress};
use crate::domain::events::{CouponEvent, DomainEvent, OrderEvent};
use crate::domain::value_objects::{digits_only, Money, UserId};
use crate::messaging::{emit, EventPublisher};
use crate::payment::PaymentGateway;
use crate::repository::{OrderStore, Placement, StoreError};
use crate::services::pricing::{PricedOrder, PricingEngine};
use crate::{Result, StorefrontError};

/// Everything the client submits to pay for and place an order.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutRequest {
    pub items: Vec<CheckoutLine>,
    pub shipping: ShippingAddress,
    pub shipping_cost: Money,
    pub payment_method: PaymentMethod,
    pub coupon_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentQuote {
    pub client_secret: String,
    /// Minor units (cents).
    pub amount: i64,
}

#[derive(Clone)]
pub struct CheckoutService {
    pricing: PricingEngine,
    orders: Arc<dyn OrderStore>,
    payments: Arc<dyn PaymentGateway>,
    events: Arc<dyn EventPublisher>,
}

impl CheckoutService {
    pub fn new(
        pricing: PricingEngine,
        orders: Arc<dyn OrderStore>,
        payments: Arc<dyn PaymentGateway>,
        events: Arc<dyn EventPublisher>,
    ) -> Self {
        Self { pricing, orders, payments, events }
    }

    async fn price(&self, request: &CheckoutRequest, now: DateTime<Utc>) -> Result<PricedOrder> {
        self.pricing
            .compute_order_total(&request.items, request.shipping_cost, request.coupon_code.as_deref(), CouponPolicy::Lenient, now)
            .await
    }

    /// Prices the order and opens a payment intent for its total. Coupon usage is not
    /// touched here.
    pub async fn quote(&self, request: &CheckoutRequest, now: DateTime<Utc>) -> Result<PaymentQuote> {
        let priced = self.price(request, now).await?;
        let total = priced.totals.total;
        let amount = total.to_minor_units().filter(|cents| *cents > 0).ok_or(StorefrontError::InvalidAmount)?;

        let intent = self.payments.create_intent(total).await?;
        info!(intent = %intent.id, amount, "payment intent quoted");
        Ok(PaymentQuote { client_secret: intent.client_secret, amount })
    }

    /// Writes the order. A coupon that validated is redeemed in the same write; if it
    /// was used up in the meantime the order is placed at full price instead.
    pub async fn commit(&self, user: UserId, request: CheckoutRequest, now: DateTime<Utc>) -> Result<Order> {
        let priced = self.price(&request, now).await?;
        let shipping = ShippingAddress {
            cpf: request.shipping.cpf.as_deref().and_then(digits_only),
            phone: request.shipping.phone.as_deref().and_then(digits_only),
            ..request.shipping
        };
        let order = NewOrder {
            id: Uuid::now_v7(),
            order_number: generate_order_number(now),
            user_id: user,
            payment_method: request.payment_method,
            totals: priced.totals,
            coupon: priced.discount.as_ref().map(|d| (d.coupon_id, d.code.clone())),
            shipping,
            items: request.items,
        };

        let placement = self.orders.place(&order).await?;
        let placed = match placement {
            Placement::Placed(placed) => placed,
            Placement::CouponUnavailable => {
                warn!(order = %order.order_number, "coupon used up before the order was written; placing without discount");
                match self.orders.place(&order.without_coupon()).await? {
                    Placement::Placed(placed) => placed,
                    Placement::CouponUnavailable => {
                        return Err(StoreError::Corrupt("coupon conflict on an order without coupon".into()).into())
                    }
                }
            }
        };

        info!(order = %placed.order_number, %user, total = %placed.totals.total, "order placed");

        let mut events = vec![DomainEvent::Order(OrderEvent::Placed {
            order_id: placed.id,
            order_number: placed.order_number.clone(),
            user_id: user.as_uuid(),
            total: placed.totals.total.amount(),
        })];
        if let (Some(discount), Some(_)) = (&priced.discount, &placed.coupon_code) {
            events.push(DomainEvent::Coupon(CouponEvent::Redeemed {
                coupon_id: discount.coupon_id,
                code: discount.code.to_string(),
                order_id: placed.id,
            }));
        }
        emit(self.events.as_ref(), events).await;

        Ok(placed)
    }

    /// Newest first.
    pub async fn list_orders(&self, user: UserId) -> Result<Vec<Order>> {
        Ok(self.orders.list_for_user(user).await?)
    }

    pub async fn get_order(&self, user: UserId, id: Uuid) -> Result<Order> {
        self.orders.find_for_user(user, id).await?.ok_or(StorefrontError::OrderNotFound)
    }

    pub async fn confirm_payment(&self, user: UserId, id: Uuid, payment_id: &str) -> Result<()> {
        if self.orders.record_payment(user, id, payment_id).await? == 0 {
            return Err(StorefrontError::OrderNotFound);
        }
        info!(order = %id, payment = payment_id, "order paid");
        let paid = DomainEvent::Order(OrderEvent::Paid { order_id: id, payment_id: payment_id.to_string() });
        emit(self.events.as_ref(), [paid]).await;
        Ok(())
    }
}
