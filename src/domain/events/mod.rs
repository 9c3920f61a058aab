//! Domain events
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    Cart(CartEvent),
    Order(OrderEvent),
    Coupon(CouponEvent),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CartEvent {
    Merged { user_id: Uuid, session_id: String, items: usize },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum OrderEvent {
    Placed { order_id: Uuid, order_number: String, user_id: Uuid, total: Decimal },
    Paid { order_id: Uuid, payment_id: String },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CouponEvent {
    Redeemed { coupon_id: Uuid, code: String, order_id: Uuid },
}

impl DomainEvent {
    /// NATS subject the event is published on.
    pub fn subject(&self) -> &'static str {
        match self {
            DomainEvent::Cart(CartEvent::Merged { .. }) => "storefront.cart.merged",
            DomainEvent::Order(OrderEvent::Placed { .. }) => "storefront.order.placed",
            DomainEvent::Order(OrderEvent::Paid { .. }) => "storefront.order.paid",
            DomainEvent::Coupon(CouponEvent::Redeemed { .. }) => "storefront.coupon.redeemed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subject_and_payload() {
        let event = DomainEvent::Coupon(CouponEvent::Redeemed { coupon_id: Uuid::nil(), code: "PRIMEIRACOMPRA".into(), order_id: Uuid::nil() });
        assert_eq!(event.subject(), "storefront.coupon.redeemed");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "coupon");
        assert_eq!(json["event"], "redeemed");
        assert_eq!(json["code"], "PRIMEIRACOMPRA");
    }
}
