//! Order Aggregate

use chrono::{DateTime, Utc};
use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::domain::value_objects::{CouponCode, Money, UserId};

/// A line as submitted by the client at checkout. Prices are taken as given; the quote
/// and the commit both price from these lines rather than from the stored cart.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutLine {
    pub product_id: Uuid,
    pub name: String,
    pub price: Money,
    pub quantity: u32,
    pub image: Option<String>,
}

impl CheckoutLine {
    pub fn line_total(&self) -> Money { self.price.multiply(self.quantity) }
}

pub fn subtotal_of(lines: &[CheckoutLine]) -> Money { lines.iter().map(CheckoutLine::line_total).sum() }

/// The four amounts an order is priced with. `total` is only ever derived here.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderTotals {
    pub subtotal: Money,
    pub shipping_cost: Money,
    pub discount: Money,
    pub total: Money,
}

impl OrderTotals {
    pub fn compute(subtotal: Money, shipping_cost: Money, discount: Money) -> Self {
        Self { subtotal, shipping_cost, discount, total: subtotal + shipping_cost - discount }
    }

    pub fn without_discount(&self) -> Self { Self::compute(self.subtotal, self.shipping_cost, Money::ZERO) }

    pub fn rounded(&self) -> Self {
        Self { subtotal: self.subtotal.rounded(), shipping_cost: self.shipping_cost.rounded(), discount: self.discount.rounded(), total: self.total.rounded() }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus { #[default] Pending, Paid, Shipped, Delivered, Cancelled }

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod { Card, Pix, Boleto }

macro_rules! text_enum {
    ($ty:ty { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(&self) -> &'static str { match self { $(Self::$variant => $text),+ } }
        }
        impl std::str::FromStr for $ty {
            type Err = String;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s { $($text => Ok(Self::$variant),)+ other => Err(format!("unknown {} {other}", stringify!($ty))) }
            }
        }
    };
}

text_enum!(OrderStatus { Pending => "PENDING", Paid => "PAID", Shipped => "SHIPPED", Delivered => "DELIVERED", Cancelled => "CANCELLED" });
text_enum!(PaymentMethod { Card => "CARD", Pix => "PIX", Boleto => "BOLETO" });

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    /// Digits only.
    pub cpf: Option<String>,
    /// Digits only.
    pub phone: Option<String>,
}

/// An order about to be written. Built once at commit time; nothing reprices it later.
#[derive(Clone, Debug, PartialEq)]
pub struct NewOrder {
    pub id: Uuid,
    pub order_number: String,
    pub user_id: UserId,
    pub payment_method: PaymentMethod,
    pub totals: OrderTotals,
    pub coupon: Option<(Uuid, CouponCode)>,
    pub shipping: ShippingAddress,
    pub items: Vec<CheckoutLine>,
}

impl NewOrder {
    /// Same order priced with no coupon at all.
    pub fn without_coupon(self) -> Self {
        Self { totals: self.totals.without_discount(), coupon: None, ..self }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub id: Uuid,
    pub product_id: Uuid,
    pub name: String,
    pub price: Money,
    pub quantity: u32,
    pub image: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    #[serde(flatten)]
    pub totals: OrderTotals,
    pub coupon_code: Option<String>,
    pub shipping: ShippingAddress,
    pub payment_id: Option<String>,
    pub items: Vec<OrderLine>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// The stored row for a freshly written order.
    pub fn placed(new: &NewOrder, created_at: DateTime<Utc>) -> Self {
        Self {
            id: new.id,
            order_number: new.order_number.clone(),
            user_id: new.user_id,
            status: OrderStatus::Pending,
            payment_method: new.payment_method,
            totals: new.totals,
            coupon_code: new.coupon.as_ref().map(|(_, code)| code.to_string()),
            shipping: new.shipping.clone(),
            payment_id: None,
            items: new.items.iter().map(|line| OrderLine {
                id: Uuid::new_v4(),
                product_id: line.product_id,
                name: line.name.clone(),
                price: line.price,
                quantity: line.quantity,
                image: line.image.clone(),
            }).collect(),
            created_at,
        }
    }
}

/// `ORD-<unix millis>-<6 uppercase alphanumerics>`.
pub fn generate_order_number(now: DateTime<Utc>) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(|c| char::from(c).to_ascii_uppercase())
        .collect();
    format!("ORD-{}-{}", now.timestamp_millis(), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(price_cents: i64, quantity: u32) -> CheckoutLine {
        CheckoutLine { product_id: Uuid::new_v4(), name: "Item".into(), price: Money::from_cents(price_cents), quantity, image: None }
    }

    #[test]
    fn test_totals_scenario() {
        let subtotal = subtotal_of(&[line(1000, 2), line(500, 1)]);
        assert_eq!(subtotal, Money::from_cents(2500));
        let totals = OrderTotals::compute(subtotal, Money::from_cents(1590), Money::ZERO);
        assert_eq!(totals.total, Money::from_cents(4090));
    }

    #[test]
    fn test_without_discount_recomputes_total() {
        let totals = OrderTotals::compute(Money::from_cents(15000), Money::from_cents(1590), Money::from_cents(1500));
        assert_eq!(totals.total, Money::from_cents(15090));
        assert_eq!(totals.without_discount().total, Money::from_cents(16590));
    }

    #[test]
    fn test_order_number_format() {
        let number = generate_order_number(Utc::now());
        let parts: Vec<_> = number.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "ORD");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), 6);
        assert!(parts[2].chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn test_text_enums() {
        assert_eq!("PIX".parse::<PaymentMethod>(), Ok(PaymentMethod::Pix));
        assert_eq!(OrderStatus::Paid.as_str(), "PAID");
        assert!("WIRE".parse::<PaymentMethod>().is_err());
    }
}
