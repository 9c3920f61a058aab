//! Coupon Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;
use crate::domain::value_objects::{CouponCode, Money};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CouponType { Percentage, Fixed }

impl CouponType {
    pub fn as_str(&self) -> &'static str {
        match self { Self::Percentage => "PERCENTAGE", Self::Fixed => "FIXED" }
    }
}

impl std::str::FromStr for CouponType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PERCENTAGE" => Ok(Self::Percentage),
            "FIXED" => Ok(Self::Fixed),
            other => Err(format!("unknown coupon type {other}")),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    pub id: Uuid,
    pub code: CouponCode,
    #[serde(rename = "type")]
    pub kind: CouponType,
    pub value: Decimal,
    pub min_purchase: Option<Money>,
    pub max_uses: Option<i32>,
    pub used_count: i32,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub active: bool,
}

/// Why a coupon cannot be applied to a purchase.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CouponRejection {
    #[error("invalid or expired coupon")]
    InvalidOrExpired,

    #[error("coupon usage limit reached")]
    Exhausted,

    #[error("minimum purchase for this coupon: {minimum}")]
    BelowMinimum { minimum: Money },
}

/// A coupon that passed validation, with the discount it grants on a given subtotal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Discount {
    pub coupon_id: Uuid,
    pub code: CouponCode,
    #[serde(rename = "type")]
    pub kind: CouponType,
    pub value: Decimal,
    pub amount: Money,
}

/// How a pricing path reacts to a coupon that does not validate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CouponPolicy {
    /// Surface the rejection to the caller.
    Strict,
    /// Price the order as if no coupon was given.
    Lenient,
}

impl Coupon {
    pub fn is_exhausted(&self) -> bool {
        self.max_uses.is_some_and(|max| self.used_count >= max)
    }

    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        self.active && self.starts_at <= now && now <= self.ends_at
    }

    /// Redeemable right now, ignoring the purchase amount. Exhaustion is reported before
    /// the activity window.
    pub fn check_redeemable(&self, now: DateTime<Utc>) -> Result<(), CouponRejection> {
        if self.is_exhausted() { return Err(CouponRejection::Exhausted); }
        if !self.is_live_at(now) { return Err(CouponRejection::InvalidOrExpired); }
        Ok(())
    }

    /// Discount on `subtotal`, in whole cents. A fixed discount never exceeds the subtotal.
    pub fn discount_for(&self, subtotal: Money) -> Money {
        let amount = match self.kind {
            CouponType::Percentage => subtotal.percent(self.value),
            CouponType::Fixed => Money::new(self.value).min(subtotal),
        };
        amount.rounded()
    }

    pub fn validate(&self, now: DateTime<Utc>, subtotal: Money) -> Result<Discount, CouponRejection> {
        self.check_redeemable(now)?;
        if let Some(minimum) = self.min_purchase {
            if subtotal < minimum { return Err(CouponRejection::BelowMinimum { minimum }); }
        }
        Ok(Discount {
            coupon_id: self.id,
            code: self.code.clone(),
            kind: self.kind,
            value: self.value,
            amount: self.discount_for(subtotal),
        })
    }
}
