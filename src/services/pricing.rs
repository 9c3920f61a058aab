//! Coupon validation and order pricing.
//!
//! The validate endpoint, the payment-intent quote and order creation all price through
//! [`PricingEngine::compute_order_total`]; they differ only in the [`CouponPolicy`] they
//! pass and in what they do with the result.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::domain::aggregates::{subtotal_of, CheckoutLine, CouponPolicy, CouponRejection, Discount, OrderTotals};
use crate::domain::value_objects::{CouponCode, Money};
use crate::repository::CouponStore;
use crate::Result;

#[derive(Debug, Clone, PartialEq)]
pub struct PricedOrder {
    pub totals: OrderTotals,
    /// Present only when a coupon validated against this subtotal.
    pub discount: Option<Discount>,
}

#[derive(Clone)]
pub struct PricingEngine {
    coupons: Arc<dyn CouponStore>,
}

impl PricingEngine {
    pub fn new(coupons: Arc<dyn CouponStore>) -> Self { Self { coupons } }

    /// Strict validation of a code against a subtotal.
    pub async fn validate_coupon(&self, code: &str, subtotal: Money, now: DateTime<Utc>) -> Result<Discount> {
        self.discount(Some(code), subtotal, CouponPolicy::Strict, now)
            .await?
            .ok_or_else(|| CouponRejection::InvalidOrExpired.into())
    }

    /// Every amount is settled to cents before `total` is derived, so the stored row and the
    /// gateway amount agree with `subtotal + shipping - discount` exactly.
    pub async fn compute_order_total(
        &self,
        lines: &[CheckoutLine],
        shipping_cost: Money,
        coupon_code: Option<&str>,
        policy: CouponPolicy,
        now: DateTime<Utc>,
    ) -> Result<PricedOrder> {
        let subtotal = subtotal_of(lines).rounded();
        let discount = self.discount(coupon_code, subtotal, policy, now).await?;
        let amount = discount.as_ref().map_or(Money::ZERO, |d| d.amount);
        Ok(PricedOrder { totals: OrderTotals::compute(subtotal, shipping_cost.rounded(), amount), discount })
    }

    /// `Ok(None)` means no discount applies: no code was given, or the policy is lenient
    /// and the coupon was rejected. Storage failures propagate under either policy.
    async fn discount(
        &self,
        code: Option<&str>,
        subtotal: Money,
        policy: CouponPolicy,
        now: DateTime<Utc>,
    ) -> Result<Option<Discount>> {
        let Some(raw) = code.filter(|c| !c.trim().is_empty()) else { return Ok(None) };

        let outcome = match CouponCode::new(raw) {
            Ok(code) => match self.coupons.find_by_code(&code).await? {
                Some(coupon) => coupon.validate(now, subtotal),
                None => Err(CouponRejection::InvalidOrExpired),
            },
            Err(_) => Err(CouponRejection::InvalidOrExpired),
        };

        match (outcome, policy) {
            (Ok(discount), _) => Ok(Some(discount)),
            (Err(rejection), CouponPolicy::Strict) => Err(rejection.into()),
            (Err(rejection), CouponPolicy::Lenient) => {
                warn!(code = raw, %rejection, "coupon ignored while pricing");
                Ok(None)
            }
        }
    }
}
