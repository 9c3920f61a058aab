//! Value Objects for the storefront

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Sub};
use uuid::Uuid;

/// Largest quantity a single cart request may ask for.
pub const MAX_LINE_QUANTITY: u32 = 99;

const MAX_SESSION_LEN: usize = 128;
const POSTAL_CODE_DIGITS: usize = 8;

/// Money value object.
///
/// The store sells in one currency, so amounts carry no currency tag. Arithmetic keeps
/// the full decimal precision; [`Money::rounded`] and [`Money::to_minor_units`] are the
/// only places rounding happens. Pricing settles order amounts to cents with `rounded`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    pub fn new(amount: Decimal) -> Self { Self(amount) }
    pub fn from_cents(cents: i64) -> Self { Self(Decimal::new(cents, 2)) }
    pub fn amount(&self) -> Decimal { self.0 }
    pub fn multiply(&self, qty: u32) -> Money { Money(self.0 * Decimal::from(qty)) }
    pub fn is_positive(&self) -> bool { self.0 > Decimal::ZERO }

    /// `rate` percent of this amount, unrounded.
    pub fn percent(&self, rate: Decimal) -> Money { Money(rate / Decimal::ONE_HUNDRED * self.0) }

    /// Two decimal places, half away from zero, always at scale 2.
    pub fn rounded(&self) -> Money {
        let mut amount = self.0.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        amount.rescale(2);
        Money(amount)
    }

    /// Amount in cents, rounded half away from zero. `None` when it does not fit an `i64`.
    pub fn to_minor_units(&self) -> Option<i64> {
        (self.0 * Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self { Self(amount) }
}

impl Add for Money {
    type Output = Money;
    fn add(self, rhs: Money) -> Money { Money(self.0 + rhs.0) }
}

impl Sub for Money {
    type Output = Money;
    fn sub(self, rhs: Money) -> Money { Money(self.0 - rhs.0) }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self { iter.fold(Money::ZERO, Add::add) }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{:.2}", self.rounded().0) }
}

/// Quantity value object for cart requests.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(u32);

impl Quantity {
    /// A quantity being added to a cart: 1 to 99.
    pub fn requested(value: u32) -> Result<Self, QuantityError> {
        if !(1..=MAX_LINE_QUANTITY).contains(&value) {
            return Err(QuantityError { value, min: 1 });
        }
        Ok(Self(value))
    }

    /// A quantity replacing an existing line: 0 (remove) to 99.
    pub fn adjusted(value: u32) -> Result<Self, QuantityError> {
        if value > MAX_LINE_QUANTITY {
            return Err(QuantityError { value, min: 0 });
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> u32 { self.0 }
    pub fn is_zero(&self) -> bool { self.0 == 0 }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantityError { pub value: u32, pub min: u32 }
impl std::error::Error for QuantityError {}
impl fmt::Display for QuantityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "quantity {} outside {}..={}", self.value, self.min, MAX_LINE_QUANTITY)
    }
}

/// Coupon code value object, normalized to trimmed uppercase.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CouponCode(String);

impl CouponCode {
    pub fn new(value: impl Into<String>) -> Result<Self, CouponCodeError> {
        let value = value.into().trim().to_uppercase();
        if value.is_empty() { return Err(CouponCodeError); }
        Ok(Self(value))
    }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl TryFrom<String> for CouponCode {
    type Error = CouponCodeError;
    fn try_from(value: String) -> Result<Self, Self::Error> { Self::new(value) }
}

impl From<CouponCode> for String {
    fn from(code: CouponCode) -> Self { code.0 }
}

impl fmt::Display for CouponCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub struct CouponCodeError;
impl std::error::Error for CouponCodeError {}
impl fmt::Display for CouponCodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "coupon code empty") }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    pub fn new(id: Uuid) -> Self { Self(id) }
    pub fn as_uuid(&self) -> Uuid { self.0 }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

/// Client-generated token identifying an anonymous cart.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Blank or oversized tokens are treated as absent.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() || raw.len() > MAX_SESSION_LEN { return None; }
        Some(Self(raw.to_string()))
    }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

/// Who a cart belongs to. Exactly one key, never both.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Owner {
    User(UserId),
    Session(SessionId),
}

impl Owner {
    /// An authenticated user wins over a session token; with neither the cart is unidentified.
    pub fn resolve(user: Option<UserId>, session: Option<SessionId>) -> Option<Owner> {
        match (user, session) {
            (Some(user), _) => Some(Owner::User(user)),
            (None, Some(session)) => Some(Owner::Session(session)),
            (None, None) => None,
        }
    }

    pub fn is_user(&self) -> bool { matches!(self, Owner::User(_)) }

    /// The `(user_id, session_id)` column pair for this owner; exactly one is set.
    pub fn columns(&self) -> (Option<Uuid>, Option<&str>) {
        match self {
            Owner::User(user) => (Some(user.as_uuid()), None),
            Owner::Session(session) => (None, Some(session.as_str())),
        }
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Owner::User(user) => write!(f, "user:{user}"),
            Owner::Session(session) => write!(f, "session:{session}"),
        }
    }
}

/// Brazilian postal code (CEP), digits only.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostalCode(String);

impl PostalCode {
    pub fn parse(raw: &str) -> Option<Self> {
        let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
        (digits.len() == POSTAL_CODE_DIGITS).then_some(Self(digits))
    }
    pub fn as_str(&self) -> &str { &self.0 }
}

/// Keeps only the digits of a document or phone number; `None` when nothing is left.
pub fn digits_only(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    (!digits.is_empty()).then_some(digits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coupon_code() { let code = CouponCode::new("  primeiracompra ").unwrap(); assert_eq!(code.as_str(), "PRIMEIRACOMPRA"); }

    #[test]
    fn test_coupon_code_rejects_blank() { assert!(CouponCode::new("   ").is_err()); }

    #[test]
    fn test_money_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);
        assert_eq!(a.multiply(2) + b, Money::from_cents(2500));
        assert_eq!(a - b, Money::from_cents(500));
        assert_eq!([a, b, b].into_iter().sum::<Money>(), Money::from_cents(2000));
    }

    #[test]
    fn test_money_percent_is_exact() {
        assert_eq!(Money::from_cents(10000).percent(Decimal::new(10, 0)), Money::from_cents(1000));
        let third = Money::from_cents(1000).percent(Decimal::new(33, 0));
        assert_eq!(third.amount(), Decimal::new(330, 2));
    }

    #[test]
    fn test_money_presentation_rounding() {
        let m = Money::new(Decimal::new(40905, 3));
        assert_eq!(m.rounded(), Money::from_cents(4091));
        assert_eq!(m.to_minor_units(), Some(4091));
        assert_eq!(Money::from_cents(4090).to_string(), "40.90");
        assert_eq!(Money::new(Decimal::new(150, 1)).rounded().amount().to_string(), "15.00");
    }

    #[test]
    fn test_quantity_bounds() {
        assert!(Quantity::requested(0).is_err());
        assert!(Quantity::requested(100).is_err());
        assert_eq!(Quantity::requested(99).unwrap().value(), 99);
        assert!(Quantity::adjusted(0).unwrap().is_zero());
        assert!(Quantity::adjusted(100).is_err());
    }

    #[test]
    fn test_owner_resolution_precedence() {
        let user = UserId::new(Uuid::new_v4());
        let session = SessionId::parse("abc-123");
        assert_eq!(Owner::resolve(Some(user), session.clone()), Some(Owner::User(user)));
        assert_eq!(Owner::resolve(None, session.clone()), session.map(Owner::Session));
        assert_eq!(Owner::resolve(None, None), None);
    }

    #[test]
    fn test_session_id_blank_is_absent() {
        assert!(SessionId::parse("  ").is_none());
        assert!(SessionId::parse(&"x".repeat(200)).is_none());
    }

    #[test]
    fn test_postal_code() {
        assert_eq!(PostalCode::parse("01310-100").unwrap().as_str(), "01310100");
        assert!(PostalCode::parse("1234").is_none());
        assert_eq!(digits_only("123.456.789-09").as_deref(), Some("12345678909"));
        assert_eq!(digits_only("--"), None);
    }
}
