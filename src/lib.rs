//! Storefront checkout core
//!
//! Cart, coupon and checkout backend for a single-currency storefront.
//!
//! ## Features
//! - Anonymous session carts merged into the account cart on sign-in
//! - Stock-aware cart quantities
//! - Coupon validation (percentage and fixed discounts)
//! - Order totals priced identically at payment-intent and order time
//! - Shipping quotes by postal code

pub mod api;
pub mod auth;
pub mod config;
pub mod domain;
pub mod messaging;
pub mod payment;
pub mod repository;
pub mod services;
pub mod shipping;

use thiserror::Error;

use crate::domain::aggregates::CouponRejection;
use crate::domain::value_objects::QuantityError;
use crate::payment::PaymentError;
use crate::repository::StoreError;
use crate::shipping::ShippingError;

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum StorefrontError {
    #[error("cart not identified: send the x-cart-session header or sign in")]
    NotIdentified,

    #[error("product not found")]
    ProductNotFound,

    #[error("order not found")]
    OrderNotFound,

    #[error("postal code not found")]
    PostalCodeNotFound,

    #[error("insufficient stock")]
    InsufficientStock,

    #[error(transparent)]
    Coupon(#[from] CouponRejection),

    #[error("invalid amount")]
    InvalidAmount,

    #[error(transparent)]
    InvalidQuantity(#[from] QuantityError),

    #[error("unauthorized")]
    Unauthorized,

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Payment(#[from] PaymentError),

    #[error(transparent)]
    Shipping(#[from] ShippingError),

    #[error(transparent)]
    Storage(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, StorefrontError>;
