//! Application services
//!
//! Each service owns one slice of the storefront's behaviour and reaches storage,
//! payment and messaging only through trait objects.

pub mod cart;
pub mod checkout;
pub mod pricing;

pub use cart::CartService;
pub use checkout::{CheckoutRequest, CheckoutService, PaymentQuote};
pub use pricing::{PricedOrder, PricingEngine};
