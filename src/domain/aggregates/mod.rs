//! Aggregates module
pub mod product;
pub mod cart;
pub mod coupon;
pub mod order;

pub use product::Product;
pub use cart::{Cart, CartItem, CartLine};
pub use coupon::{Coupon, CouponPolicy, CouponRejection, CouponType, Discount};
pub use order::{subtotal_of, CheckoutLine, NewOrder, Order, OrderLine, OrderStatus, OrderTotals, PaymentMethod, ShippingAddress};
