//! HTTP surface.

mod cart;
mod coupons;
mod extract;
mod orders;
mod shipping;

use std::sync::Arc;

use axum::{
    http::{header, HeaderName, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::Authenticator;
use crate::payment::PaymentError;
use crate::services::{CartService, CheckoutService, PricingEngine};
use crate::shipping::ShippingQuoter;
use crate::StorefrontError;

pub use extract::{CART_SESSION_COOKIE, CART_SESSION_HEADER};

#[derive(Clone)]
pub struct AppState {
    pub carts: CartService,
    pub pricing: PricingEngine,
    pub checkout: CheckoutService,
    pub shipping: ShippingQuoter,
    pub auth: Arc<dyn Authenticator>,
}

/// Error response: `{"error": "<message>"}`.
#[derive(Debug)]
pub struct ApiError(pub StorefrontError);

impl<E> From<E> for ApiError
where
    E: Into<StorefrontError>,
{
    fn from(err: E) -> Self { Self(err.into()) }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        use StorefrontError as E;

        let (status, message) = match &self.0 {
            E::ProductNotFound | E::OrderNotFound | E::PostalCodeNotFound => (StatusCode::NOT_FOUND, self.0.to_string()),
            E::Unauthorized => (StatusCode::UNAUTHORIZED, self.0.to_string()),
            E::NotIdentified
            | E::InsufficientStock
            | E::Coupon(_)
            | E::InvalidAmount
            | E::InvalidQuantity(_)
            | E::Validation(_)
            | E::Payment(PaymentError::UnchargeableAmount(_)) => (StatusCode::BAD_REQUEST, self.0.to_string()),
            E::Payment(PaymentError::NotConfigured) => {
                tracing::error!(error = %self.0, "payment gateway not configured");
                (StatusCode::SERVICE_UNAVAILABLE, "payment unavailable".to_string())
            }
            E::Payment(err) => {
                tracing::error!(error = %err, "payment gateway call failed");
                (StatusCode::BAD_GATEWAY, "payment gateway error".to_string())
            }
            E::Shipping(err) => {
                tracing::error!(error = %err, "address lookup failed");
                (StatusCode::BAD_GATEWAY, "address lookup unavailable".to_string())
            }
            E::Storage(err) => {
                tracing::error!(error = %err, "storage failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_string())
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, HeaderName::from_static(CART_SESSION_HEADER)])
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(json!({"status": "healthy", "service": "storefront"})) }))
        .route("/api/cart", get(cart::get_cart))
        .route("/api/cart/add", post(cart::add_to_cart))
        .route("/api/cart/sync", post(cart::sync_cart))
        .route("/api/cart/:item_id", patch(cart::update_cart_item).delete(cart::remove_cart_item))
        .route("/api/coupons/validate", post(coupons::validate_coupon))
        .route("/api/orders", get(orders::list_orders).post(orders::create_order))
        .route("/api/orders/create-payment-intent", post(orders::create_payment_intent))
        .route("/api/orders/:id", get(orders::get_order))
        .route("/api/orders/:id/payment", patch(orders::confirm_payment))
        .route("/api/shipping/calculate", post(shipping::calculate))
        .route("/api/shipping/cep/:zip", get(shipping::lookup_cep))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors())
        .with_state(state)
}
