use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;
use validator::Validate;

use super::coupons::non_negative;
use super::extract::{RequireUser, ValidatedJson};
use super::{ApiResult, AppState};
use crate::domain::aggregates::{CheckoutLine, Order, PaymentMethod, ShippingAddress};
use crate::domain::value_objects::Money;
use crate::services::{CheckoutRequest, PaymentQuote};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutLineBody {
    pub product_id: Uuid,
    #[validate(range(min = 1, max = 99))]
    pub quantity: u32,
    #[validate(custom = "non_negative")]
    pub price: Money,
    pub name: String,
    pub image: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutBody {
    #[validate]
    pub items: Vec<CheckoutLineBody>,
    #[validate(length(min = 1))]
    pub shipping_street: String,
    #[validate(length(min = 1))]
    pub shipping_city: String,
    #[validate(length(min = 1))]
    pub shipping_state: String,
    #[validate(length(min = 1))]
    pub shipping_zip: String,
    pub shipping_cpf: Option<String>,
    pub shipping_phone: Option<String>,
    pub payment_method: PaymentMethod,
    pub coupon_code: Option<String>,
    #[serde(default)]
    #[validate(custom = "non_negative")]
    pub shipping_cost: Money,
}

impl From<CheckoutBody> for CheckoutRequest {
    fn from(body: CheckoutBody) -> Self {
        Self {
            items: body
                .items
                .into_iter()
                .map(|line| CheckoutLine {
                    product_id: line.product_id,
                    name: line.name,
                    price: line.price,
                    quantity: line.quantity,
                    image: line.image,
                })
                .collect(),
            shipping: ShippingAddress {
                street: body.shipping_street,
                city: body.shipping_city,
                state: body.shipping_state,
                zip: body.shipping_zip,
                cpf: body.shipping_cpf,
                phone: body.shipping_phone,
            },
            shipping_cost: body.shipping_cost,
            payment_method: body.payment_method,
            coupon_code: body.coupon_code,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmPaymentBody {
    #[validate(length(min = 1))]
    pub payment_id: String,
}

/// Orders go out with amounts rounded to cents.
fn present(mut order: Order) -> Order {
    order.totals = order.totals.rounded();
    order
}

pub(super) async fn create_payment_intent(
    State(state): State<AppState>,
    RequireUser(_user): RequireUser,
    ValidatedJson(body): ValidatedJson<CheckoutBody>,
) -> ApiResult<Json<PaymentQuote>> {
    let request = CheckoutRequest::from(body);
    Ok(Json(state.checkout.quote(&request, Utc::now()).await?))
}

pub(super) async fn create_order(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ValidatedJson(body): ValidatedJson<CheckoutBody>,
) -> ApiResult<(StatusCode, Json<Order>)> {
    let order = state.checkout.commit(user, body.into(), Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(present(order))))
}

pub(super) async fn list_orders(State(state): State<AppState>, RequireUser(user): RequireUser) -> ApiResult<Json<Vec<Order>>> {
    let orders = state.checkout.list_orders(user).await?;
    Ok(Json(orders.into_iter().map(present).collect()))
}

pub(super) async fn get_order(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Order>> {
    Ok(Json(present(state.checkout.get_order(user, id).await?)))
}

pub(super) async fn confirm_payment(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<Uuid>,
    ValidatedJson(body): ValidatedJson<ConfirmPaymentBody>,
) -> ApiResult<Json<Value>> {
    state.checkout.confirm_payment(user, id, &body.payment_id).await?;
    Ok(Json(json!({ "message": "payment confirmed" })))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::{json, Value};

    use crate::api::tests::{bearer, request, TestApp};
    use crate::domain::aggregates::coupon::tests::coupon;
    use crate::domain::aggregates::CouponType;
    use crate::domain::value_objects::{CouponCode, Money};
    use crate::payment::{MockPaymentGateway, PaymentIntent};
    use crate::shipping::MockAddressLookup;

    fn checkout_body(coupon: Option<&str>) -> Value {
        json!({
            "items": [{"productId": uuid::Uuid::new_v4(), "quantity": 3, "price": 50, "name": "Jaqueta"}],
            "shippingStreet": "Av. Paulista, 1000",
            "shippingCity": "São Paulo",
            "shippingState": "SP",
            "shippingZip": "01310-100",
            "shippingCpf": "123.456.789-09",
            "paymentMethod": "PIX",
            "couponCode": coupon,
            "shippingCost": 15.90,
        })
    }

    async fn with_first_purchase_coupon(app: &TestApp) -> uuid::Uuid {
        let mut first = coupon(CouponType::Percentage, 10);
        first.code = CouponCode::new("PRIMEIRACOMPRA").unwrap();
        first.min_purchase = Some(Money::from_cents(10000));
        let id = first.id;
        app.store.insert_coupon(first).await;
        id
    }

    #[tokio::test]
    async fn payment_intent_quotes_discounted_total_in_cents() {
        let mut gateway = MockPaymentGateway::new();
        gateway
            .expect_create_intent()
            .withf(|amount| amount.to_minor_units() == Some(15090))
            .times(1)
            .returning(|_| Ok(PaymentIntent { id: "pi_9".into(), client_secret: "pi_9_secret".into(), amount: 15090 }));
        let app = TestApp::new(gateway, MockAddressLookup::new());
        let coupon_id = with_first_purchase_coupon(&app).await;

        let (status, body) = app
            .send(request(Method::POST, "/api/orders/create-payment-intent", &[bearer()], Some(checkout_body(Some("PRIMEIRACOMPRA")))))
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"clientSecret": "pi_9_secret", "amount": 15090}));
        assert_eq!(app.store.coupon(coupon_id).await.unwrap().used_count, 0);
    }

    #[tokio::test]
    async fn order_creation_requires_sign_in() {
        let app = TestApp::plain();
        let (status, body) = app.send(request(Method::POST, "/api/orders", &[], Some(checkout_body(None)))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "unauthorized");
    }

    #[tokio::test]
    async fn order_lifecycle() {
        let app = TestApp::plain();
        let coupon_id = with_first_purchase_coupon(&app).await;

        let (status, order) = app
            .send(request(Method::POST, "/api/orders", &[bearer()], Some(checkout_body(Some("primeiracompra")))))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(order["total"], "150.90");
        assert_eq!(order["discount"], "15.00");
        assert_eq!(order["couponCode"], "PRIMEIRACOMPRA");
        assert_eq!(order["status"], "PENDING");
        assert_eq!(order["shipping"]["cpf"], "12345678909");
        assert_eq!(app.store.coupon(coupon_id).await.unwrap().used_count, 1);

        let id = order["id"].as_str().unwrap().to_string();
        let (status, list) = app.send(request(Method::GET, "/api/orders", &[bearer()], None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list.as_array().unwrap().len(), 1);

        let (status, _) = app
            .send(request(Method::PATCH, &format!("/api/orders/{id}/payment"), &[bearer()], Some(json!({"paymentId": "pi_9"}))))
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, fetched) = app.send(request(Method::GET, &format!("/api/orders/{id}"), &[bearer()], None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["status"], "PAID");
        assert_eq!(fetched["paymentId"], "pi_9");

        let missing = uuid::Uuid::new_v4();
        let (status, _) = app.send(request(Method::GET, &format!("/api/orders/{missing}"), &[bearer()], None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn out_of_range_lines_are_rejected() {
        let app = TestApp::plain();
        for (field, value) in [("quantity", json!(3_000_000_000u64)), ("quantity", json!(100)), ("price", json!("-5.00"))] {
            let mut body = checkout_body(None);
            body["items"][0][field] = value;
            let (status, _) = app.send(request(Method::POST, "/api/orders", &[bearer()], Some(body))).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{field}");
        }
        assert_eq!(app.store.order_count().await, 0);
    }

    #[tokio::test]
    async fn empty_shipping_street_is_rejected() {
        let app = TestApp::plain();
        let mut body = checkout_body(None);
        body["shippingStreet"] = json!("");
        let (status, _) = app.send(request(Method::POST, "/api/orders", &[bearer()], Some(body))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(app.store.order_count().await, 0);
    }
}
