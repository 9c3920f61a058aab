use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use validator::Validate;

use super::extract::ValidatedJson;
use super::{ApiResult, AppState};
use crate::shipping::ShippingQuote;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CalculateShippingRequest {
    #[validate(length(min = 8, max = 9))]
    pub zip_code: String,
}

pub(super) async fn calculate(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<CalculateShippingRequest>,
) -> ApiResult<Json<ShippingQuote>> {
    Ok(Json(state.shipping.quote(&body.zip_code).await?))
}

pub(super) async fn lookup_cep(State(state): State<AppState>, Path(zip): Path<String>) -> ApiResult<Json<Value>> {
    Ok(Json(state.shipping.address(&zip).await?))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::api::tests::{request, TestApp};
    use crate::payment::MockPaymentGateway;
    use crate::shipping::MockAddressLookup;

    fn lookup() -> MockAddressLookup {
        let mut lookup = MockAddressLookup::new();
        lookup
            .expect_lookup()
            .returning(|zip| Ok((zip.as_str() == "01310100").then(|| json!({"cep": "01310-100", "localidade": "São Paulo"}))));
        lookup
    }

    #[tokio::test]
    async fn calculate_returns_fixed_options() {
        let app = TestApp::new(MockPaymentGateway::new(), lookup());
        let (status, body) = app
            .send(request(Method::POST, "/api/shipping/calculate", &[], Some(json!({"zipCode": "01310-100"}))))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["zipCode"], "01310100");
        assert_eq!(body["options"][0]["name"], "Entrega padrão");
        assert_eq!(body["options"][0]["price"], "15.90");
        assert_eq!(body["options"][1]["price"], "29.90");
    }

    #[tokio::test]
    async fn unknown_cep_is_not_found() {
        let app = TestApp::new(MockPaymentGateway::new(), lookup());
        let (status, body) = app.send(request(Method::GET, "/api/shipping/cep/99999-999", &[], None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "postal code not found");

        let (status, body) = app.send(request(Method::GET, "/api/shipping/cep/01310100", &[], None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["localidade"], "São Paulo");
    }
}
