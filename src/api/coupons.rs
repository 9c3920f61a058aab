use axum::{extract::State, Json};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use super::extract::ValidatedJson;
use super::{ApiResult, AppState};
use crate::domain::aggregates::CouponType;
use crate::domain::value_objects::Money;

pub(super) fn non_negative(value: &Money) -> Result<(), ValidationError> {
    if value.amount().is_sign_negative() {
        return Err(ValidationError::new("must not be negative"));
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate)]
pub struct ValidateCouponRequest {
    #[validate(length(min = 1))]
    pub code: String,
    #[validate(custom = "non_negative")]
    pub subtotal: Money,
}

#[derive(Debug, Serialize)]
pub struct CouponValidation {
    pub valid: bool,
    pub code: String,
    pub discount: Money,
    #[serde(rename = "type")]
    pub kind: CouponType,
    pub value: Decimal,
}

pub(super) async fn validate_coupon(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<ValidateCouponRequest>,
) -> ApiResult<Json<CouponValidation>> {
    let discount = state.pricing.validate_coupon(&body.code, body.subtotal, Utc::now()).await?;
    Ok(Json(CouponValidation {
        valid: true,
        code: discount.code.to_string(),
        discount: discount.amount.rounded(),
        kind: discount.kind,
        value: discount.value,
    }))
}
