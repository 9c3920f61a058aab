use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::extract::{CartSession, MaybeUser, RequireUser, ValidatedJson};
use super::{ApiResult, AppState};
use crate::domain::aggregates::Cart;
use crate::domain::value_objects::Owner;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub product_id: Uuid,
    #[validate(range(min = 1, max = 99))]
    pub quantity: u32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCartItemRequest {
    #[validate(range(max = 99))]
    pub quantity: u32,
}

pub(super) async fn get_cart(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    CartSession(session): CartSession,
) -> ApiResult<Json<Cart>> {
    let owner = Owner::resolve(user, session);
    Ok(Json(state.carts.load(owner.as_ref()).await?))
}

pub(super) async fn add_to_cart(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    CartSession(session): CartSession,
    ValidatedJson(body): ValidatedJson<AddToCartRequest>,
) -> ApiResult<Json<Cart>> {
    let owner = Owner::resolve(user, session);
    Ok(Json(state.carts.add(owner.as_ref(), body.product_id, body.quantity).await?))
}

pub(super) async fn update_cart_item(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    CartSession(session): CartSession,
    Path(item_id): Path<Uuid>,
    ValidatedJson(body): ValidatedJson<UpdateCartItemRequest>,
) -> ApiResult<Json<Cart>> {
    let owner = Owner::resolve(user, session);
    Ok(Json(state.carts.update(owner.as_ref(), item_id, body.quantity).await?))
}

pub(super) async fn remove_cart_item(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    CartSession(session): CartSession,
    Path(item_id): Path<Uuid>,
) -> ApiResult<Json<Cart>> {
    let owner = Owner::resolve(user, session);
    Ok(Json(state.carts.remove(owner.as_ref(), item_id).await?))
}

pub(super) async fn sync_cart(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    CartSession(session): CartSession,
) -> ApiResult<Json<Cart>> {
    Ok(Json(state.carts.sync(session.as_ref(), user).await?))
}
