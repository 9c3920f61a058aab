//! Cart Aggregate

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::domain::aggregates::product::Product;
use crate::domain::value_objects::Money;

/// A stored cart row joined with the live product it references.
#[derive(Clone, Debug, PartialEq)]
pub struct CartItem {
    pub id: Uuid,
    pub product: Product,
    pub quantity: u32,
}

impl CartItem {
    /// Stored quantity clamped to what is in stock right now. Storage keeps the original
    /// request so a restock can still serve it.
    pub fn effective_quantity(&self) -> u32 { self.quantity.min(self.product.available()) }

    pub fn line_total(&self) -> Money { self.product.price.multiply(self.effective_quantity()) }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub id: Uuid,
    pub product_id: Uuid,
    pub name: String,
    pub slug: String,
    pub price: Money,
    pub image: String,
    pub stock: i32,
    pub quantity: u32,
}

impl From<&CartItem> for CartLine {
    fn from(item: &CartItem) -> Self {
        Self {
            id: item.id,
            product_id: item.product.id,
            name: item.product.name.clone(),
            slug: item.product.slug.clone(),
            price: item.product.price,
            image: item.product.primary_image(),
            stock: item.product.stock,
            quantity: item.effective_quantity(),
        }
    }
}

/// What a caller sees of a cart at one point in time.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub items: Vec<CartLine>,
    pub subtotal: Money,
    pub is_user: bool,
}

impl Cart {
    pub fn empty() -> Self { Self::default() }

    pub fn from_items(items: &[CartItem], is_user: bool) -> Self {
        let subtotal = items.iter().map(CartItem::line_total).sum();
        Self { items: items.iter().map(CartLine::from).collect(), subtotal, is_user }
    }

    pub fn item_count(&self) -> usize { self.items.len() }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }
}
