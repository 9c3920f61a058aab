//! Product Aggregate
//!
//! The cart and checkout only ever see a read-only projection of the catalog.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::domain::value_objects::Money;

const PLACEHOLDER_IMAGE_BASE: &str = "https://placehold.co/600x600?text=";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub price: Money,
    pub images: Vec<String>,
    pub stock: i32,
    pub published: bool,
}

impl Product {
    /// Units that can actually be sold; negative stock counts as none.
    pub fn available(&self) -> u32 { u32::try_from(self.stock).unwrap_or(0) }

    pub fn can_fulfil(&self, quantity: u32) -> bool { self.available() >= quantity }

    pub fn is_purchasable(&self) -> bool { self.published }

    /// First gallery image, or a generated placeholder named after the product.
    pub fn primary_image(&self) -> String {
        self.images.first().cloned().unwrap_or_else(|| placeholder_image(&self.name))
    }
}

pub fn placeholder_image(name: &str) -> String {
    let label: String = name
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("+");
    format!("{PLACEHOLDER_IMAGE_BASE}{label}")
}
