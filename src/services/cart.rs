//! Cart service.

use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::aggregates::{Cart, Product};
use crate::domain::events::{CartEvent, DomainEvent};
use crate::domain::value_objects::{Owner, Quantity, SessionId, UserId};
use crate::messaging::{emit, EventPublisher};
use crate::repository::{CartStore, ProductCatalog};
use crate::{Result, StorefrontError};

#[derive(Clone)]
pub struct CartService {
    carts: Arc<dyn CartStore>,
    catalog: Arc<dyn ProductCatalog>,
    events: Arc<dyn EventPublisher>,
}

impl CartService {
    pub fn new(carts: Arc<dyn CartStore>, catalog: Arc<dyn ProductCatalog>, events: Arc<dyn EventPublisher>) -> Self {
        Self { carts, catalog, events }
    }

    /// The owner's cart with quantities clamped to current stock. An unidentified caller
    /// gets an empty cart.
    pub async fn load(&self, owner: Option<&Owner>) -> Result<Cart> {
        let Some(owner) = owner else { return Ok(Cart::empty()) };
        let items = self.carts.items(owner).await?;
        Ok(Cart::from_items(&items, owner.is_user()))
    }

    /// Adds `quantity` of a product. An existing line for the same product absorbs the
    /// quantity, silently capped at stock.
    pub async fn add(&self, owner: Option<&Owner>, product_id: Uuid, quantity: u32) -> Result<Cart> {
        let owner = owner.ok_or(StorefrontError::NotIdentified)?;
        let quantity = Quantity::requested(quantity)?;

        let product = self.catalog.product(product_id).await?
            .filter(Product::is_purchasable)
            .ok_or(StorefrontError::ProductNotFound)?;
        if !product.can_fulfil(quantity.value()) {
            return Err(StorefrontError::InsufficientStock);
        }

        self.carts.add_or_merge(owner, product.id, quantity.value(), product.available()).await?;
        debug!(%owner, %product_id, quantity = quantity.value(), "cart line added");
        self.load(Some(owner)).await
    }

    /// Replaces a line's quantity as given; zero removes the line. Lines the owner does
    /// not hold are left alone.
    pub async fn update(&self, owner: Option<&Owner>, item_id: Uuid, quantity: u32) -> Result<Cart> {
        let owner = owner.ok_or(StorefrontError::NotIdentified)?;
        let quantity = Quantity::adjusted(quantity)?;

        let touched = if quantity.is_zero() {
            self.carts.remove(owner, item_id).await?
        } else {
            self.carts.set_quantity(owner, item_id, quantity.value()).await?
        };
        debug!(%owner, %item_id, quantity = quantity.value(), touched, "cart line updated");
        self.load(Some(owner)).await
    }

    pub async fn remove(&self, owner: Option<&Owner>, item_id: Uuid) -> Result<Cart> {
        let owner = owner.ok_or(StorefrontError::NotIdentified)?;
        let touched = self.carts.remove(owner, item_id).await?;
        debug!(%owner, %item_id, touched, "cart line removed");
        self.load(Some(owner)).await
    }

    /// Moves every line of the anonymous cart into the user's cart. Each line is claimed
    /// from the session and folded in one storage transaction, so a repeated or
    /// interrupted sync never counts a line twice.
    pub async fn sync(&self, session: Option<&SessionId>, user: UserId) -> Result<Cart> {
        let user_owner = Owner::User(user);
        let Some(session) = session else { return self.load(Some(&user_owner)).await };

        let items = self.carts.items(&Owner::Session(session.clone())).await?;
        for item in &items {
            self.carts.move_to_user(session, item, user).await?;
        }

        if !items.is_empty() {
            info!(%user, lines = items.len(), "session cart merged");
            let merged = DomainEvent::Cart(CartEvent::Merged {
                user_id: user.as_uuid(),
                session_id: session.to_string(),
                items: items.len(),
            });
            emit(self.events.as_ref(), [merged]).await;
        }
        self.load(Some(&user_owner)).await
    }
}
