use crate::{
    config::AppConfig,
    entities::{cart_item, CartItem, CartItemModel, Grocery},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Shopping cart service.
///
/// The cart holds at most one line per grocery; quantities are adjusted in
/// place and never drop below one. All mutation runs on the single logical
/// actor that owns UI state, so no locking is needed beyond the store's own
/// row updates.
#[derive(Clone)]
pub struct CartService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    config: Arc<AppConfig>,
}

impl CartService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            db,
            event_sender,
            config,
        }
    }

    /// Adds a grocery to the cart.
    ///
    /// Copies name, price, and unit from the grocery into the new line. A
    /// grocery already in the cart is rejected rather than merged; the UI
    /// disables the add action in that case, and the service enforces the
    /// same rule for callers that do not.
    ///
    /// # Errors
    ///
    /// * `ServiceError::ValidationError` - quantity below 1
    /// * `ServiceError::NotFound` - unknown grocery
    /// * `ServiceError::InvalidOperation` - grocery already in the cart
    #[instrument(skip(self))]
    pub async fn add_item(&self, input: AddToCartInput) -> Result<CartItemModel, ServiceError> {
        if input.quantity < 1 {
            return Err(ServiceError::ValidationError(
                "Quantity must be at least 1".to_string(),
            ));
        }

        // One transaction keeps the one-line-per-grocery rule atomic with
        // the insert.
        let txn = self.db.begin().await?;

        let grocery = Grocery::find_by_id(input.grocery_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Grocery {} not found", input.grocery_id))
            })?;

        let existing = CartItem::find()
            .filter(cart_item::Column::GroceryId.eq(input.grocery_id))
            .one(&txn)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::InvalidOperation(format!(
                "Grocery '{}' is already in the cart",
                grocery.name
            )));
        }

        let item_id = Uuid::new_v4();
        let item = cart_item::ActiveModel {
            id: Set(item_id),
            grocery_id: Set(grocery.id),
            grocery_name: Set(grocery.name.clone()),
            price: Set(grocery.price),
            quantity: Set(input.quantity),
            unit: Set(grocery.unit.clone()),
            added_date: Set(Utc::now()),
        };

        let item = item.insert(&txn).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::CartItemAdded {
                cart_item_id: item_id,
                grocery_id: grocery.id,
            })
            .await;

        info!("Added to cart: {} x{}", item.grocery_name, item.quantity);
        Ok(item)
    }

    /// Adjusts a cart line's quantity by `delta`, clamping at a floor of 1.
    ///
    /// Decrementing a quantity of 1 is a no-op; there is no ceiling. The
    /// update is an explicit store write so a persistence failure surfaces
    /// as an error instead of vanishing.
    #[instrument(skip(self))]
    pub async fn adjust_quantity(
        &self,
        item_id: Uuid,
        delta: i32,
    ) -> Result<CartItemModel, ServiceError> {
        let item = CartItem::find_by_id(item_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Cart item {} not found", item_id)))?;

        let new_quantity = item.quantity.saturating_add(delta).max(1);
        if new_quantity == item.quantity {
            return Ok(item);
        }

        let mut active: cart_item::ActiveModel = item.into();
        active.quantity = Set(new_quantity);
        let updated = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::CartItemQuantityChanged {
                cart_item_id: item_id,
                quantity: new_quantity,
            })
            .await;

        Ok(updated)
    }

    /// Removes a line from the cart.
    #[instrument(skip(self))]
    pub async fn remove_item(&self, item_id: Uuid) -> Result<(), ServiceError> {
        let item = CartItem::find_by_id(item_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Cart item {} not found", item_id)))?;

        item.delete(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::CartItemRemoved(item_id))
            .await;

        info!("Removed cart item: {}", item_id);
        Ok(())
    }

    /// Lists cart lines in the order they were added.
    pub async fn list_items(&self) -> Result<Vec<CartItemModel>, ServiceError> {
        Ok(CartItem::find()
            .order_by_asc(cart_item::Column::AddedDate)
            .all(&*self.db)
            .await
            .map_err(ServiceError::from)?)
    }

    /// Current cart subtotal.
    pub async fn subtotal(&self) -> Result<Decimal, ServiceError> {
        let items = self.list_items().await?;
        Ok(compute_subtotal(&items))
    }

    /// Current cart total including the delivery fee.
    pub async fn grand_total(&self) -> Result<Decimal, ServiceError> {
        let subtotal = self.subtotal().await?;
        Ok(compute_grand_total(subtotal, self.config.delivery_fee))
    }
}

/// Sum of price x quantity across all cart lines. Pure.
pub fn compute_subtotal(items: &[CartItemModel]) -> Decimal {
    items.iter().map(|item| item.total_price()).sum()
}

/// Subtotal plus the flat delivery fee. Pure.
pub fn compute_grand_total(subtotal: Decimal, delivery_fee: Decimal) -> Decimal {
    subtotal + delivery_fee
}

/// Input for adding a grocery to the cart
#[derive(Debug, Clone, Deserialize)]
pub struct AddToCartInput {
    pub grocery_id: Uuid,
    pub quantity: i32,
}
