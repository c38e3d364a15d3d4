use crate::{
    config::AppConfig,
    entities::{cart_item, order, order_item, CartItem, Order, OrderItem, OrderModel, OrderStatus},
    errors::ServiceError,
    events::{Event, EventSender},
    services::cart::{compute_grand_total, compute_subtotal},
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

/// Order service: converts the cart into orders and manages the order
/// status lifecycle.
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    config: Arc<AppConfig>,
}

impl OrderService {
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

    /// Converts the current cart into an order.
    ///
    /// One transaction covers the whole conversion: the order row, the item
    /// snapshot, and the cart clear either all land or none do, so there is
    /// no observable state where the order exists and the cart is still
    /// populated.
    ///
    /// The order total is the cart subtotal plus the configured delivery
    /// fee, fixed at creation time. The item snapshot copies name,
    /// quantity, price, and unit from each cart line; later cart or catalog
    /// changes cannot affect it.
    ///
    /// # Errors
    ///
    /// * `ServiceError::ValidationError` - empty delivery address
    /// * `ServiceError::InvalidOperation` - empty cart
    #[instrument(skip(self))]
    pub async fn checkout(&self, input: CheckoutInput) -> Result<OrderWithItems, ServiceError> {
        input.validate()?;
        let delivery_address = input.delivery_address.trim().to_string();
        if delivery_address.is_empty() {
            return Err(ServiceError::ValidationError(
                "Delivery address must not be empty".to_string(),
            ));
        }

        let txn = self.db.begin().await?;

        let cart_items = CartItem::find()
            .order_by_asc(cart_item::Column::AddedDate)
            .all(&txn)
            .await?;
        if cart_items.is_empty() {
            return Err(ServiceError::InvalidOperation(
                "Cannot check out an empty cart".to_string(),
            ));
        }

        let subtotal = compute_subtotal(&cart_items);
        let total_amount = compute_grand_total(subtotal, self.config.delivery_fee);

        let order_id = Uuid::new_v4();
        let now = Utc::now();
        let order = order::ActiveModel {
            id: Set(order_id),
            order_date: Set(now),
            total_amount: Set(total_amount),
            status: Set(OrderStatus::Pending.to_string()),
            delivery_address: Set(delivery_address),
            created_at: Set(now),
            updated_at: Set(None),
        };
        let order = order.insert(&txn).await?;

        let mut items = Vec::with_capacity(cart_items.len());
        for (position, cart_item) in cart_items.iter().enumerate() {
            let item = order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                position: Set(position as i32),
                grocery_name: Set(cart_item.grocery_name.clone()),
                quantity: Set(cart_item.quantity),
                price: Set(cart_item.price),
                unit: Set(cart_item.unit.clone()),
            };
            items.push(item.insert(&txn).await?);
        }

        for cart_item in cart_items {
            cart_item.delete(&txn).await?;
        }

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::OrderCreated(order_id))
            .await;

        info!(
            "Checkout complete: order {} with {} items, total {}",
            order_id,
            items.len(),
            total_amount
        );
        Ok(OrderWithItems { order, items })
    }

    /// Updates an order's status.
    ///
    /// The five defined statuses are all reachable from any current status,
    /// matching the free status selector the app exposes; anything else is
    /// a caller error. Totals and items are untouched.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        order_id: Uuid,
        new_status: &str,
    ) -> Result<OrderModel, ServiceError> {
        let status = OrderStatus::from_str(new_status)
            .map_err(|_| ServiceError::InvalidStatus(new_status.to_string()))?;

        let order = Order::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        let old_status = order.status.clone();
        let mut active: order::ActiveModel = order.into();
        active.status = Set(status.to_string());
        active.updated_at = Set(Some(Utc::now()));
        let updated = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::OrderStatusChanged {
                order_id,
                old_status: old_status.clone(),
                new_status: status.to_string(),
            })
            .await;

        info!(
            "Order {} status updated from '{}' to '{}'",
            order_id, old_status, status
        );
        Ok(updated)
    }

    /// Fetches an order together with its item snapshot.
    pub async fn get_order(&self, order_id: Uuid) -> Result<OrderWithItems, ServiceError> {
        let order = Order::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        let items = OrderItem::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .order_by_asc(order_item::Column::Position)
            .all(&*self.db)
            .await?;

        Ok(OrderWithItems { order, items })
    }

    /// Lists orders, newest first.
    pub async fn list_orders(&self) -> Result<Vec<OrderModel>, ServiceError> {
        Ok(Order::find()
            .order_by_desc(order::Column::OrderDate)
            .all(&*self.db)
            .await?)
    }
}

/// Input for checking out the cart
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CheckoutInput {
    #[validate(length(min = 1, message = "Delivery address must not be empty"))]
    pub delivery_address: String,
}

/// An order with its item snapshot
#[derive(Debug, Clone, Serialize)]
pub struct OrderWithItems {
    pub order: OrderModel,
    pub items: Vec<order_item::Model>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkout_input_rejects_empty_address() {
        let input = CheckoutInput {
            delivery_address: "".to_string(),
        };
        assert!(input.validate().is_err());

        let input = CheckoutInput {
            delivery_address: "1 Main St".to_string(),
        };
        assert!(input.validate().is_ok());
    }

    #[test]
    fn status_parsing_accepts_the_five_statuses() {
        for s in ["Pending", "Processing", "Shipped", "Delivered", "Cancelled"] {
            assert!(OrderStatus::from_str(s).is_ok(), "{} should parse", s);
        }
    }

    #[test]
    fn status_parsing_rejects_unknown_values() {
        for s in ["Refunded", "pending", "Done", ""] {
            assert!(OrderStatus::from_str(s).is_err(), "{} should be rejected", s);
        }
    }

    #[test]
    fn status_round_trips_through_display() {
        let status = OrderStatus::Shipped;
        assert_eq!(OrderStatus::from_str(&status.to_string()).unwrap(), status);
    }
}
