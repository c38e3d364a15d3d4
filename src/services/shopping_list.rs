use crate::{
    entities::{shopping_list_item, ShoppingListItem, ShoppingListItemModel},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

/// Personal shopping list: a free-text wishlist, unrelated to the catalog
/// or the cart.
#[derive(Clone)]
pub struct ShoppingListService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl ShoppingListService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Adds an entry to the list.
    #[instrument(skip(self))]
    pub async fn add_item(
        &self,
        input: AddListItemInput,
    ) -> Result<ShoppingListItemModel, ServiceError> {
        input.validate()?;

        let item_id = Uuid::new_v4();
        let item = shopping_list_item::ActiveModel {
            id: Set(item_id),
            name: Set(input.name.clone()),
            category: Set(input.category.clone()),
            is_completed: Set(false),
            date_added: Set(Utc::now()),
        };

        let item = item.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::ShoppingListItemAdded(item_id))
            .await;

        Ok(item)
    }

    /// Flips an entry's completed flag.
    #[instrument(skip(self))]
    pub async fn toggle_completed(
        &self,
        item_id: Uuid,
    ) -> Result<ShoppingListItemModel, ServiceError> {
        let item = ShoppingListItem::find_by_id(item_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Shopping list item {} not found", item_id))
            })?;

        let toggled = !item.is_completed;
        let mut active: shopping_list_item::ActiveModel = item.into();
        active.is_completed = Set(toggled);
        let updated = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::ShoppingListItemToggled {
                item_id,
                is_completed: toggled,
            })
            .await;

        Ok(updated)
    }

    /// Removes an entry.
    #[instrument(skip(self))]
    pub async fn remove_item(&self, item_id: Uuid) -> Result<(), ServiceError> {
        let item = ShoppingListItem::find_by_id(item_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Shopping list item {} not found", item_id))
            })?;

        item.delete(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::ShoppingListItemRemoved(item_id))
            .await;

        Ok(())
    }

    /// Lists entries, newest first.
    pub async fn list_items(&self) -> Result<Vec<ShoppingListItemModel>, ServiceError> {
        Ok(ShoppingListItem::find()
            .order_by_desc(shopping_list_item::Column::DateAdded)
            .all(&*self.db)
            .await?)
    }

    /// Deletes every completed entry; returns how many were removed.
    #[instrument(skip(self))]
    pub async fn clear_completed(&self) -> Result<u64, ServiceError> {
        let result = ShoppingListItem::delete_many()
            .filter(shopping_list_item::Column::IsCompleted.eq(true))
            .exec(&*self.db)
            .await?;

        if result.rows_affected > 0 {
            info!("Cleared {} completed shopping list items", result.rows_affected);
        }
        Ok(result.rows_affected)
    }
}

/// Input for adding a shopping list entry
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AddListItemInput {
    #[validate(length(min = 1, message = "Item name must not be empty"))]
    pub name: String,
    pub category: Option<String>,
}
