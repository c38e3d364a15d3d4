use crate::{
    entities::{grocery, Grocery, GroceryModel},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

/// Catalog service for managing the grocery product catalog.
#[derive(Clone)]
pub struct CatalogService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl CatalogService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Creates a new catalog item.
    ///
    /// # Errors
    ///
    /// * `ServiceError::ValidationError` - empty name or negative price
    #[instrument(skip(self))]
    pub async fn create_grocery(
        &self,
        input: CreateGroceryInput,
    ) -> Result<GroceryModel, ServiceError> {
        input.validate()?;
        if input.price < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Grocery price must not be negative".to_string(),
            ));
        }

        let grocery_id = Uuid::new_v4();
        let grocery = grocery::ActiveModel {
            id: Set(grocery_id),
            name: Set(input.name.clone()),
            category: Set(input.category.clone()),
            price: Set(input.price),
            image_ref: Set(input.image_ref.clone().unwrap_or_else(|| "cart".to_string())),
            description: Set(input.description.clone().unwrap_or_default()),
            unit: Set(input.unit.clone().unwrap_or_else(|| "each".to_string())),
            created_at: Set(Utc::now()),
        };

        let grocery = grocery.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::GroceryAdded(grocery_id))
            .await;

        info!("Created grocery: {} ({})", grocery.name, grocery_id);
        Ok(grocery)
    }

    /// Fetches a single catalog item by id.
    pub async fn get_grocery(&self, grocery_id: Uuid) -> Result<GroceryModel, ServiceError> {
        Grocery::find_by_id(grocery_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Grocery {} not found", grocery_id)))
    }

    /// Lists catalog items, optionally filtered by category and a
    /// case-insensitive name search, sorted by name.
    #[instrument(skip(self))]
    pub async fn list_groceries(
        &self,
        filter: GroceryFilter,
    ) -> Result<Vec<GroceryModel>, ServiceError> {
        let mut query = Grocery::find();

        if let Some(category) = filter.category {
            query = query.filter(grocery::Column::Category.eq(category));
        }
        if let Some(search) = filter.search {
            if !search.is_empty() {
                query = query.filter(grocery::Column::Name.contains(search.as_str()));
            }
        }

        Ok(query.order_by_asc(grocery::Column::Name).all(&*self.db).await?)
    }

    /// Seeds the sample catalog when the catalog is empty; no-op otherwise.
    #[instrument(skip(self))]
    pub async fn seed_sample_catalog(&self) -> Result<usize, ServiceError> {
        let existing = Grocery::find().count(&*self.db).await?;
        if existing > 0 {
            return Ok(0);
        }

        let samples = sample_groceries();
        let count = samples.len();
        for input in samples {
            self.create_grocery(input).await?;
        }

        info!("Seeded {} sample groceries", count);
        Ok(count)
    }
}

/// Input for creating a catalog item
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateGroceryInput {
    #[validate(length(min = 1, message = "Grocery name must not be empty"))]
    pub name: String,
    #[validate(length(min = 1, message = "Grocery category must not be empty"))]
    pub category: String,
    pub price: Decimal,
    pub image_ref: Option<String>,
    pub description: Option<String>,
    pub unit: Option<String>,
}

/// Filter for catalog listings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GroceryFilter {
    pub category: Option<String>,
    pub search: Option<String>,
}

fn sample_groceries() -> Vec<CreateGroceryInput> {
    let sample = |name: &str, category: &str, price: Decimal, image: &str, desc: &str, unit: &str| {
        CreateGroceryInput {
            name: name.to_string(),
            category: category.to_string(),
            price,
            image_ref: Some(image.to_string()),
            description: Some(desc.to_string()),
            unit: Some(unit.to_string()),
        }
    };

    vec![
        sample("Red Apples", "Fruits", dec!(3.99), "apple.logo", "Fresh, crisp red apples", "lb"),
        sample("Bananas", "Fruits", dec!(2.49), "leaf", "Ripe yellow bananas", "bunch"),
        sample("Strawberries", "Fruits", dec!(4.99), "strawberry", "Sweet fresh strawberries", "pint"),
        sample("Carrots", "Vegetables", dec!(1.99), "carrot", "Fresh organic carrots", "lb"),
        sample("Broccoli", "Vegetables", dec!(2.99), "leaf.circle", "Fresh green broccoli", "head"),
        sample("Tomatoes", "Vegetables", dec!(3.49), "circle.fill", "Vine-ripened tomatoes", "lb"),
        sample("Milk", "Dairy", dec!(4.29), "drop", "Fresh whole milk", "gallon"),
        sample("Cheese", "Dairy", dec!(5.99), "square.stack.3d.up", "Cheddar cheese block", "lb"),
        sample("Yogurt", "Dairy", dec!(1.99), "cup.and.saucer", "Greek yogurt", "6oz"),
        sample("White Bread", "Bakery", dec!(2.99), "square.stack", "Fresh white bread", "loaf"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_input_rejects_empty_name() {
        let input = CreateGroceryInput {
            name: "".to_string(),
            category: "Fruits".to_string(),
            price: dec!(1.99),
            image_ref: None,
            description: None,
            unit: None,
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn sample_catalog_prices_are_non_negative() {
        for input in sample_groceries() {
            assert!(input.price >= Decimal::ZERO, "{} priced below zero", input.name);
        }
    }
}
