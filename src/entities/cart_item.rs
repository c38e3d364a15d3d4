use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A line in the shopping cart.
///
/// Name, price, and unit are copied from the grocery at add time so a later
/// catalog edit does not silently reprice the cart. At most one line per
/// grocery may exist; the cart service enforces this, not the store.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "cart_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub grocery_id: Uuid,
    pub grocery_name: String,
    pub price: Decimal,
    pub quantity: i32,
    pub unit: String,
    pub added_date: DateTime<Utc>,
}

impl Model {
    /// Line total, derived rather than stored.
    pub fn total_price(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::grocery::Entity",
        from = "Column::GroceryId",
        to = "super::grocery::Column::Id"
    )]
    Grocery,
}

impl Related<super::grocery::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Grocery.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
