//! GroceryGo core library
//!
//! Domain services for a grocery-shopping application: product catalog,
//! cart, orders, personal shopping list, and a nearby-store locator. The
//! interactive UI and the platform map-search provider are collaborators,
//! not part of this crate.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod logging;
pub mod services;

use sea_orm::DatabaseConnection;
use std::sync::Arc;

use services::{
    CartService, CatalogService, OrderService, ShoppingListService, StoreLocator,
    StoreSearchProvider,
};

/// The built domain services.
#[derive(Clone)]
pub struct AppServices {
    pub catalog: Arc<CatalogService>,
    pub cart: Arc<CartService>,
    pub orders: Arc<OrderService>,
    pub shopping_list: Arc<ShoppingListService>,
}

/// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: Arc<config::AppConfig>,
    pub event_sender: events::EventSender,
    pub services: AppServices,
}

impl AppState {
    /// Wires the services over a shared database connection, configuration,
    /// and event channel.
    pub fn build(
        db: Arc<DatabaseConnection>,
        config: Arc<config::AppConfig>,
        event_sender: events::EventSender,
    ) -> Self {
        let sender = Arc::new(event_sender.clone());
        let services = AppServices {
            catalog: Arc::new(CatalogService::new(db.clone(), sender.clone())),
            cart: Arc::new(CartService::new(db.clone(), sender.clone(), config.clone())),
            orders: Arc::new(OrderService::new(db.clone(), sender.clone(), config.clone())),
            shopping_list: Arc::new(ShoppingListService::new(db.clone(), sender)),
        };
        Self {
            db,
            config,
            event_sender,
            services,
        }
    }

    /// Builds a store locator over the given platform search provider.
    ///
    /// Kept outside [`AppServices`] because the provider is a platform
    /// collaborator injected by the embedding application, not something
    /// this crate can construct.
    pub fn store_locator(&self, provider: Arc<dyn StoreSearchProvider>) -> StoreLocator {
        StoreLocator::new(provider, self.config.clone())
    }
}
