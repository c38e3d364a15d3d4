use std::sync::Arc;

use grocerygo_core::{
    config::AppConfig,
    db,
    entities::GroceryModel,
    events,
    services::CreateGroceryInput,
    AppState,
};
use rust_decimal::Decimal;

/// Helper harness for spinning up application state backed by an in-memory
/// SQLite database.
pub struct TestApp {
    pub state: AppState,
    #[allow(dead_code)]
    event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let config = Arc::new(AppConfig::new("sqlite::memory:".to_string(), "test".to_string()));

        let pool = db::establish_connection_from_app_config(&config)
            .await
            .expect("failed to create test database");
        db::init_schema(&pool).await.expect("failed to create schema");

        let (event_sender, event_rx) = events::channel(64);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let state = AppState::build(Arc::new(pool), config, event_sender);
        Self { state, event_task }
    }

    /// Seeds one catalog item and returns it.
    #[allow(dead_code)]
    pub async fn seed_grocery(&self, name: &str, price: Decimal, unit: &str) -> GroceryModel {
        self.state
            .services
            .catalog
            .create_grocery(CreateGroceryInput {
                name: name.to_string(),
                category: "Test".to_string(),
                price,
                image_ref: None,
                description: None,
                unit: Some(unit.to_string()),
            })
            .await
            .expect("failed to seed grocery")
    }
}
