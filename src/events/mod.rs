use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Domain events published by the services.
///
/// Consumers subscribe through the channel handed to [`process_events`];
/// nothing in the core depends on a particular rendering layer observing
/// them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Catalog events
    GroceryAdded(Uuid),

    // Cart events
    CartItemAdded {
        cart_item_id: Uuid,
        grocery_id: Uuid,
    },
    CartItemQuantityChanged {
        cart_item_id: Uuid,
        quantity: i32,
    },
    CartItemRemoved(Uuid),

    // Order events
    OrderCreated(Uuid),
    OrderStatusChanged {
        order_id: Uuid,
        old_status: String,
        new_status: String,
    },

    // Shopping list events
    ShoppingListItemAdded(Uuid),
    ShoppingListItemToggled {
        item_id: Uuid,
        is_completed: bool,
    },
    ShoppingListItemRemoved(Uuid),
}

impl Event {
    /// JSON payload for structured log consumers.
    pub fn as_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{:?}", self))
    }
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of failing when no consumer is left.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!("Event dropped: {}", e);
        }
    }
}

/// Creates a connected sender/receiver pair with the given channel capacity.
pub fn channel(capacity: usize) -> (EventSender, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(capacity);
    (EventSender::new(tx), rx)
}

/// Drains incoming events, logging each one. The loop ends when every
/// sender has been dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::OrderCreated(order_id) => {
                info!("Order created: {}", order_id);
            }
            Event::OrderStatusChanged {
                order_id,
                old_status,
                new_status,
            } => {
                info!(
                    "Order {} status changed from '{}' to '{}'",
                    order_id, old_status, new_status
                );
            }
            other => {
                info!("Received event: {}", other.as_json());
            }
        }
    }

    info!("Event processing loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_delivers_to_receiver() {
        let (sender, mut rx) = channel(8);
        let id = Uuid::new_v4();
        sender.send(Event::OrderCreated(id)).await.unwrap();

        match rx.recv().await {
            Some(Event::OrderCreated(got)) => assert_eq!(got, id),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn as_json_carries_the_variant_and_payload() {
        let id = Uuid::new_v4();
        let json = Event::CartItemQuantityChanged {
            cart_item_id: id,
            quantity: 3,
        }
        .as_json();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let payload = &value["CartItemQuantityChanged"];
        assert_eq!(payload["cart_item_id"], serde_json::json!(id));
        assert_eq!(payload["quantity"], 3);
    }

    #[tokio::test]
    async fn send_or_log_survives_closed_channel() {
        let (sender, rx) = channel(1);
        drop(rx);
        // Must not panic.
        sender.send_or_log(Event::ShoppingListItemRemoved(Uuid::new_v4())).await;
    }
}
