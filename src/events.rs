use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::info;
use uuid::Uuid;

/// Events emitted by the storefront core. Consumed in-process by a logging
/// task; external delivery (email, analytics) would hang off the same
/// channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    OrderCreated(Uuid),
    OrderStatusChanged {
        order_id: Uuid,
        old_status: String,
        new_status: String,
    },
    CheckoutCompleted {
        order_id: Uuid,
        payment_intent_id: String,
    },
    PaymentSucceeded(Uuid),
    PaymentFailed(Uuid),
    AssetUploaded(Uuid),
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
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
}

/// Drains the event channel, logging each event. Spawned once at startup.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        match &event {
            Event::OrderCreated(order_id) => {
                info!(order_id = %order_id, "order created");
            }
            Event::OrderStatusChanged {
                order_id,
                old_status,
                new_status,
            } => {
                info!(order_id = %order_id, %old_status, %new_status, "order status changed");
            }
            Event::CheckoutCompleted {
                order_id,
                payment_intent_id,
            } => {
                info!(order_id = %order_id, %payment_intent_id, "checkout completed");
            }
            Event::PaymentSucceeded(order_id) => {
                info!(order_id = %order_id, "payment succeeded");
            }
            Event::PaymentFailed(order_id) => {
                info!(order_id = %order_id, "payment failed");
            }
            Event::AssetUploaded(asset_id) => {
                info!(asset_id = %asset_id, "asset uploaded");
            }
        }
    }
}
