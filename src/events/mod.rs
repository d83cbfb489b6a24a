use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

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

    /// Sends an event, logging instead of failing when the consumer is gone.
    /// Called after commit, so the write itself has already succeeded.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!(error = %e, "Dropping domain event");
        }
    }
}

// Things that happened to rooms, guests, products and sales.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Room events
    RoomCreated(Uuid),
    RoomUpdated(Uuid),
    RoomDeleted(Uuid),

    // Guest events
    GuestCheckedIn {
        guest_id: Uuid,
        room_id: Option<Uuid>,
    },
    GuestCheckedOut {
        guest_id: Uuid,
        room_id: Uuid,
        checked_out_at: DateTime<Utc>,
    },
    GuestUpdated(Uuid),
    GuestDeleted {
        guest_id: Uuid,
        released_room: Option<Uuid>,
    },

    // Inventory events
    CategoryCreated(Uuid),
    CategoryUpdated(Uuid),
    CategoryDeleted {
        category_id: Uuid,
        products_removed: u64,
    },
    ProductCreated(Uuid),
    ProductUpdated(Uuid),
    ProductDeleted(Uuid),
    StockRestocked {
        product_id: Uuid,
        quantity: i32,
        new_quantity: i32,
    },

    // Sale events
    SaleRecorded {
        sale_id: Uuid,
        product_id: Uuid,
        quantity: i32,
        total: Decimal,
        remaining_stock: i32,
    },
    SaleUpdated(Uuid),
}

pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match event {
            Event::GuestCheckedIn { guest_id, room_id } => {
                info!(%guest_id, room_id = ?room_id, "Guest checked in");
            }
            Event::GuestCheckedOut {
                guest_id,
                room_id,
                checked_out_at,
            } => {
                info!(%guest_id, %room_id, %checked_out_at, "Guest checked out; room released");
            }
            Event::SaleRecorded {
                sale_id,
                product_id,
                quantity,
                total,
                remaining_stock,
            } => {
                info!(%sale_id, %product_id, quantity, %total, "Sale recorded");
                if remaining_stock == 0 {
                    warn!(%product_id, "Product is now out of stock");
                }
            }
            Event::StockRestocked {
                product_id,
                quantity,
                new_quantity,
            } => {
                info!(%product_id, quantity, new_quantity, "Product restocked");
            }
            Event::CategoryDeleted {
                category_id,
                products_removed,
            } => {
                info!(%category_id, products_removed, "Category deleted");
            }
            other => {
                debug!("Received event: {:?}", other);
            }
        }
    }

    warn!("Event processing loop has ended");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_delivers_to_receiver() {
        let (tx, mut rx) = mpsc::channel(4);
        let sender = EventSender::new(tx);
        let id = Uuid::new_v4();

        sender.send(Event::RoomCreated(id)).await.unwrap();

        match rx.recv().await {
            Some(Event::RoomCreated(received)) => assert_eq!(received, id),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn send_fails_once_receiver_is_dropped() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);

        assert!(sender.send(Event::ProductDeleted(Uuid::new_v4())).await.is_err());
        // Must not panic or block
        sender.send_or_log(Event::ProductDeleted(Uuid::new_v4())).await;
    }
}
