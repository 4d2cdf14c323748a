//! Change event bus
//!
//! `publish` stamps each event with a sequence number and enqueues it; a
//! dispatcher task renders each event once and broadcasts it through the
//! [`SubscriptionRegistry`] to the subscribers that were already registered
//! when it was published.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::domain::change_event::{ChangeEvent, ChangeNotification, StreamMessage};

use super::registry::SubscriptionRegistry;

/// Publishing side of the change-notification fabric
#[derive(Debug, Clone)]
pub struct ChangeEventBus {
    sender: mpsc::UnboundedSender<(u64, ChangeEvent)>,
    registry: SubscriptionRegistry,
}

impl ChangeEventBus {
    /// Create the bus and spawn its dispatcher on the current runtime
    pub fn start(registry: SubscriptionRegistry) -> (Self, JoinHandle<()>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let handle = tokio::spawn(dispatch(receiver, registry.clone()));

        (Self { sender, registry }, handle)
    }

    /// Queue an event for delivery; never blocks and never fails the caller
    pub fn publish(&self, event: ChangeEvent) {
        debug!(
            codelist = %event.codelist_code,
            change_kind = %event.change_kind,
            entity_code = %event.entity_code,
            "Publishing change event"
        );

        let sequence = self.registry.next_sequence();
        if let Err(mpsc::error::SendError((_, event))) = self.sender.send((sequence, event)) {
            warn!(
                codelist = %event.codelist_code,
                "Change event dispatcher stopped, dropping event"
            );
        }
    }

    pub fn registry(&self) -> &SubscriptionRegistry {
        &self.registry
    }
}

async fn dispatch(
    mut receiver: mpsc::UnboundedReceiver<(u64, ChangeEvent)>,
    registry: SubscriptionRegistry,
) {
    while let Some((sequence, event)) = receiver.recv().await {
        if registry.is_empty() {
            continue;
        }

        let codelist = event.codelist_code.clone();
        let message = StreamMessage::Change(ChangeNotification::render(event, registry.locale()));
        let delivered = registry.broadcast_sequenced(sequence, &message);

        debug!(
            codelist = %codelist,
            sequence,
            message_id = message.message_id().unwrap_or_default(),
            delivered,
            "Change event delivered"
        );
    }

    debug!("Change event dispatcher stopped");
}
