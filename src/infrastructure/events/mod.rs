//! Change-notification fabric
//!
//! ```text
//! mutation ──publish──▶ ChangeEventBus ──▶ dispatcher task
//!                                              │ broadcast(snapshot)
//!                                              ▼
//!                                   SubscriptionRegistry
//!                                    │        │        │
//!                                   sub      sub      sub   (bounded mpsc each)
//! ```

mod bus;
mod registry;

pub use bus::ChangeEventBus;
pub use registry::{RemovalReason, Subscription, SubscriptionId, SubscriptionRegistry};
