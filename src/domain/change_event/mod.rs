//! Change notification domain
//!
//! Events describing committed codelist mutations and the messages streamed
//! to subscribers.

mod event;
mod message;

pub use event::{ChangeEvent, ChangeKind};
pub use message::{ChangeNotification, Locale, StreamMessage};
