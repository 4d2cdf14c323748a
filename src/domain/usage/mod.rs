//! Usage metering domain
//!
//! One record per completed external API call.

mod record;
mod repository;

pub use record::{ResponseFormat, UsageRecord, UsageRecordId};
#[cfg(test)]
pub use repository::MockUsageRepository;
pub use repository::UsageRepository;
