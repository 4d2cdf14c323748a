//! API middleware components

pub mod admin_auth;
pub mod gateway;
pub mod logging;

pub use admin_auth::RequireAdmin;
pub use gateway::{admission_gate, classify_response_format};
pub use logging::logging_middleware;
