//! API request and response types

pub mod error;
pub mod json;
pub mod xml;

pub use error::{ApiError, ApiErrorResponse};
pub use json::Json;
pub use xml::{negotiated, requested_format, ToXml, Xml};
