//! Endpoint handlers. Handlers are thin: they delegate to `crate::registry`
//! and shape the JSON response.

pub mod health;
pub mod swift_codes;
