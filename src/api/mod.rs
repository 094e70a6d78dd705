//! HTTP API over the registry.
//!
//! `registry_router()` returns a composable `Router`; `start_server()`
//! binds it and runs it in a background task.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use router::registry_router;
pub use server::{start_server, RegistryServer};
pub use types::ApiContext;
