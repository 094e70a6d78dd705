//! Shared types for the HTTP layer.

use std::sync::Arc;

use crate::db::RegistryStore;

/// Shared context for all routes and middleware.
#[derive(Clone)]
pub struct ApiContext {
    pub store: Arc<dyn RegistryStore>,
}

impl ApiContext {
    pub fn new(store: Arc<dyn RegistryStore>) -> Self {
        Self { store }
    }
}
