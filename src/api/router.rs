//! Registry API router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! Registry routes live under `/v1/swift-codes`; `/health` sits at the root.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::db::RegistryStore;

/// Build the registry router over a shared store.
pub fn registry_router(store: Arc<dyn RegistryStore>) -> Router {
    build_router(ApiContext::new(store))
}

fn build_router(ctx: ApiContext) -> Router {
    // Path params use `:param` syntax (matchit 0.7 / axum 0.7). The static
    // `country` segment takes priority over `:swift_code`.
    let v1 = Router::new()
        .route("/swift-codes", post(endpoints::swift_codes::create))
        .route(
            "/swift-codes/:swift_code",
            get(endpoints::swift_codes::details).delete(endpoints::swift_codes::remove),
        )
        .route(
            "/swift-codes/country/:country_iso2",
            get(endpoints::swift_codes::by_country),
        );

    Router::new()
        .route("/health", get(endpoints::health::check))
        .nest("/v1", v1)
        .with_state(ctx)
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
}
