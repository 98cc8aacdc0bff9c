//! API module
//!
//! HTTP API endpoints, shared state and middleware.

pub mod middleware;
pub mod routes;

use std::sync::Arc;

use axum::{middleware as axum_middleware, routing::get, Router};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::auth::{CredentialHasher, JwtSigner};
use crate::handlers::{AuthHandler, InfoHandler, PurchaseHandler, TransferHandler};
use crate::repository::{Store, UnitOfWork};

pub use routes::create_router;

/// Handlers and token signer shared by every request
pub struct AppState<S> {
    pub auth: Arc<AuthHandler<S>>,
    pub transfer: Arc<TransferHandler<S>>,
    pub purchase: Arc<PurchaseHandler<S>>,
    pub info: Arc<InfoHandler<S>>,
    pub signer: Arc<JwtSigner>,
}

impl<S: Store> AppState<S> {
    pub fn new(
        uow: UnitOfWork<S>,
        hasher: Arc<dyn CredentialHasher>,
        signer: Arc<JwtSigner>,
    ) -> Self {
        Self {
            auth: Arc::new(AuthHandler::new(uow.clone(), hasher, signer.clone())),
            transfer: Arc::new(TransferHandler::new(uow.clone())),
            purchase: Arc::new(PurchaseHandler::new(uow.clone())),
            info: Arc::new(InfoHandler::new(uow)),
            signer,
        }
    }
}

// Derive would demand `S: Clone` even though only `Arc`s are cloned.
impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            auth: Arc::clone(&self.auth),
            transfer: Arc::clone(&self.transfer),
            purchase: Arc::clone(&self.purchase),
            info: Arc::clone(&self.info),
            signer: Arc::clone(&self.signer),
        }
    }
}

/// Build the full application router with middleware
pub fn build_router<S: Store>(state: AppState<S>) -> Router {
    let api_routes = create_router(&state);

    Router::new()
        .route("/health", get(|| async { "OK" }))
        .nest("/api", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(axum_middleware::from_fn(middleware::logging_middleware)),
        )
        .with_state(state)
}
