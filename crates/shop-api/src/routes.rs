//! # Routes
//!
//! Axum router configuration for the storefront API.

use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main application router
///
/// Routes:
/// - GET  /health, / - Health check
/// - POST /api/client-session - Exchange a checkout intent for a client token
/// - POST /api/payment-status - Look up a payment
/// - GET  /api/provider-check - Verify provider credentials
/// - GET  /api/products - List all products (`?category=` narrows)
/// - GET  /api/products/{product_id} - Get product by ID
pub fn create_router(state: AppState) -> Router {
    // The widget page may be served from a different origin in development
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Session proxy
        .route("/client-session", post(handlers::create_client_session))
        .route("/payment-status", post(handlers::payment_status))
        .route("/provider-check", get(handlers::provider_check))
        // Products
        .route("/products", get(handlers::list_products))
        .route("/products/{product_id}", get(handlers::get_product));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/", get(handlers::health))
        .nest("/api", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
