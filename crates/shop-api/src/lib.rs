//! # shop-api
//!
//! HTTP API layer for the hosted-checkout storefront.
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - The client-session proxy that keeps the provider key server-side
//! - REST endpoints for the product catalog
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | POST | `/api/client-session` | Create client session |
//! | POST | `/api/payment-status` | Payment lookup |
//! | GET | `/api/provider-check` | Verify provider credentials |
//! | GET | `/api/products` | List products |
//! | GET | `/api/products/{id}` | Get product |

pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::{AppConfig, AppState};
