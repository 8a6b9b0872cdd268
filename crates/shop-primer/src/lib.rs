//! # shop-primer
//!
//! Primer client-session provider for the storefront.
//!
//! The browser never sees the Primer API key. It posts a checkout intent to
//! the storefront server, which calls `POST /client-session` here and hands
//! back the short-lived client token the hosted widget needs.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use shop_primer::PrimerSessionProvider;
//! use shop_core::{CheckoutIntent, Currency, SessionProvider};
//!
//! // Reads PRIMER_API_KEY and friends
//! let provider = PrimerSessionProvider::from_env()?;
//!
//! let intent = CheckoutIntent::builder(289.98).currency(Currency::USD).build();
//! let session = provider.create_client_session(&intent).await?;
//!
//! // session.client_token goes to the widget loader
//! ```
//!
//! A missing key is not a startup error: the server still boots and every
//! session request fails with a configuration error until the key is set.

pub mod config;
pub mod session;

// Re-exports
pub use config::{PrimerConfig, SessionDefaults, DEFAULT_API_VERSION, SANDBOX_API_URL};
pub use session::PrimerSessionProvider;
