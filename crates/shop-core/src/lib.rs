//! # shop-core
//!
//! Core types for the hosted-checkout storefront.
//!
//! This crate provides:
//! - `Cart` and `ProductCatalog` for the product grid
//! - `Currency` and `format_price` for display conversion
//! - `CheckoutIntent` and `CheckoutForm` for assembling an order
//! - `Storefront` for the grid → form → payment sequence
//! - `SessionProvider` trait for exchanging an intent for a client token
//! - `CheckoutLoader` for sequencing the hosted widget in the browser
//! - `CheckoutError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use shop_core::{Cart, CheckoutIntent, ProductCatalog};
//!
//! let catalog = ProductCatalog::demo();
//! let mut cart = Cart::new();
//! cart.add(catalog.get("1").unwrap());
//!
//! // Package the order and exchange it for a client token
//! let intent = CheckoutIntent::from_cart(&cart);
//! let session = provider.create_client_session(&intent).await?;
//!
//! // Hand session.client_token to the widget loader
//! ```

pub mod cart;
pub mod checkout;
pub mod currency;
pub mod error;
pub mod flow;
pub mod loader;
pub mod product;
pub mod provider;

// Re-exports for convenience
pub use cart::{Cart, CartLine};
pub use checkout::{BillingAddress, CheckoutForm, CheckoutIntent, CheckoutIntentBuilder};
pub use currency::{
    format_price, iso_currency_code, try_format_price, Currency, CurrencyRate, RATE_TABLE,
};
pub use error::{CheckoutError, CheckoutResult};
pub use flow::{Storefront, View};
pub use loader::{
    CheckoutLoader, ContainerPolling, LoaderConfig, LoaderState, PaymentOutcome, TokenSource,
    WidgetHost,
};
pub use product::{Product, ProductCatalog};
pub use provider::{BoxedSessionProvider, ClientSession, ClientToken, SessionProvider};
