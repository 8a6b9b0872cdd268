//! # Session Provider Trait
//!
//! Contract for payment providers that exchange a checkout intent for a
//! short-lived client token consumed by their hosted checkout widget.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   SessionProvider (trait)                   │
//! │  ├── create_client_session()                                │
//! │  ├── payment_status()                                       │
//! │  ├── check_credentials()                                    │
//! │  └── provider_name()                                        │
//! └─────────────────────────────────────────────────────────────┘
//!                            ▲
//!                  ┌─────────┴─────────┐
//!                  │  PrimerSession    │
//!                  │    Provider       │
//!                  └───────────────────┘
//! ```

use crate::checkout::CheckoutIntent;
use crate::error::CheckoutResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Opaque client token issued per checkout intent. Safe to hand to the
/// browser; never logged in full.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientToken(String);

impl ClientToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for ClientToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let shown: String = self.0.chars().take(8).collect();
        write!(f, "ClientToken({}…)", shown)
    }
}

/// What the session endpoint hands back to the page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientSession {
    pub client_token: ClientToken,
    pub order_id: String,
}

/// Core trait for payment provider implementations.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Exchange a checkout intent for a client token.
    ///
    /// A single request per call; failures are returned, never retried.
    async fn create_client_session(&self, intent: &CheckoutIntent)
        -> CheckoutResult<ClientSession>;

    /// Fetch a payment record by id, returned as the provider's JSON.
    async fn payment_status(&self, payment_id: &str) -> CheckoutResult<serde_json::Value>;

    /// Make an authenticated read-only call to confirm the credential works.
    async fn check_credentials(&self) -> CheckoutResult<serde_json::Value>;

    /// Get the provider name (for logging).
    fn provider_name(&self) -> &'static str;

    /// Whether a credential is configured at all
    fn is_configured(&self) -> bool;
}

/// Type alias for a shared provider (dynamic dispatch)
pub type BoxedSessionProvider = Arc<dyn SessionProvider>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_token_debug_is_masked() {
        let token = ClientToken::new("eyJhbGciOiJIUzI1NiJ9.secret-part");
        let shown = format!("{:?}", token);
        assert_eq!(shown, "ClientToken(eyJhbGci…)");
        assert!(!shown.contains("secret"));
    }

    #[test]
    fn test_client_session_wire_format() {
        let session: ClientSession =
            serde_json::from_str(r#"{"clientToken":"tok_123","orderId":"order-1"}"#).unwrap();
        assert_eq!(session.client_token.as_str(), "tok_123");
        assert_eq!(session.order_id, "order-1");

        let back = serde_json::to_value(&session).unwrap();
        assert_eq!(back["clientToken"], "tok_123");
    }
}
