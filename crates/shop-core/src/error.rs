//! # Checkout Error Types
//!
//! Typed error handling for the storefront checkout flow.
//! Every error is terminal for the current checkout attempt: nothing here is
//! retried automatically, the shopper decides whether to start over.

use thiserror::Error;

/// Core error type for all checkout operations
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Configuration errors (missing API key, invalid config)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Currency not in the rate table
    #[error("Unsupported currency: {code}")]
    UnsupportedCurrency { code: String },

    /// Provider answered with a non-2xx status
    #[error("Provider error [{provider}]: HTTP {status}")]
    Upstream {
        provider: String,
        status: u16,
        /// Upstream response body, JSON when it parses as JSON
        details: serde_json::Value,
    },

    /// Bounded network wait exceeded
    #[error("Request to {provider} timed out after {after_ms}ms")]
    Timeout { provider: String, after_ms: u64 },

    /// Network/HTTP error communicating with the provider
    #[error("Network error: {0}")]
    Network(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Vendor checkout script failed to load
    #[error("Failed to load checkout script: {0}")]
    ScriptLoad(String),

    /// Widget container never appeared
    #[error("Checkout container `{selector}` not found after {attempts} attempts")]
    DomNotReady { selector: String, attempts: u32 },

    /// Widget initialization threw
    #[error("Failed to initialize checkout widget: {0}")]
    WidgetInit(String),

    /// Client token could not be obtained from the session endpoint
    #[error("Failed to create client session: {0}")]
    TokenRequest(String),

    /// The widget reported a failed payment
    #[error("Payment failed: {}", describe_details(.details))]
    PaymentFailed { details: serde_json::Value },

    /// Internal error (should not happen)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CheckoutError {
    /// Returns the HTTP status code appropriate for this error.
    ///
    /// Upstream failures are reported as 500 with the provider's status
    /// carried alongside, not passed through as the response status.
    pub fn status_code(&self) -> u16 {
        match self {
            CheckoutError::Configuration(_) => 500,
            CheckoutError::InvalidRequest(_) => 400,
            CheckoutError::UnsupportedCurrency { .. } => 400,
            CheckoutError::Upstream { .. } => 500,
            CheckoutError::Timeout { .. } => 504,
            CheckoutError::Network(_) => 502,
            CheckoutError::Serialization(_) => 500,
            CheckoutError::ScriptLoad(_) => 500,
            CheckoutError::DomNotReady { .. } => 500,
            CheckoutError::WidgetInit(_) => 500,
            CheckoutError::TokenRequest(_) => 502,
            CheckoutError::PaymentFailed { .. } => 402,
            CheckoutError::Internal(_) => 500,
        }
    }

    /// Upstream status, when the provider answered at all
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            CheckoutError::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Structured details to hand back to the caller, if any
    pub fn details(&self) -> Option<&serde_json::Value> {
        match self {
            CheckoutError::Upstream { details, .. } | CheckoutError::PaymentFailed { details } => {
                Some(details)
            }
            _ => None,
        }
    }

}

/// Strings read unquoted; anything else as compact JSON
fn describe_details(details: &serde_json::Value) -> String {
    match details {
        serde_json::Value::Null => "no details".to_string(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Result type alias for checkout operations
pub type CheckoutResult<T> = Result<T, CheckoutError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_codes() {
        assert_eq!(CheckoutError::Configuration("x".into()).status_code(), 500);
        assert_eq!(CheckoutError::InvalidRequest("x".into()).status_code(), 400);
        assert_eq!(
            CheckoutError::Timeout {
                provider: "primer".into(),
                after_ms: 10_000
            }
            .status_code(),
            504
        );
    }

    #[test]
    fn test_upstream_reports_500_and_keeps_status() {
        let err = CheckoutError::Upstream {
            provider: "primer".into(),
            status: 402,
            details: json!({"error": {"errorId": "PaymentRequired"}}),
        };

        assert_eq!(err.status_code(), 500);
        assert_eq!(err.upstream_status(), Some(402));
        assert_eq!(
            err.details(),
            Some(&json!({"error": {"errorId": "PaymentRequired"}}))
        );
    }

    #[test]
    fn test_payment_failed_message_carries_details() {
        let err = CheckoutError::PaymentFailed {
            details: json!({"code": "PAYMENT_DECLINED"}),
        };
        assert_eq!(
            err.to_string(),
            r#"Payment failed: {"code":"PAYMENT_DECLINED"}"#
        );

        let err = CheckoutError::PaymentFailed {
            details: json!("Card expired"),
        };
        assert_eq!(err.to_string(), "Payment failed: Card expired");
    }

    #[test]
    fn test_dom_not_ready_message() {
        let err = CheckoutError::DomNotReady {
            selector: "#checkout".into(),
            attempts: 4,
        };
        assert_eq!(
            err.to_string(),
            "Checkout container `#checkout` not found after 4 attempts"
        );
    }
}
