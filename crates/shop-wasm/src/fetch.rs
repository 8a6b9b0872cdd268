//! Token source that calls the storefront's own session endpoint.

use crate::host::js_error_message;
use async_trait::async_trait;
use shop_core::{CheckoutError, CheckoutIntent, CheckoutResult, ClientSession, TokenSource};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Headers, Request, RequestInit, Response};

pub const DEFAULT_SESSION_ENDPOINT: &str = "/api/client-session";

/// Posts the intent to the server-side proxy
#[derive(Debug, Clone)]
pub struct FetchTokenSource {
    endpoint: String,
}

impl FetchTokenSource {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Default for FetchTokenSource {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_ENDPOINT)
    }
}

#[async_trait(?Send)]
impl TokenSource for FetchTokenSource {
    async fn request_token(&self, intent: &CheckoutIntent) -> CheckoutResult<ClientSession> {
        let body = serde_json::to_string(intent)
            .map_err(|e| CheckoutError::Serialization(e.to_string()))?;

        let headers = Headers::new().map_err(token_error)?;
        headers
            .set("Content-Type", "application/json")
            .map_err(token_error)?;

        let init = RequestInit::new();
        init.set_method("POST");
        init.set_headers(&headers);
        init.set_body(&JsValue::from_str(&body));

        let request = Request::new_with_str_and_init(&self.endpoint, &init).map_err(token_error)?;
        let window = web_sys::window()
            .ok_or_else(|| CheckoutError::Internal("no global window".to_string()))?;

        let response: Response = JsFuture::from(window.fetch_with_request(&request))
            .await
            .map_err(token_error)?
            .dyn_into()
            .map_err(token_error)?;

        let text = JsFuture::from(response.text().map_err(token_error)?)
            .await
            .map_err(token_error)?
            .as_string()
            .unwrap_or_default();

        if !response.ok() {
            return Err(CheckoutError::TokenRequest(describe_proxy_error(
                response.status(),
                &text,
            )));
        }

        serde_json::from_str(&text).map_err(|e| {
            CheckoutError::Serialization(format!("Invalid client session response: {}", e))
        })
    }
}

fn token_error(err: JsValue) -> CheckoutError {
    CheckoutError::TokenRequest(js_error_message(&err))
}

/// Summarise a `{error, details, status}` body from the proxy
pub(crate) fn describe_proxy_error(http_status: u16, body: &str) -> String {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();

    let error = parsed
        .as_ref()
        .and_then(|v| v.get("error"))
        .and_then(|e| e.as_str())
        .map(str::to_string);
    let details = parsed
        .as_ref()
        .and_then(|v| v.get("details"))
        .filter(|d| !d.is_null())
        .map(|d| match d.as_str() {
            Some(s) => s.to_string(),
            None => d.to_string(),
        });

    match (error, details) {
        (Some(error), Some(details)) => format!("HTTP {}: {} ({})", http_status, error, details),
        (Some(error), None) => format!("HTTP {}: {}", http_status, error),
        _ if body.trim().is_empty() => format!("HTTP {}", http_status),
        _ => format!("HTTP {}: {}", http_status, body.trim()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_configuration_error() {
        let body = r#"{"error":"Primer API key not configured. Please set PRIMER_API_KEY environment variable."}"#;
        assert_eq!(
            describe_proxy_error(500, body),
            "HTTP 500: Primer API key not configured. Please set PRIMER_API_KEY environment variable."
        );
    }

    #[test]
    fn test_describe_upstream_error() {
        let body = r#"{"error":"Failed to create client session","details":{"error":{"errorId":"PaymentRequired"}},"status":402}"#;
        assert_eq!(
            describe_proxy_error(500, body),
            r#"HTTP 500: Failed to create client session ({"error":{"errorId":"PaymentRequired"}})"#
        );
    }

    #[test]
    fn test_describe_plain_body() {
        assert_eq!(describe_proxy_error(502, "Bad Gateway"), "HTTP 502: Bad Gateway");
        assert_eq!(describe_proxy_error(504, ""), "HTTP 504");
    }

    #[test]
    fn test_default_endpoint() {
        assert_eq!(FetchTokenSource::default().endpoint(), "/api/client-session");
    }
}
