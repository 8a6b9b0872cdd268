//! # Request Handlers
//!
//! Axum request handlers for the storefront API.
//! The browser talks only to these; the provider key stays on the server.

use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use shop_core::{
    iso_currency_code, BillingAddress, CheckoutError, CheckoutIntent, ClientSession, Currency,
    Product,
};
use tracing::{error, info, instrument, warn};

// =============================================================================
// Request/Response Types
// =============================================================================

/// Body of `POST /api/client-session`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientSessionRequest {
    #[serde(default)]
    pub order_id: String,
    /// Cents, as built by the storefront
    pub amount: i64,
    #[serde(default = "default_currency")]
    pub currency_code: String,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub billing_address: Option<BillingAddress>,
}

fn default_currency() -> String {
    Currency::USD.as_str().to_string()
}

impl ClientSessionRequest {
    fn into_intent(self) -> Result<CheckoutIntent, CheckoutError> {
        Ok(CheckoutIntent {
            order_id: self.order_id,
            amount: self.amount,
            currency_code: iso_currency_code(&self.currency_code)?,
            customer_email: self.customer_email.filter(|s| !s.trim().is_empty()),
            customer_name: self.customer_name.filter(|s| !s.trim().is_empty()),
            billing_address: self.billing_address,
        })
    }
}

/// Query of `GET /api/products`
#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    #[serde(default)]
    pub category: Option<String>,
}

/// Body of `POST /api/payment-status`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStatusRequest {
    pub payment_id: String,
    #[serde(default)]
    pub order_id: Option<String>,
}

/// Answer of `GET /api/provider-check`
#[derive(Debug, Serialize)]
pub struct ProviderCheckResponse {
    pub success: bool,
    pub message: String,
    pub data: serde_json::Value,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// Upstream HTTP status, when the provider answered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
            status: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Map a checkout error to a response. `context` replaces the message for
/// upstream failures, whose detail is in the relayed body.
fn checkout_error_to_response(err: CheckoutError, context: &str) -> ApiError {
    let code = err.status_code();
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let message = match &err {
        CheckoutError::Upstream { .. } => context.to_string(),
        CheckoutError::Configuration(msg) => msg.clone(),
        other => other.to_string(),
    };

    let mut response = ErrorResponse::new(message);
    if let Some(details) = err.details() {
        response = response.with_details(details.clone());
    }
    if let Some(upstream) = err.upstream_status() {
        response = response.with_status(upstream);
    }

    (status, Json(response))
}

fn rejection_to_response(rejection: JsonRejection) -> ApiError {
    warn!("Rejected request body: {}", rejection.body_text());
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse::new(format!(
            "Invalid request body: {}",
            rejection.body_text()
        ))),
    )
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "storefront",
        "version": env!("CARGO_PKG_VERSION"),
        "provider": state.provider.provider_name(),
        "providerConfigured": state.provider.is_configured()
    }))
}

/// Exchange a checkout intent for a client token
#[instrument(skip(state, payload))]
pub async fn create_client_session(
    State(state): State<AppState>,
    payload: Result<Json<ClientSessionRequest>, JsonRejection>,
) -> Result<Json<ClientSession>, ApiError> {
    const CONTEXT: &str = "Failed to create client session";

    let Json(request) = payload.map_err(rejection_to_response)?;
    let intent = request
        .into_intent()
        .map_err(|e| checkout_error_to_response(e, CONTEXT))?;

    info!(
        "Client session requested: order={}, amount={}, currency={}",
        intent.order_id, intent.amount, intent.currency_code
    );

    let session = state
        .provider
        .create_client_session(&intent)
        .await
        .map_err(|e| {
            error!("Failed to create client session: {}", e);
            checkout_error_to_response(e, CONTEXT)
        })?;

    Ok(Json(session))
}

/// Look up a payment by id and relay the provider's record
#[instrument(skip(state, payload))]
pub async fn payment_status(
    State(state): State<AppState>,
    payload: Result<Json<PaymentStatusRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    const CONTEXT: &str = "Failed to get payment status";

    let Json(request) = payload.map_err(rejection_to_response)?;

    info!(
        "Payment status requested: payment={}, order={:?}",
        request.payment_id, request.order_id
    );

    let payment = state
        .provider
        .payment_status(&request.payment_id)
        .await
        .map_err(|e| {
            error!("Failed to get payment status: {}", e);
            checkout_error_to_response(e, CONTEXT)
        })?;

    Ok(Json(payment))
}

/// Verify the configured credentials against the provider
#[instrument(skip(state))]
pub async fn provider_check(
    State(state): State<AppState>,
) -> Result<Json<ProviderCheckResponse>, ApiError> {
    let data = state.provider.check_credentials().await.map_err(|e| {
        error!("Provider credential check failed: {}", e);
        checkout_error_to_response(e, "Provider credential check failed")
    })?;

    Ok(Json(ProviderCheckResponse {
        success: true,
        message: format!("{} API key is valid", state.provider.provider_name()),
        data,
    }))
}

/// Get products list, optionally narrowed with `?category=`
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> impl IntoResponse {
    let products: Vec<&Product> = match query.category.as_deref() {
        Some(category) => state.catalog.in_category(category).collect(),
        None => state.catalog.products.iter().collect(),
    };
    Json(serde_json::json!({
        "count": products.len(),
        "products": products,
    }))
}

/// Get single product
pub async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let product = state.catalog.get(&product_id).ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(format!(
                "Product not found: {}",
                product_id
            ))),
        )
    })?;

    Ok(Json(product.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_upstream_error_response() {
        let err = CheckoutError::Upstream {
            provider: "primer".into(),
            status: 402,
            details: json!({"error": {"errorId": "PaymentRequired"}}),
        };
        let (status, Json(body)) = checkout_error_to_response(err, "Failed to create client session");

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error, "Failed to create client session");
        assert_eq!(body.status, Some(402));
        assert_eq!(body.details, Some(json!({"error": {"errorId": "PaymentRequired"}})));
    }

    #[test]
    fn test_invalid_request_conversion() {
        let err = CheckoutError::InvalidRequest("Bad data".to_string());
        let (status, Json(body)) = checkout_error_to_response(err, "ctx");
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.details.is_none());
        assert!(body.status.is_none());
    }

    #[test]
    fn test_request_into_intent() {
        let request: ClientSessionRequest = serde_json::from_value(json!({
            "orderId": "order-1",
            "amount": 28998,
            "customerEmail": "  "
        }))
        .unwrap();

        let intent = request.into_intent().unwrap();
        assert_eq!(intent.currency_code, "USD");
        assert_eq!(intent.amount, 28998);
        assert!(intent.customer_email.is_none());
    }

    #[test]
    fn test_request_currency_outside_rate_table() {
        let request: ClientSessionRequest = serde_json::from_value(json!({
            "orderId": "order-1",
            "amount": 100,
            "currencyCode": "sek"
        }))
        .unwrap();
        assert_eq!(request.into_intent().unwrap().currency_code, "SEK");

        let request: ClientSessionRequest = serde_json::from_value(json!({
            "orderId": "order-1",
            "amount": 100,
            "currencyCode": "dollars"
        }))
        .unwrap();
        assert!(matches!(
            request.into_intent(),
            Err(CheckoutError::InvalidRequest(_))
        ));
    }
}
