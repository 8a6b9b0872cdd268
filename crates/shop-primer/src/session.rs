//! # Primer Client Sessions
//!
//! Server-side half of the hosted checkout: forwards a checkout intent to
//! Primer's client-session API and relays the returned token. One request per
//! checkout attempt; failures go straight back to the caller.

use crate::config::PrimerConfig;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use shop_core::{
    BillingAddress, CheckoutError, CheckoutIntent, CheckoutResult, ClientSession, ClientToken,
    SessionProvider,
};
use tracing::{debug, error, info, instrument};

const PROVIDER: &str = "primer";
const API_KEY_HEADER: &str = "X-Api-Key";
const API_VERSION_HEADER: &str = "X-Api-Version";

/// Primer client-session strategy
pub struct PrimerSessionProvider {
    config: PrimerConfig,
    client: Client,
}

impl PrimerSessionProvider {
    /// Create a new provider with its own HTTP client
    pub fn new(config: PrimerConfig) -> CheckoutResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                CheckoutError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { config, client })
    }

    /// Create from environment variables
    pub fn from_env() -> CheckoutResult<Self> {
        Self::new(PrimerConfig::from_env())
    }

    pub fn config(&self) -> &PrimerConfig {
        &self.config
    }

    /// Build the enriched request body for `POST /client-session`
    fn build_session_request<'a>(&'a self, intent: &'a CheckoutIntent) -> PrimerSessionRequest<'a> {
        let defaults = &self.config.defaults;
        let billing = intent.billing_address.as_ref();

        let country_code = billing
            .map(|b| b.country_code.trim())
            .filter(|c| !c.is_empty())
            .unwrap_or(defaults.country_code.as_str())
            .to_string();

        let (first_name, last_name) = match intent.customer_name.as_deref() {
            Some(name) => split_name(name),
            None => billing
                .map(|b| (non_blank(&b.first_name), non_blank(&b.last_name)))
                .unwrap_or((None, None)),
        };

        PrimerSessionRequest {
            order_id: &intent.order_id,
            currency_code: intent.currency_code.as_str(),
            amount: intent.amount,
            order: PrimerOrder {
                country_code,
                line_items: vec![PrimerLineItem {
                    item_id: defaults.line_item_id.clone(),
                    description: defaults.line_item_description.clone(),
                    amount: intent.amount,
                    quantity: 1,
                }],
            },
            customer: PrimerCustomer {
                email_address: intent
                    .customer_email
                    .as_deref()
                    .and_then(non_blank)
                    .unwrap_or_else(|| defaults.customer_email.clone()),
                first_name,
                last_name,
                billing_address: billing.map(PrimerAddress::from),
            },
            metadata: PrimerMetadata {
                source: &defaults.metadata_source,
                environment: &self.config.environment,
            },
        }
    }

    /// Attach auth headers
    fn authorized(&self, request: RequestBuilder, api_key: &str) -> RequestBuilder {
        request
            .header(API_KEY_HEADER, api_key)
            .header(API_VERSION_HEADER, &self.config.api_version)
    }

    /// Send once; non-2xx becomes `Upstream` with the body kept verbatim
    async fn execute(&self, request: RequestBuilder) -> CheckoutResult<String> {
        let response = request.send().await.map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            error!("Primer API error: status={}, body={}", status, body);
            return Err(upstream_error(status, &body));
        }

        Ok(body)
    }

    fn transport_error(&self, err: reqwest::Error) -> CheckoutError {
        if err.is_timeout() {
            error!("Primer API timed out after {:?}", self.config.timeout);
            CheckoutError::Timeout {
                provider: PROVIDER.to_string(),
                after_ms: self.config.timeout.as_millis() as u64,
            }
        } else {
            error!("Primer API unreachable: {}", err);
            CheckoutError::Network(err.to_string())
        }
    }
}

#[async_trait]
impl SessionProvider for PrimerSessionProvider {
    #[instrument(skip(self, intent), fields(order_id = %intent.order_id))]
    async fn create_client_session(
        &self,
        intent: &CheckoutIntent,
    ) -> CheckoutResult<ClientSession> {
        let api_key = self.config.require_api_key()?;
        intent.validate()?;

        let body = self.build_session_request(intent);
        let url = format!("{}/client-session", self.config.api_base_url);

        info!(
            "Creating Primer client session: amount={}, currency={}, key={}",
            intent.amount,
            intent.currency_code,
            self.config.masked_key()
        );
        debug!(
            "Client session request: {}",
            serde_json::to_string(&body).unwrap_or_default()
        );

        let request = self.authorized(self.client.post(&url), api_key).json(&body);
        let raw = self.execute(request).await?;

        let response: PrimerSessionResponse = serde_json::from_str(&raw).map_err(|e| {
            CheckoutError::Serialization(format!("Failed to parse Primer response: {}", e))
        })?;

        info!("Created Primer client session for order {}", intent.order_id);

        Ok(ClientSession {
            client_token: ClientToken::new(response.client_token),
            order_id: response.order_id.unwrap_or_else(|| intent.order_id.clone()),
        })
    }

    #[instrument(skip(self))]
    async fn payment_status(&self, payment_id: &str) -> CheckoutResult<serde_json::Value> {
        let api_key = self.config.require_api_key()?;

        let payment_id = payment_id.trim();
        if payment_id.is_empty()
            || !payment_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(CheckoutError::InvalidRequest(format!(
                "Invalid paymentId: {:?}",
                payment_id
            )));
        }

        let url = format!("{}/payments/{}", self.config.api_base_url, payment_id);
        let raw = self
            .execute(self.authorized(self.client.get(&url), api_key))
            .await?;

        parse_json(&raw)
    }

    #[instrument(skip(self))]
    async fn check_credentials(&self) -> CheckoutResult<serde_json::Value> {
        let api_key = self.config.require_api_key()?;
        info!("Checking Primer API key {}", self.config.masked_key());

        let url = format!("{}/payments", self.config.api_base_url);
        let raw = self
            .execute(self.authorized(self.client.get(&url), api_key))
            .await?;

        parse_json(&raw)
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }

    fn is_configured(&self) -> bool {
        self.config.is_configured()
    }
}

fn upstream_error(status: StatusCode, body: &str) -> CheckoutError {
    let details = serde_json::from_str(body)
        .unwrap_or_else(|_| serde_json::Value::String(body.to_string()));
    CheckoutError::Upstream {
        provider: PROVIDER.to_string(),
        status: status.as_u16(),
        details,
    }
}

fn parse_json(raw: &str) -> CheckoutResult<serde_json::Value> {
    if raw.trim().is_empty() {
        return Ok(serde_json::Value::Null);
    }
    serde_json::from_str(raw).map_err(|e| {
        CheckoutError::Serialization(format!("Failed to parse Primer response: {}", e))
    })
}

fn non_blank(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

/// "Ada King Lovelace" -> ("Ada", "King Lovelace")
fn split_name(full: &str) -> (Option<String>, Option<String>) {
    match full.trim().split_once(char::is_whitespace) {
        Some((first, rest)) => (non_blank(first), non_blank(rest)),
        None => (non_blank(full), None),
    }
}

// =============================================================================
// Primer API Types
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PrimerSessionRequest<'a> {
    order_id: &'a str,
    currency_code: &'a str,
    amount: i64,
    order: PrimerOrder,
    customer: PrimerCustomer,
    metadata: PrimerMetadata<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PrimerOrder {
    country_code: String,
    line_items: Vec<PrimerLineItem>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PrimerLineItem {
    item_id: String,
    description: String,
    amount: i64,
    quantity: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PrimerCustomer {
    email_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    billing_address: Option<PrimerAddress>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PrimerAddress {
    #[serde(skip_serializing_if = "String::is_empty")]
    first_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    last_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    address_line1: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    city: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    state: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    postal_code: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    country_code: String,
}

impl From<&BillingAddress> for PrimerAddress {
    fn from(b: &BillingAddress) -> Self {
        Self {
            first_name: b.first_name.trim().to_string(),
            last_name: b.last_name.trim().to_string(),
            address_line1: b.address_line1.trim().to_string(),
            city: b.city.trim().to_string(),
            state: b.state.trim().to_string(),
            postal_code: b.zip_code.trim().to_string(),
            country_code: b.country_code.trim().to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct PrimerMetadata<'a> {
    source: &'a str,
    environment: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PrimerSessionResponse {
    client_token: String,
    #[serde(default)]
    order_id: Option<String>,
}
