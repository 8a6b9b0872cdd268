//! # Checkout Intent
//!
//! The order record assembled before contacting the payment provider, plus
//! the optional billing form that feeds it.

use crate::cart::Cart;
use crate::currency::{iso_currency_code, Currency};
use crate::error::{CheckoutError, CheckoutResult};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Prefix for order ids built straight from the cart
pub const QUICK_ORDER_PREFIX: &str = "order";
/// Prefix for order ids built through the billing form
pub const FORM_ORDER_PREFIX: &str = "ORDER";
/// Country preselected in the billing form
pub const DEFAULT_COUNTRY_CODE: &str = "US";

/// `<prefix>-<unix millis>`. Two ids built in the same millisecond collide.
pub fn timestamp_order_id(prefix: &str) -> String {
    format!("{}-{}", prefix, Utc::now().timestamp_millis())
}

/// `<prefix>-<uuid v4>`, for callers that need ids unique across sessions
pub fn unique_order_id(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4())
}

/// Billing address as collected by the form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingAddress {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub address_line1: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub zip_code: String,
    #[serde(default)]
    pub country_code: String,
}

impl BillingAddress {
    /// Set a field by its wire name (`firstName`, `zipCode`, ...)
    pub fn set_field(&mut self, field: &str, value: impl Into<String>) -> CheckoutResult<()> {
        let slot = match field {
            "firstName" => &mut self.first_name,
            "lastName" => &mut self.last_name,
            "addressLine1" => &mut self.address_line1,
            "city" => &mut self.city,
            "state" => &mut self.state,
            "zipCode" => &mut self.zip_code,
            "countryCode" => &mut self.country_code,
            other => {
                return Err(CheckoutError::InvalidRequest(format!(
                    "Unknown billing address field: {}",
                    other
                )))
            }
        };
        *slot = value.into();
        Ok(())
    }

    /// Wire names of required fields that are still blank
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("billingAddress.firstName", &self.first_name),
            ("billingAddress.lastName", &self.last_name),
            ("billingAddress.addressLine1", &self.address_line1),
            ("billingAddress.city", &self.city),
            ("billingAddress.state", &self.state),
            ("billingAddress.zipCode", &self.zip_code),
            ("billingAddress.countryCode", &self.country_code),
        ]
        .into_iter()
        .filter(|(_, v)| v.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

/// What is being purchased, ready to exchange for a client token.
///
/// Built once per checkout attempt and not modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutIntent {
    pub order_id: String,

    /// Cart total in cents: `round(total × 100)`
    pub amount: i64,

    /// ISO 4217 code the provider charges in
    pub currency_code: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_address: Option<BillingAddress>,
}

impl CheckoutIntent {
    /// Start building an intent for a USD total
    pub fn builder(total_usd: f64) -> CheckoutIntentBuilder {
        CheckoutIntentBuilder::new(total_usd)
    }

    /// Quick checkout straight from the cart, no customer details.
    /// Always charged in USD whatever the display currency.
    pub fn from_cart(cart: &Cart) -> Self {
        Self::builder(cart.total_price()).build()
    }

    /// Checks performed before the intent is forwarded to a provider
    pub fn validate(&self) -> CheckoutResult<()> {
        if self.order_id.trim().is_empty() {
            return Err(CheckoutError::InvalidRequest(
                "orderId must not be empty".to_string(),
            ));
        }
        if self.amount <= 0 {
            return Err(CheckoutError::InvalidRequest(format!(
                "amount must be positive, got {}",
                self.amount
            )));
        }
        iso_currency_code(&self.currency_code)?;
        Ok(())
    }

}

/// Builder for [`CheckoutIntent`]
#[derive(Debug, Clone)]
pub struct CheckoutIntentBuilder {
    total_usd: f64,
    currency_code: String,
    order_id: Option<String>,
    customer_email: Option<String>,
    customer_name: Option<String>,
    billing_address: Option<BillingAddress>,
}

impl CheckoutIntentBuilder {
    fn new(total_usd: f64) -> Self {
        Self {
            total_usd,
            currency_code: Currency::USD.as_str().to_string(),
            order_id: None,
            customer_email: None,
            customer_name: None,
            billing_address: None,
        }
    }

    pub fn currency(mut self, currency: Currency) -> Self {
        self.currency_code = currency.as_str().to_string();
        self
    }

    /// Any ISO 4217 code; checked by [`CheckoutIntent::validate`]
    pub fn currency_code(mut self, code: impl Into<String>) -> Self {
        self.currency_code = code.into().trim().to_ascii_uppercase();
        self
    }

    pub fn order_id(mut self, order_id: impl Into<String>) -> Self {
        self.order_id = Some(order_id.into());
        self
    }

    /// Use a UUID-based order id instead of a timestamp
    pub fn unique_order_id(mut self) -> Self {
        self.order_id = Some(unique_order_id(QUICK_ORDER_PREFIX));
        self
    }

    pub fn customer_email(mut self, email: impl Into<String>) -> Self {
        self.customer_email = Some(email.into());
        self
    }

    pub fn customer_name(mut self, name: impl Into<String>) -> Self {
        self.customer_name = Some(name.into());
        self
    }

    pub fn billing_address(mut self, address: BillingAddress) -> Self {
        self.billing_address = Some(address);
        self
    }

    /// The amount is the USD total in cents. The currency code is passed
    /// through without converting it.
    pub fn build(self) -> CheckoutIntent {
        CheckoutIntent {
            order_id: self
                .order_id
                .unwrap_or_else(|| timestamp_order_id(QUICK_ORDER_PREFIX)),
            amount: (self.total_usd * 100.0).round() as i64,
            currency_code: self.currency_code,
            customer_email: self.customer_email.filter(|s| !s.trim().is_empty()),
            customer_name: self.customer_name.filter(|s| !s.trim().is_empty()),
            billing_address: self.billing_address,
        }
    }
}

/// Billing form state. Fields are addressed by their wire names, with
/// `billingAddress.<field>` for the nested address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutForm {
    #[serde(skip)]
    total_usd: f64,
    pub order_id: String,
    pub currency_code: String,
    pub customer_email: String,
    pub customer_name: String,
    pub billing_address: BillingAddress,
}

impl CheckoutForm {
    pub fn new(total_usd: f64) -> Self {
        Self {
            total_usd,
            order_id: timestamp_order_id(FORM_ORDER_PREFIX),
            currency_code: Currency::USD.as_str().to_string(),
            customer_email: String::new(),
            customer_name: String::new(),
            billing_address: BillingAddress {
                country_code: DEFAULT_COUNTRY_CODE.to_string(),
                ..BillingAddress::default()
            },
        }
    }

    pub fn for_cart(cart: &Cart) -> Self {
        Self::new(cart.total_price())
    }

    pub fn total_usd(&self) -> f64 {
        self.total_usd
    }

    /// Update one field, e.g. `customerEmail` or `billingAddress.city`
    pub fn set_field(&mut self, field: &str, value: impl Into<String>) -> CheckoutResult<()> {
        if let Some((parent, child)) = field.split_once('.') {
            return match parent {
                "billingAddress" => self.billing_address.set_field(child, value),
                other => Err(CheckoutError::InvalidRequest(format!(
                    "Unknown form section: {}",
                    other
                ))),
            };
        }

        let slot = match field {
            "orderId" => &mut self.order_id,
            "currencyCode" => &mut self.currency_code,
            "customerEmail" => &mut self.customer_email,
            "customerName" => &mut self.customer_name,
            other => {
                return Err(CheckoutError::InvalidRequest(format!(
                    "Unknown form field: {}",
                    other
                )))
            }
        };
        *slot = value.into();
        Ok(())
    }

    /// Wire names of required fields that are still blank
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing: Vec<&'static str> = [
            ("orderId", &self.order_id),
            ("currencyCode", &self.currency_code),
            ("customerEmail", &self.customer_email),
            ("customerName", &self.customer_name),
        ]
        .into_iter()
        .filter(|(_, v)| v.trim().is_empty())
        .map(|(name, _)| name)
        .collect();
        missing.extend(self.billing_address.missing_fields());
        missing
    }

    /// Validate the form and produce the checkout intent
    pub fn submit(&self) -> CheckoutResult<CheckoutIntent> {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            return Err(CheckoutError::InvalidRequest(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )));
        }

        let currency_code = iso_currency_code(&self.currency_code)?;

        Ok(CheckoutIntent::builder(self.total_usd)
            .currency_code(currency_code)
            .order_id(self.order_id.trim())
            .customer_email(self.customer_email.trim())
            .customer_name(self.customer_name.trim())
            .billing_address(self.billing_address.clone())
            .build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::ProductCatalog;

    fn headphones_and_coffee() -> Cart {
        let catalog = ProductCatalog::demo();
        let mut cart = Cart::new();
        cart.add(catalog.get("1").unwrap());
        cart.add(catalog.get("3").unwrap());
        cart
    }

    fn filled_form(total: f64) -> CheckoutForm {
        let mut form = CheckoutForm::new(total);
        for (field, value) in [
            ("customerEmail", "ada@example.com"),
            ("customerName", "Ada Lovelace"),
            ("billingAddress.firstName", "Ada"),
            ("billingAddress.lastName", "Lovelace"),
            ("billingAddress.addressLine1", "12 Analytical Row"),
            ("billingAddress.city", "Austin"),
            ("billingAddress.state", "TX"),
            ("billingAddress.zipCode", "73301"),
        ] {
            form.set_field(field, value).unwrap();
        }
        form
    }

    #[test]
    fn test_quick_intent_from_cart() {
        let intent = CheckoutIntent::from_cart(&headphones_and_coffee());

        assert_eq!(intent.amount, 28998);
        assert_eq!(intent.currency_code, "USD");
        assert!(intent.order_id.starts_with("order-"));
        assert!(intent.customer_email.is_none());
        assert!(intent.validate().is_ok());
    }

    #[test]
    fn test_amount_is_stable_under_recomputation() {
        let cart = headphones_and_coffee();
        let first = CheckoutIntent::from_cart(&cart).amount;
        for _ in 0..10 {
            assert_eq!(CheckoutIntent::from_cart(&cart).amount, first);
        }
    }

    #[test]
    fn test_amount_is_cents_of_usd_total_in_any_currency() {
        for currency in [Currency::USD, Currency::EUR, Currency::GBP, Currency::JPY] {
            let intent = CheckoutIntent::builder(289.98).currency(currency).build();
            assert_eq!(intent.amount, 28998);
            assert_eq!(intent.currency_code, currency.as_str());
        }

    }

    #[test]
    fn test_validate_accepts_any_iso_code() {
        let sek = CheckoutIntent::builder(10.0).currency_code("sek").build();
        assert_eq!(sek.currency_code, "SEK");
        assert!(sek.validate().is_ok());

        let bad = CheckoutIntent::builder(10.0).currency_code("dollars").build();
        assert!(matches!(
            bad.validate(),
            Err(CheckoutError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_unique_order_id() {
        let a = CheckoutIntent::builder(1.0).unique_order_id().build();
        let b = CheckoutIntent::builder(1.0).unique_order_id().build();
        assert_ne!(a.order_id, b.order_id);
        assert!(a.order_id.starts_with("order-"));
    }

    #[test]
    fn test_validate_rejects_empty_cart_amount() {
        let intent = CheckoutIntent::from_cart(&Cart::new());
        assert!(matches!(
            intent.validate(),
            Err(CheckoutError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_intent_wire_format() {
        let intent = CheckoutIntent::builder(12.5)
            .order_id("order-1")
            .customer_email("a@b.co")
            .build();

        let json = serde_json::to_value(&intent).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "orderId": "order-1",
                "amount": 1250,
                "currencyCode": "USD",
                "customerEmail": "a@b.co"
            })
        );
    }

    #[test]
    fn test_form_defaults() {
        let form = CheckoutForm::new(10.0);
        assert!(form.order_id.starts_with("ORDER-"));
        assert_eq!(form.currency_code, "USD");
        assert_eq!(form.billing_address.country_code, "US");
    }

    #[test]
    fn test_form_set_field_paths() {
        let mut form = CheckoutForm::new(10.0);
        form.set_field("billingAddress.city", "Lyon").unwrap();
        form.set_field("currencyCode", "EUR").unwrap();

        assert_eq!(form.billing_address.city, "Lyon");
        assert_eq!(form.currency_code, "EUR");
        assert!(form.set_field("billingAddress.planet", "Mars").is_err());
        assert!(form.set_field("shipping.city", "Lyon").is_err());
        assert!(form.set_field("coupon", "FREE").is_err());
    }

    #[test]
    fn test_form_submit_requires_fields() {
        let form = CheckoutForm::new(10.0);
        let err = form.submit().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("customerEmail"));
        assert!(message.contains("billingAddress.city"));
        assert!(!message.contains("countryCode"));
    }

    #[test]
    fn test_form_submit_builds_intent() {
        let cart = headphones_and_coffee();
        let mut form = filled_form(cart.total_price());
        form.set_field("orderId", "ORDER-42").unwrap();

        let intent = form.submit().unwrap();
        assert_eq!(intent.order_id, "ORDER-42");
        assert_eq!(intent.amount, 28998);
        assert_eq!(intent.customer_email.as_deref(), Some("ada@example.com"));
        assert_eq!(intent.billing_address.unwrap().zip_code, "73301");
    }

    #[test]
    fn test_form_submit_currency_code() {
        let mut form = filled_form(10.0);
        form.set_field("currencyCode", "chf").unwrap();
        let intent = form.submit().unwrap();
        assert_eq!(intent.currency_code, "CHF");
        assert_eq!(intent.amount, 1000);

        form.set_field("currencyCode", "DOGE").unwrap();
        assert!(matches!(
            form.submit(),
            Err(CheckoutError::InvalidRequest(_))
        ));
    }
}
