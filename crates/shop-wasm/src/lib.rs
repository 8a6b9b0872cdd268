//! # shop-wasm
//!
//! WebAssembly bindings for the storefront.
//!
//! This crate provides WASM-compatible functions for:
//! - Cart state and the product grid → billing form → payment flow
//! - Display-currency formatting
//! - Loading the hosted checkout widget and waiting for its verdict
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { WasmStorefront, mount_checkout } from 'shop-wasm';
//!
//! await init();
//!
//! const store = new WasmStorefront();
//! store.add_to_cart('1');
//! store.add_to_cart('3');
//! console.log(store.display_total()); // "$289.98"
//!
//! const intent = store.proceed_to_payment();
//! const outcome = await mount_checkout(intent);
//! ```
//!
//! ## Building
//!
//! ```bash
//! wasm-pack build --target web
//! ```

pub mod fetch;
pub mod host;

use fetch::FetchTokenSource;
use host::BrowserHost;
use serde::Serialize;
use shop_core::{
    CheckoutError, CheckoutIntent, CheckoutLoader, Currency, LoaderConfig, ProductCatalog,
    Storefront, View,
};
use wasm_bindgen::prelude::*;

fn to_js_error(err: CheckoutError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Plain objects rather than `Map`s, so provider payloads read naturally in JS
fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Storefront state for the page: catalog, cart, currency and current view
#[wasm_bindgen]
pub struct WasmStorefront {
    inner: Storefront,
}

#[wasm_bindgen]
impl WasmStorefront {
    /// Storefront over the built-in demo catalog
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            inner: Storefront::default(),
        }
    }

    /// Storefront over a caller-supplied product list
    pub fn with_products(products: JsValue) -> Result<WasmStorefront, JsValue> {
        let catalog: ProductCatalog = ProductCatalog {
            products: serde_wasm_bindgen::from_value(products)
                .map_err(|e| JsValue::from_str(&format!("Invalid products: {}", e)))?,
        };
        Ok(Self {
            inner: Storefront::new(catalog),
        })
    }

    pub fn products(&self) -> Result<JsValue, JsValue> {
        to_js(&self.inner.catalog().products)
    }

    pub fn add_to_cart(&mut self, product_id: &str) -> Result<(), JsValue> {
        self.inner
            .add_to_cart(product_id)
            .map(|_| ())
            .map_err(to_js_error)
    }

    pub fn remove_from_cart(&mut self, product_id: &str) {
        self.inner.cart_mut().remove(product_id);
    }

    /// Zero or less removes the line
    pub fn set_quantity(&mut self, product_id: &str, quantity: i32) {
        self.inner
            .cart_mut()
            .set_quantity(product_id, i64::from(quantity));
    }

    pub fn cart_lines(&self) -> Result<JsValue, JsValue> {
        to_js(self.inner.cart().lines())
    }

    #[wasm_bindgen(getter)]
    pub fn total_price(&self) -> f64 {
        self.inner.cart().total_price()
    }

    /// A JS number rather than a BigInt; exact up to 2^53 items
    #[wasm_bindgen(getter)]
    pub fn total_items(&self) -> f64 {
        self.inner.cart().total_items() as f64
    }

    /// Unknown codes fall back to USD
    pub fn set_display_currency(&mut self, code: &str) {
        self.inner
            .set_display_currency(Currency::from_code_or_usd(code));
    }

    pub fn display_currency(&self) -> String {
        self.inner.display_currency().as_str().to_string()
    }

    pub fn display_total(&self) -> String {
        self.inner.display_total()
    }

    pub fn display_price(&self, product_id: &str) -> Option<String> {
        let code = self.inner.display_currency();
        self.inner
            .catalog()
            .get(product_id)
            .map(|p| p.display_price(code.as_str()))
    }

    /// "products", "billing_form" or "payment"
    pub fn view(&self) -> String {
        match self.inner.view() {
            View::Products => "products",
            View::BillingForm(_) => "billing_form",
            View::Payment(_) => "payment",
        }
        .to_string()
    }

    /// Quick checkout; returns the intent to hand to `mount_checkout`
    pub fn proceed_to_payment(&mut self) -> Result<JsValue, JsValue> {
        let intent = self.inner.proceed_to_payment().map_err(to_js_error)?;
        to_js(intent)
    }

    pub fn open_billing_form(&mut self) -> Result<JsValue, JsValue> {
        let form = self.inner.open_billing_form().map_err(to_js_error)?;
        to_js(&*form)
    }

    /// Dotted path, e.g. `billingAddress.city`
    pub fn set_form_field(&mut self, field: &str, value: &str) -> Result<(), JsValue> {
        let form = self
            .inner
            .billing_form_mut()
            .ok_or_else(|| JsValue::from_str("Billing form is not open"))?;
        form.set_field(field, value).map_err(to_js_error)
    }

    pub fn submit_billing_form(&mut self) -> Result<JsValue, JsValue> {
        let intent = self.inner.submit_billing_form().map_err(to_js_error)?;
        to_js(intent)
    }

    pub fn back_to_products(&mut self) {
        self.inner.back_to_products();
    }
}

impl Default for WasmStorefront {
    fn default() -> Self {
        Self::new()
    }
}

/// Format a USD base price in the given display currency
#[wasm_bindgen]
pub fn format_price(base_price: f64, currency_code: &str) -> String {
    shop_core::format_price(base_price, currency_code)
}

/// Load the hosted widget for `intent` and resolve with the payment outcome.
///
/// Rejects with a message when the token, script, container or widget
/// initialization fails. A declined payment resolves with
/// `{status: "failed", ...}` rather than rejecting.
#[wasm_bindgen]
pub async fn mount_checkout(
    intent: JsValue,
    endpoint: Option<String>,
    container_selector: Option<String>,
) -> Result<JsValue, JsValue> {
    let intent: CheckoutIntent = serde_wasm_bindgen::from_value(intent)
        .map_err(|e| JsValue::from_str(&format!("Invalid checkout intent: {}", e)))?;

    let mut config = LoaderConfig::default();
    if let Some(selector) = container_selector {
        config.container_selector = selector;
    }
    let tokens = endpoint
        .map(FetchTokenSource::new)
        .unwrap_or_default();
    let host = BrowserHost::new().map_err(to_js_error)?;

    let mut loader = CheckoutLoader::new();
    match loader.run(&host, &tokens, &intent, &config).await {
        Ok(outcome) => {
            log(&format!(
                "Checkout finished for {}: success={}",
                intent.order_id,
                outcome.is_success()
            ));
            to_js(&outcome)
        }
        Err(e) => {
            web_sys::console::error_1(&JsValue::from_str(&format!("Checkout failed: {}", e)));
            Err(to_js_error(e))
        }
    }
}

/// Log to browser console
#[wasm_bindgen]
pub fn log(message: &str) {
    web_sys::console::log_1(&JsValue::from_str(message));
}

/// Get library version
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storefront_cart() {
        let mut store = WasmStorefront::new();
        store.add_to_cart("1").unwrap();
        store.add_to_cart("3").unwrap();

        assert_eq!(store.total_items(), 2.0);
        assert!((store.total_price() - 289.98).abs() < 1e-9);
        assert_eq!(store.display_total(), "$289.98");

        store.set_quantity("1", 0);
        assert_eq!(store.total_items(), 1.0);
        store.remove_from_cart("3");
        assert_eq!(store.total_items(), 0.0);

        store.add_to_cart("2").unwrap();
        store.add_to_cart("4").unwrap();
        store.set_quantity("2", i32::MAX);
        store.set_quantity("4", i32::MAX);
        assert_eq!(store.total_items(), 2.0 * i32::MAX as f64);
    }

    #[test]
    fn test_display_currency_fallback() {
        let mut store = WasmStorefront::new();
        store.set_display_currency("JPY");
        assert_eq!(store.display_currency(), "JPY");
        assert_eq!(store.display_price("4").as_deref(), Some("¥5499"));

        store.set_display_currency("XYZ");
        assert_eq!(store.display_currency(), "USD");
    }

    #[test]
    fn test_view_names() {
        let mut store = WasmStorefront::new();
        assert_eq!(store.view(), "products");

        store.add_to_cart("2").unwrap();
        store.inner.open_billing_form().unwrap();
        assert_eq!(store.view(), "billing_form");

        store.inner.proceed_to_payment().unwrap();
        assert_eq!(store.view(), "payment");

        store.back_to_products();
        assert_eq!(store.view(), "products");
    }

    #[test]
    fn test_format_price_export() {
        assert_eq!(format_price(100.0, "EUR"), "€85.00");
        assert_eq!(format_price(100.0, "GBP"), "£73.00");
    }
}
