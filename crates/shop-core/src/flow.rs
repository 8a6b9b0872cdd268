//! # Storefront Flow
//!
//! Page-level sequencing: product grid, then the optional billing form, then
//! the payment widget. The checkout intent lives only while the payment view
//! is shown; going back to the products discards it.

use crate::cart::Cart;
use crate::checkout::{CheckoutForm, CheckoutIntent};
use crate::currency::{format_price, Currency};
use crate::error::{CheckoutError, CheckoutResult};
use crate::product::{Product, ProductCatalog};
use tracing::debug;

/// What the page is currently showing
#[derive(Debug, Clone, PartialEq)]
pub enum View {
    Products,
    BillingForm(CheckoutForm),
    Payment(CheckoutIntent),
}

/// Catalog, cart and the current step of the checkout
#[derive(Debug, Clone)]
pub struct Storefront {
    catalog: ProductCatalog,
    cart: Cart,
    display_currency: Currency,
    view: View,
}

impl Storefront {
    pub fn new(catalog: ProductCatalog) -> Self {
        Self {
            catalog,
            cart: Cart::new(),
            display_currency: Currency::USD,
            view: View::Products,
        }
    }

    pub fn catalog(&self) -> &ProductCatalog {
        &self.catalog
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn cart_mut(&mut self) -> &mut Cart {
        &mut self.cart
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn display_currency(&self) -> Currency {
        self.display_currency
    }

    pub fn set_display_currency(&mut self, currency: Currency) {
        self.display_currency = currency;
    }

    /// Add one unit of a catalog product to the cart
    pub fn add_to_cart(&mut self, product_id: &str) -> CheckoutResult<&Product> {
        let product = self.catalog.get(product_id).ok_or_else(|| {
            CheckoutError::InvalidRequest(format!("Product not found: {}", product_id))
        })?;
        self.cart.add(product);
        Ok(product)
    }

    /// Cart total in the display currency
    pub fn display_total(&self) -> String {
        format_price(self.cart.total_price(), self.display_currency.as_str())
    }

    /// Skip the form and go straight to the payment widget
    pub fn proceed_to_payment(&mut self) -> CheckoutResult<&CheckoutIntent> {
        self.ensure_cart_not_empty()?;
        let intent = CheckoutIntent::from_cart(&self.cart);
        debug!(order_id = %intent.order_id, amount = intent.amount, "Checkout intent built");
        self.view = View::Payment(intent);
        match &self.view {
            View::Payment(intent) => Ok(intent),
            _ => Err(CheckoutError::Internal("payment view not set".to_string())),
        }
    }

    /// Open the billing form for the current cart
    pub fn open_billing_form(&mut self) -> CheckoutResult<&mut CheckoutForm> {
        self.ensure_cart_not_empty()?;
        let form = CheckoutForm::for_cart(&self.cart);
        self.view = View::BillingForm(form);
        match &mut self.view {
            View::BillingForm(form) => Ok(form),
            _ => Err(CheckoutError::Internal("form view not set".to_string())),
        }
    }

    /// The open billing form, for field edits
    pub fn billing_form_mut(&mut self) -> Option<&mut CheckoutForm> {
        match &mut self.view {
            View::BillingForm(form) => Some(form),
            _ => None,
        }
    }

    /// Submit the billing form and move on to the payment widget
    pub fn submit_billing_form(&mut self) -> CheckoutResult<&CheckoutIntent> {
        let intent = match &self.view {
            View::BillingForm(form) => form.submit()?,
            _ => {
                return Err(CheckoutError::InvalidRequest(
                    "Billing form is not open".to_string(),
                ))
            }
        };
        self.view = View::Payment(intent);
        match &self.view {
            View::Payment(intent) => Ok(intent),
            _ => Err(CheckoutError::Internal("payment view not set".to_string())),
        }
    }

    /// Return to the product grid, dropping any checkout in progress
    pub fn back_to_products(&mut self) {
        self.view = View::Products;
    }

    /// The intent being paid for, if the payment view is showing
    pub fn active_intent(&self) -> Option<&CheckoutIntent> {
        match &self.view {
            View::Payment(intent) => Some(intent),
            _ => None,
        }
    }

    fn ensure_cart_not_empty(&self) -> CheckoutResult<()> {
        if self.cart.is_empty() {
            return Err(CheckoutError::InvalidRequest("Cart is empty".to_string()));
        }
        Ok(())
    }
}

impl Default for Storefront {
    fn default() -> Self {
        Self::new(ProductCatalog::demo())
    }
}
