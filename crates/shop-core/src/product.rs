//! # Product Types
//!
//! Product catalog for the storefront grid.
//! Prices are kept in USD; conversion happens only for display.

use crate::currency::format_price;
use serde::{Deserialize, Serialize};

/// A product in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Unique product identifier
    pub id: String,

    /// Display name
    pub name: String,

    /// Base price in USD
    pub price: f64,

    /// Short description
    #[serde(default)]
    pub description: String,

    /// Image glyph shown on the product card
    #[serde(default)]
    pub image: String,

    /// Category label
    #[serde(default)]
    pub category: String,
}

impl Product {
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            description: String::new(),
            image: String::new(),
            category: String::new(),
        }
    }

    /// Builder: set description
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    /// Builder: set image glyph
    pub fn with_image(mut self, glyph: impl Into<String>) -> Self {
        self.image = glyph.into();
        self
    }

    /// Builder: set category
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Price formatted in the given display currency
    pub fn display_price(&self, currency_code: &str) -> String {
        format_price(self.price, currency_code)
    }
}

/// Product catalog (static, or loaded from config)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductCatalog {
    pub products: Vec<Product>,
}

impl ProductCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self {
            products: Vec::new(),
        }
    }

    /// The built-in sandbox catalog
    pub fn demo() -> Self {
        Self {
            products: vec![
                Product::new("1", "Wireless Headphones", 199.99)
                    .with_description(
                        "Premium noise-canceling wireless headphones with 30-hour battery life",
                    )
                    .with_image("🎧")
                    .with_category("Electronics"),
                Product::new("2", "Smart Watch", 299.99)
                    .with_description("Fitness tracking smartwatch with heart rate monitor and GPS")
                    .with_image("⌚")
                    .with_category("Electronics"),
                Product::new("3", "Coffee Maker", 89.99)
                    .with_description(
                        "Programmable coffee maker with thermal carafe and auto-shutoff",
                    )
                    .with_image("☕")
                    .with_category("Home"),
                Product::new("4", "Yoga Mat", 49.99)
                    .with_description("Non-slip yoga mat with carrying strap and alignment lines")
                    .with_image("🧘")
                    .with_category("Fitness"),
            ],
        }
    }

    /// Add a product to the catalog
    pub fn add(&mut self, product: Product) {
        self.products.push(product);
    }

    /// Find a product by ID
    pub fn get(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    /// Products in a category
    pub fn in_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a Product> {
        self.products.iter().filter(move |p| p.category == category)
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Load catalog from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }
}
