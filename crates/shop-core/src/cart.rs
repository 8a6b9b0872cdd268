//! # Cart Store
//!
//! In-memory shopping cart. Lines are unique by product id and every line
//! present has a quantity of at least 1; all operations are total.

use crate::product::Product;
use serde::{Deserialize, Serialize};

/// A product with the quantity being bought
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub product: Product,
    pub quantity: u32,
}

impl CartLine {
    /// Price x quantity, in USD
    pub fn line_total(&self) -> f64 {
        self.product.price * self.quantity as f64
    }
}

/// Shopping cart, in insertion order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Add one unit of a product
    pub fn add(&mut self, product: &Product) {
        match self.lines.iter_mut().find(|l| l.product.id == product.id) {
            Some(line) => line.quantity = line.quantity.saturating_add(1),
            None => self.lines.push(CartLine {
                product: product.clone(),
                quantity: 1,
            }),
        }
    }

    /// Drop a product's line. Unknown ids are ignored.
    pub fn remove(&mut self, product_id: &str) {
        self.lines.retain(|l| l.product.id != product_id);
    }

    /// Replace a line's quantity; zero or negative removes the line.
    pub fn set_quantity(&mut self, product_id: &str, quantity: i64) {
        if quantity <= 0 {
            self.remove(product_id);
            return;
        }

        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        if let Some(line) = self.lines.iter_mut().find(|l| l.product.id == product_id) {
            line.quantity = quantity;
        }
    }

    /// Sum of price x quantity, in USD
    pub fn total_price(&self) -> f64 {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Sum of quantities. Widened so capped lines cannot overflow it.
    pub fn total_items(&self) -> u64 {
        self.lines.iter().map(|l| u64::from(l.quantity)).sum()
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn line(&self, product_id: &str) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.product.id == product_id)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::ProductCatalog;

    fn catalog() -> ProductCatalog {
        ProductCatalog::demo()
    }

    #[test]
    fn test_adding_twice_yields_one_line() {
        let catalog = catalog();
        let watch = catalog.get("2").unwrap();

        let mut cart = Cart::new();
        cart.add(watch);
        cart.add(watch);

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.line("2").unwrap().quantity, 2);
        assert_eq!(cart.total_items(), 2);
    }

    #[test]
    fn test_headphones_and_coffee_maker_total() {
        let catalog = catalog();
        let mut cart = Cart::new();
        cart.add(catalog.get("1").unwrap());
        cart.add(catalog.get("3").unwrap());

        assert!((cart.total_price() - 289.98).abs() < 1e-9);
        assert_eq!(cart.total_items(), 2);
    }

    #[test]
    fn test_set_quantity_zero_equals_remove() {
        let catalog = catalog();
        let mut via_zero = Cart::new();
        via_zero.add(catalog.get("1").unwrap());
        via_zero.add(catalog.get("4").unwrap());
        let mut via_remove = via_zero.clone();

        via_zero.set_quantity("4", 0);
        via_remove.remove("4");

        assert_eq!(via_zero, via_remove);
        assert!(via_zero.line("4").is_none());
    }

    #[test]
    fn test_negative_quantity_removes_line() {
        let catalog = catalog();
        let mut cart = Cart::new();
        cart.add(catalog.get("1").unwrap());

        cart.set_quantity("1", -3);
        assert!(cart.is_empty());
        assert_eq!(cart.total_items(), 0);
    }

    #[test]
    fn test_set_quantity_replaces_and_ignores_unknown() {
        let catalog = catalog();
        let mut cart = Cart::new();
        cart.add(catalog.get("3").unwrap());

        cart.set_quantity("3", 5);
        cart.set_quantity("missing", 7);

        assert_eq!(cart.line("3").unwrap().quantity, 5);
        assert_eq!(cart.lines().len(), 1);
        assert!((cart.total_price() - 449.95).abs() < 1e-9);
    }

    #[test]
    fn test_total_items_with_huge_quantities() {
        let catalog = catalog();
        let mut cart = Cart::new();
        cart.add(catalog.get("1").unwrap());
        cart.add(catalog.get("2").unwrap());

        cart.set_quantity("1", 3_000_000_000);
        cart.set_quantity("2", 3_000_000_000);

        assert_eq!(cart.total_items(), 6_000_000_000);
    }

    #[test]
    fn test_remove_unknown_is_noop() {
        let catalog = catalog();
        let mut cart = Cart::new();
        cart.add(catalog.get("2").unwrap());
        let before = cart.clone();

        cart.remove("nope");
        assert_eq!(cart, before);
    }

    #[test]
    fn test_operation_sequences_keep_invariants() {
        let catalog = catalog();
        let ids = ["1", "2", "3", "4"];
        let mut cart = Cart::new();

        // Deterministic pseudo-random walk over add / remove / set_quantity
        let mut seed: u64 = 0x5eed;
        for _ in 0..500 {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let id = ids[(seed >> 33) as usize % ids.len()];
            match (seed >> 40) % 3 {
                0 => cart.add(catalog.get(id).unwrap()),
                1 => cart.remove(id),
                _ => cart.set_quantity(id, ((seed >> 48) % 7) as i64 - 2),
            }

            let sum: u64 = cart.lines().iter().map(|l| u64::from(l.quantity)).sum();
            assert_eq!(cart.total_items(), sum);
            assert!(cart.lines().iter().all(|l| l.quantity >= 1));

            let mut seen: Vec<&str> = cart.lines().iter().map(|l| l.product.id.as_str()).collect();
            seen.sort_unstable();
            seen.dedup();
            assert_eq!(seen.len(), cart.lines().len());
        }
    }
}
