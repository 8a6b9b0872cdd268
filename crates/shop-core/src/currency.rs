//! # Display Currencies
//!
//! Static conversion table used to show catalog prices (kept in USD) in the
//! shopper's selected currency.

use crate::error::{CheckoutError, CheckoutResult};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Supported display currencies (ISO 4217)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    USD,
    EUR,
    GBP,
    CAD,
    JPY,
}

/// One row of the static rate table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurrencyRate {
    pub currency: Currency,
    /// Units of `currency` per 1 USD
    pub rate: f64,
    pub symbol: &'static str,
}

/// Rates relative to USD. Not live rates; display only.
pub const RATE_TABLE: [CurrencyRate; 5] = [
    CurrencyRate { currency: Currency::USD, rate: 1.0, symbol: "$" },
    CurrencyRate { currency: Currency::EUR, rate: 0.85, symbol: "€" },
    CurrencyRate { currency: Currency::GBP, rate: 0.73, symbol: "£" },
    CurrencyRate { currency: Currency::CAD, rate: 1.25, symbol: "C$" },
    CurrencyRate { currency: Currency::JPY, rate: 110.0, symbol: "¥" },
];

impl Currency {
    /// Returns the ISO 4217 currency code
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::GBP => "GBP",
            Currency::CAD => "CAD",
            Currency::JPY => "JPY",
        }
    }

    /// Parse a currency code (case-insensitive)
    pub fn from_code(code: &str) -> CheckoutResult<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "USD" => Ok(Currency::USD),
            "EUR" => Ok(Currency::EUR),
            "GBP" => Ok(Currency::GBP),
            "CAD" => Ok(Currency::CAD),
            "JPY" => Ok(Currency::JPY),
            _ => Err(CheckoutError::UnsupportedCurrency {
                code: code.to_string(),
            }),
        }
    }

    /// Parse a currency code, falling back to USD for anything unknown
    pub fn from_code_or_usd(code: &str) -> Self {
        Self::from_code(code).unwrap_or_else(|_| {
            warn!("Unknown currency code {:?}, displaying USD", code);
            Currency::USD
        })
    }

    /// Returns the number of decimal places for this currency
    /// (JPY has 0 decimals, the others have 2)
    pub fn decimal_places(&self) -> u8 {
        match self {
            Currency::JPY => 0,
            _ => 2,
        }
    }

    fn rate_entry(&self) -> &'static CurrencyRate {
        // The table is exhaustive over the enum
        RATE_TABLE
            .iter()
            .find(|r| r.currency == *self)
            .unwrap_or(&RATE_TABLE[0])
    }

    pub fn rate(&self) -> f64 {
        self.rate_entry().rate
    }

    pub fn symbol(&self) -> &'static str {
        self.rate_entry().symbol
    }

    /// Convert a USD amount into this currency
    pub fn convert(&self, usd_amount: f64) -> f64 {
        usd_amount * self.rate()
    }

    /// Format an amount already expressed in this currency
    pub fn format(&self, amount: f64) -> String {
        let decimals = self.decimal_places() as usize;
        format!("{}{:.*}", self.symbol(), decimals, amount)
    }
}

impl Default for Currency {
    fn default() -> Self {
        Currency::USD
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Currency {
    type Err = CheckoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s)
    }
}

/// Format a USD base price in the selected display currency.
///
/// Unknown codes are displayed as USD.
pub fn format_price(base_price: f64, code: &str) -> String {
    let currency = Currency::from_code_or_usd(code);
    currency.format(currency.convert(base_price))
}

/// Strict variant of [`format_price`]: unknown codes are an error.
pub fn try_format_price(base_price: f64, code: &str) -> CheckoutResult<String> {
    let currency = Currency::from_code(code)?;
    Ok(currency.format(currency.convert(base_price)))
}

/// Normalise a charge currency code. Any three-letter ISO 4217 code is
/// accepted; the rate table only limits what can be displayed.
pub fn iso_currency_code(code: &str) -> CheckoutResult<String> {
    let code = code.trim();
    if code.len() != 3 || !code.bytes().all(|b| b.is_ascii_alphabetic()) {
        return Err(CheckoutError::InvalidRequest(format!(
            "currencyCode must be a three-letter ISO 4217 code, got {:?}",
            code
        )));
    }
    Ok(code.to_ascii_uppercase())
}
