//! Legacy `"Label (7.00€)"` price annotations.
//!
//! Older clients and persisted snapshots embed per-choice prices in the
//! option text. The catalog carries structured overrides; these helpers keep
//! the text form readable.

use std::{str::FromStr, sync::LazyLock};

use regex::Regex;
use rust_decimal::Decimal;

static TRAILING_PRICE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\(\s*([\d.]+)\s*€\s*\)\s*$").expect("annotation pattern is valid")
});

/// Price carried by a trailing `(amount€)` suffix, if any.
pub fn parse_price(value: &str) -> Option<Decimal> {
    TRAILING_PRICE
        .captures(value)
        .and_then(|caps| caps.get(1))
        .and_then(|amount| Decimal::from_str(amount.as_str()).ok())
}

/// Display text with the price annotation removed.
pub fn strip(value: &str) -> String {
    TRAILING_PRICE.replace(value, "").trim().to_string()
}
