//! Option Price Resolver.
//!
//! Every place that turns a cart line into money goes through
//! [`resolve_unit_price`]: the checkout session, the webhook finalizer and
//! the notification templates. Selections are scanned in the menu item's
//! option-group declaration order, then unknown titles in lexicographic
//! order, so the outcome never depends on map iteration.
//!
//! Priority:
//! 1. the first selection carrying a price override sets the unit price;
//! 2. otherwise a selection mentioning a supplement keyword adds the fixed
//!    supplement to the base price;
//! 3. otherwise the base price applies.

use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use thiserror::Error;

use crate::{
    catalog::{Menu, annotation},
    models::{MenuItem, SelectedOptions},
};

#[derive(Debug, Error, PartialEq)]
pub enum PricingError {
    #[error("Produit invalide: {0}")]
    UnknownProduct(String),

    #[error("Cart is empty")]
    EmptyCart,

    #[error("Invalid quantity {quantity} for product {item_id}")]
    InvalidQuantity { item_id: String, quantity: i64 },

    #[error("Missing required option '{title}' for product {item_id}")]
    MissingOption { item_id: String, title: String },

    #[error("Invalid option '{title}: {value}' for product {item_id}")]
    InvalidOption {
        item_id: String,
        title: String,
        value: String,
    },

    #[error("Amount {0} cannot be expressed in minor units")]
    AmountOutOfRange(Decimal),
}

pub fn resolve_unit_price(
    menu: &Menu,
    item_id: &str,
    selected: Option<&SelectedOptions>,
) -> Result<Decimal, PricingError> {
    let base_price = menu
        .prices()
        .lookup_base_price(item_id)
        .ok_or_else(|| PricingError::UnknownProduct(item_id.to_string()))?;

    let Some(selected) = selected else {
        return Ok(base_price);
    };
    let item = menu.item(item_id);
    let selections = ordered_selections(item, selected);

    if let Some(price) = selections
        .iter()
        .find_map(|(title, value)| price_override(item, title, value))
    {
        return Ok(price);
    }

    let rules = menu.rules();
    if selections
        .iter()
        .any(|(_, value)| rules.triggers_supplement(value))
    {
        return Ok(base_price + rules.supplement);
    }

    Ok(base_price)
}

/// Selections in deterministic scan order: declared option groups first,
/// then any remaining titles in key order.
pub fn ordered_selections<'a>(
    item: Option<&MenuItem>,
    selected: &'a SelectedOptions,
) -> Vec<(&'a str, &'a str)> {
    let mut ordered = Vec::with_capacity(selected.len());
    if let Some(item) = item {
        for group in &item.options {
            if let Some((title, value)) = selected.get_key_value(group.title.as_str()) {
                ordered.push((title.as_str(), value.as_str()));
            }
        }
    }
    for (title, value) in selected {
        let declared = item.is_some_and(|item| item.option_group(title).is_some());
        if !declared {
            ordered.push((title.as_str(), value.as_str()));
        }
    }
    ordered
}

/// `"Title: Value"` pairs with price annotations removed.
pub fn describe_selections(
    menu: &Menu,
    item_id: &str,
    selected: Option<&SelectedOptions>,
) -> Option<String> {
    let selected = selected?;
    let description = ordered_selections(menu.item(item_id), selected)
        .into_iter()
        .map(|(title, value)| format!("{title}: {}", annotation::strip(value)))
        .collect::<Vec<_>>()
        .join(", ");
    (!description.is_empty()).then_some(description)
}

/// Rounds a major-unit amount to the nearest minor unit (cents).
pub fn to_minor_units(amount: Decimal) -> Result<i64, PricingError> {
    amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .map(|cents| cents.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|cents| cents.to_i64())
        .ok_or(PricingError::AmountOutOfRange(amount))
}

pub fn from_minor_units(amount: i64) -> Decimal {
    Decimal::new(amount, 2)
}

fn price_override(item: Option<&MenuItem>, title: &str, value: &str) -> Option<Decimal> {
    item.and_then(|item| item.option_group(title))
        .and_then(|group| group.find_choice(value))
        .and_then(|choice| choice.price_override)
        .or_else(|| annotation::parse_price(value))
}
