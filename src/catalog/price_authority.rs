use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::models::MenuItem;

/// Item id -> base price in major units. Nothing else decides money.
#[derive(Debug, Clone, Default)]
pub struct PriceAuthority {
    prices: HashMap<String, Decimal>,
}

impl PriceAuthority {
    pub fn from_items<'a>(items: impl IntoIterator<Item = &'a MenuItem>) -> Self {
        let prices = items
            .into_iter()
            .map(|item| (item.id.clone(), item.base_price))
            .collect();
        Self { prices }
    }

    pub fn lookup_base_price(&self, item_id: &str) -> Option<Decimal> {
        self.prices.get(item_id).copied()
    }

    pub fn contains(&self, item_id: &str) -> bool {
        self.prices.contains_key(item_id)
    }

    /// A few known ids, sorted, for verbose diagnostics.
    pub fn sample_ids(&self, limit: usize) -> Vec<&str> {
        let mut ids: Vec<&str> = self.prices.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids.truncate(limit);
        ids
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}
