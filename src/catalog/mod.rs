//! Read-only menu reference data, loaded once at startup and shared by
//! every component that prices or describes a cart.

pub mod annotation;
mod price_authority;
mod rules;

use std::collections::{HashMap, HashSet};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::models::{MenuItem, OptionChoice, OptionGroup};

pub use price_authority::PriceAuthority;
pub use rules::{DELIVERY_LINE_NAME, PricingRules};

const EMBEDDED_MENU: &str = include_str!("../../data/menu.json");

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("menu file could not be read: {0}")]
    Io(#[from] std::io::Error),

    #[error("menu file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("menu item id '{0}' is declared twice")]
    DuplicateItem(String),

    #[error("menu item '{0}' has a negative price")]
    NegativePrice(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RestaurantInfo {
    pub id: String,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MenuCatalog {
    pub restaurant: RestaurantInfo,
    pub categories: Vec<String>,
    pub items: Vec<MenuItem>,
}

impl MenuCatalog {
    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        let catalog: MenuCatalog = serde_json::from_str(raw)?;

        let mut seen = HashSet::new();
        for item in &catalog.items {
            if !seen.insert(item.id.as_str()) {
                return Err(CatalogError::DuplicateItem(item.id.clone()));
            }
            let negative_override = item
                .options
                .iter()
                .flat_map(|group| group.choices.iter())
                .any(|choice| choice.price_override.is_some_and(|p| p < Decimal::ZERO));
            if item.base_price < Decimal::ZERO || negative_override {
                return Err(CatalogError::NegativePrice(item.id.clone()));
            }
        }

        Ok(catalog)
    }

    pub fn embedded() -> Result<Self, CatalogError> {
        Self::from_json(EMBEDDED_MENU)
    }

    /// Reads `path` when given, the embedded menu otherwise.
    pub async fn load(path: Option<&str>) -> Result<Self, CatalogError> {
        match path {
            Some(path) => {
                let raw = tokio::fs::read_to_string(path).await?;
                Self::from_json(&raw)
            }
            None => Self::embedded(),
        }
    }
}

/// Catalog, price authority and pricing rules bundled for injection.
#[derive(Debug, Clone)]
pub struct Menu {
    catalog: MenuCatalog,
    index: HashMap<String, usize>,
    prices: PriceAuthority,
    rules: PricingRules,
}

impl Menu {
    pub fn new(catalog: MenuCatalog, rules: PricingRules) -> Self {
        let index = catalog
            .items
            .iter()
            .enumerate()
            .map(|(position, item)| (item.id.clone(), position))
            .collect();
        let prices = PriceAuthority::from_items(&catalog.items);
        Self {
            catalog,
            index,
            prices,
            rules,
        }
    }

    pub fn catalog(&self) -> &MenuCatalog {
        &self.catalog
    }

    pub fn prices(&self) -> &PriceAuthority {
        &self.prices
    }

    pub fn rules(&self) -> &PricingRules {
        &self.rules
    }

    pub fn item(&self, item_id: &str) -> Option<&MenuItem> {
        self.index
            .get(item_id)
            .and_then(|position| self.catalog.items.get(*position))
    }
}

impl OptionGroup {
    /// Catalog choice matching a selected value, accepting the legacy
    /// annotated text as long as its label matches.
    pub fn find_choice(&self, value: &str) -> Option<&OptionChoice> {
        let label = annotation::strip(value);
        self.choices.iter().find(|choice| choice.label == label)
    }
}
