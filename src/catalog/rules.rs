use rust_decimal::Decimal;
use rust_decimal_macros::dec;

pub const DELIVERY_LINE_NAME: &str = "Frais de livraison";

/// Fixed money rules that sit beside the per-item prices.
#[derive(Debug, Clone)]
pub struct PricingRules {
    pub delivery_fee: Decimal,
    pub supplement: Decimal,
    pub supplement_keywords: Vec<String>,
}

impl PricingRules {
    pub fn with_delivery_fee(delivery_fee: Decimal) -> Self {
        Self {
            delivery_fee,
            ..Self::default()
        }
    }

    pub fn triggers_supplement(&self, value: &str) -> bool {
        self.supplement_keywords
            .iter()
            .any(|keyword| value.contains(keyword.as_str()))
    }
}

impl Default for PricingRules {
    fn default() -> Self {
        Self {
            delivery_fee: dec!(2.50),
            supplement: dec!(2.00),
            supplement_keywords: vec!["Crevettes".to_string(), "Agneau".to_string()],
        }
    }
}
