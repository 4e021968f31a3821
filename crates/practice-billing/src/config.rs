//! Billing configuration injected into the engine

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::model::YearMonth;

/// Business constants the engine works with
///
/// Every field has a default, so a `[billing]` section in config.toml only
/// needs to name the values a practice wants to change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BillingConfig {
    /// Tax rate applied to billed amounts (0.16 = 16%)
    pub tax_rate: f64,
    /// Hourly client price when no override or rate table entry exists
    pub fallback_client_rate: f64,
    /// Hourly therapist cost when no client or service override exists
    pub fallback_therapist_cost: f64,
    /// Therapy type for generated appointments whose slot names none
    pub default_therapy_type: String,
    /// Month names for report labels, January first
    pub month_names: Vec<String>,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            tax_rate: constants::DEFAULT_TAX_RATE,
            fallback_client_rate: constants::FALLBACK_CLIENT_RATE,
            fallback_therapist_cost: constants::FALLBACK_THERAPIST_COST,
            default_therapy_type: constants::DEFAULT_THERAPY_TYPE.to_string(),
            month_names: constants::DEFAULT_MONTH_NAMES.iter().map(|m| m.to_string()).collect(),
        }
    }
}

impl BillingConfig {
    /// Human readable label for a month, e.g. "Enero 2024"
    ///
    /// Falls back to the `YYYY-MM` form when `month_names` has no entry for
    /// the month.
    pub fn month_label(&self, month: YearMonth) -> String {
        match (month.month as usize).checked_sub(1).and_then(|i| self.month_names.get(i)) {
            Some(name) => format!("{} {}", name, month.year),
            None => month.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_constants() {
        let config = BillingConfig::default();
        assert_eq!(config.tax_rate, 0.16);
        assert_eq!(config.fallback_client_rate, 450.0);
        assert_eq!(config.fallback_therapist_cost, 200.0);
        assert_eq!(config.month_names.len(), 12);
    }

    #[test]
    fn test_month_label() {
        let config = BillingConfig::default();
        let month: YearMonth = "2024-01".parse().unwrap();
        assert_eq!(config.month_label(month), "Enero 2024");

        let december: YearMonth = "2023-12".parse().unwrap();
        assert_eq!(config.month_label(december), "Diciembre 2023");
    }

    #[test]
    fn test_month_label_missing_names() {
        let config = BillingConfig {
            month_names: vec!["January".to_string()],
            ..Default::default()
        };
        let march: YearMonth = "2024-03".parse().unwrap();
        assert_eq!(config.month_label(march), "2024-03");
    }

    #[test]
    fn test_partial_toml_section_keeps_defaults() {
        let config: BillingConfig = toml::from_str("tax_rate = 0.08").unwrap();
        assert_eq!(config.tax_rate, 0.08);
        assert_eq!(config.fallback_client_rate, 450.0);
        assert_eq!(config.default_therapy_type, "standard session");
    }
}
