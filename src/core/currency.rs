//! Currency box data model and the rate source abstraction

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// The currency the fixed amount is converted from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseCurrency {
    pub currency: String,
    pub symbol: String,
    /// Decimal amount kept as text, e.g. `"1.00"`.
    pub amount: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionTarget {
    pub currency: String,
    pub symbol: String,
}

/// Base currency plus the ordered targets shown in the box.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyBoxConfig {
    pub base: BaseCurrency,
    pub conversions: Vec<ConversionTarget>,
}

impl Default for CurrencyBoxConfig {
    fn default() -> Self {
        CurrencyBoxConfig {
            base: BaseCurrency {
                currency: "GBP".to_string(),
                symbol: "£".to_string(),
                amount: "1.00".to_string(),
            },
            conversions: vec![
                ConversionTarget {
                    currency: "USD".to_string(),
                    symbol: "$".to_string(),
                },
                ConversionTarget {
                    currency: "JPY".to_string(),
                    symbol: "¥".to_string(),
                },
            ],
        }
    }
}

impl CurrencyBoxConfig {
    /// Target codes joined with commas, as the rate endpoint expects them.
    pub fn symbols(&self) -> String {
        self.conversions
            .iter()
            .map(|c| c.currency.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Body of a latest-rates response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RateResponse {
    pub base: String,
    #[serde(default)]
    pub date: String,
    #[serde(deserialize_with = "lenient_rates")]
    pub rates: HashMap<String, Option<f64>>,
}

impl RateResponse {
    /// Rate for `code`, if present and a real number.
    pub fn rate(&self, code: &str) -> Option<f64> {
        self.rates
            .get(code)
            .copied()
            .flatten()
            .filter(|r| !r.is_nan())
    }
}

// A single null or non-numeric rate must not fail the whole payload.
fn lenient_rates<'de, D>(deserializer: D) -> Result<HashMap<String, Option<f64>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = HashMap::<String, serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.into_iter().map(|(k, v)| (k, v.as_f64())).collect())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conversion {
    pub currency: String,
    pub symbol: String,
    pub amount: String,
    pub label: String,
    #[serde(skip)]
    pub rate: Option<f64>,
}

impl Conversion {
    pub fn is_available(&self) -> bool {
        self.rate.is_some()
    }
}

/// Converted and formatted rates, ready for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyBoxRates {
    pub base: BaseCurrency,
    pub conversions: Vec<Conversion>,
    pub updated_at: String,
}

impl CurrencyBoxRates {
    /// Codes of targets the response had no usable rate for.
    pub fn unavailable(&self) -> Vec<String> {
        self.conversions
            .iter()
            .filter(|c| !c.is_available())
            .map(|c| c.currency.clone())
            .collect()
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Status(reqwest::StatusCode),
    #[error("Request error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Failed to parse rate response: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Source of the latest exchange rates for one base currency.
#[async_trait]
pub trait RateSource: Send + Sync {
    async fn fetch_latest(&self, base: &str, symbols: &str) -> Result<RateResponse, FetchError>;
}
