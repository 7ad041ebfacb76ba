use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::core::currency::{FetchError, RateResponse, RateSource};

pub const DEFAULT_BASE_URL: &str = "https://api.frankfurter.app";

/// Latest rates from the Frankfurter API (ECB reference rates).
pub struct FrankfurterProvider {
    base_url: String,
    client: reqwest::Client,
}

impl FrankfurterProvider {
    pub fn new(base_url: &str) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent("ratebox/1.0")
            .build()?;
        Ok(FrankfurterProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn latest_url(&self, base: &str, symbols: &str) -> String {
        format!("{}/latest?base={}&symbols={}", self.base_url, base, symbols)
    }
}

#[async_trait]
impl RateSource for FrankfurterProvider {
    #[instrument(name = "FrankfurterFetch", skip(self), fields(base = %base))]
    async fn fetch_latest(&self, base: &str, symbols: &str) -> Result<RateResponse, FetchError> {
        let url = self.latest_url(base, symbols);
        debug!("Requesting exchange rates from {}", url);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(FetchError::Status(response.status()));
        }

        let text = response.text().await?;
        let data: RateResponse = serde_json::from_str(&text)?;
        debug!(date = %data.date, count = data.rates.len(), "Received rates");
        Ok(data)
    }
}
