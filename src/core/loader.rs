//! Loads the currency box rates, going to the network at most once per TTL.

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::cache::RatesCache;
use super::currency::{
    Conversion, CurrencyBoxConfig, CurrencyBoxRates, FetchError, RateResponse, RateSource,
};
use super::format::{format_amount, format_rate_label, format_updated_at, unavailable_label};

/// What a load produced, so callers can branch on partial data and failures.
#[derive(Debug)]
pub enum LoadOutcome {
    Complete(Arc<CurrencyBoxRates>),
    Partial {
        rates: Arc<CurrencyBoxRates>,
        unavailable: Vec<String>,
    },
    Failed(FetchError),
}

impl LoadOutcome {
    fn from_rates(rates: Arc<CurrencyBoxRates>) -> Self {
        let unavailable = rates.unavailable();
        if unavailable.is_empty() {
            LoadOutcome::Complete(rates)
        } else {
            LoadOutcome::Partial { rates, unavailable }
        }
    }

    pub fn rates(&self) -> Option<&Arc<CurrencyBoxRates>> {
        match self {
            LoadOutcome::Complete(rates) | LoadOutcome::Partial { rates, .. } => Some(rates),
            LoadOutcome::Failed(_) => None,
        }
    }

    pub fn into_page_data(self) -> PageData {
        PageData {
            rates: self.rates().map(|r| r.as_ref().clone()),
        }
    }
}

/// Payload handed to the rendering layer; `rates` is `null` on any fetch failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageData {
    pub rates: Option<CurrencyBoxRates>,
}

/// Converts a response into display rates, one conversion per configured target.
pub fn to_currency_box_rates(config: &CurrencyBoxConfig, data: &RateResponse) -> CurrencyBoxRates {
    let base_amount = config
        .base
        .amount
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|a| a.is_finite());

    let conversions = config
        .conversions
        .iter()
        .map(|target| {
            // Amounts that cannot be formatted count as missing rates
            let priced = data.rate(&target.currency).and_then(|rate| {
                let converted = base_amount.map_or(rate, |amount| amount * rate);
                format_amount(converted).map(|amount| (rate, amount))
            });
            match priced {
                Some((rate, amount)) => Conversion {
                    currency: target.currency.clone(),
                    symbol: target.symbol.clone(),
                    amount,
                    label: format_rate_label(&data.base, rate, &target.currency),
                    rate: Some(rate),
                },
                None => Conversion {
                    currency: target.currency.clone(),
                    symbol: target.symbol.clone(),
                    amount: "--".to_string(),
                    label: unavailable_label(&target.currency),
                    rate: None,
                },
            }
        })
        .collect();

    CurrencyBoxRates {
        base: config.base.clone(),
        conversions,
        updated_at: format_updated_at(&data.date),
    }
}

pub struct RateLoader<S: RateSource> {
    source: S,
    config: CurrencyBoxConfig,
    cache: Arc<RatesCache>,
}

impl<S: RateSource> RateLoader<S> {
    pub fn new(source: S, config: CurrencyBoxConfig, cache: Arc<RatesCache>) -> Self {
        Self {
            source,
            config,
            cache,
        }
    }

    /// Returns cached rates while fresh, otherwise fetches, converts and caches.
    ///
    /// Failures never touch the cache.
    pub async fn load(&self) -> LoadOutcome {
        if let Some(rates) = self.cache.get().await {
            return LoadOutcome::from_rates(rates);
        }

        let base = &self.config.base.currency;
        let symbols = self.config.symbols();
        debug!(%base, %symbols, "Refreshing exchange rates");

        let data = match self.source.fetch_latest(base, &symbols).await {
            Ok(data) => data,
            Err(e) => {
                warn!(error = %e, "Failed to load exchange rates");
                return LoadOutcome::Failed(e);
            }
        };

        let rates = Arc::new(to_currency_box_rates(&self.config, &data));
        self.cache.put(Arc::clone(&rates)).await;

        let outcome = LoadOutcome::from_rates(rates);
        if let LoadOutcome::Partial { unavailable, .. } = &outcome {
            info!(?unavailable, "Some rates are unavailable");
        }
        outcome
    }

    /// Same as [`RateLoader::load`], collapsed to the page payload.
    pub async fn load_page_data(&self) -> PageData {
        self.load().await.into_page_data()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cache::tests::ManualClock;
    use async_trait::async_trait;
    use chrono::Duration;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockRateSource {
        call_count: AtomicUsize,
        responses: Mutex<Vec<Result<RateResponse, FetchError>>>,
    }

    impl MockRateSource {
        fn new(responses: Vec<Result<RateResponse, FetchError>>) -> Self {
            Self {
                call_count: AtomicUsize::new(0),
                responses: Mutex::new(responses),
            }
        }

        fn calls(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl<'a> RateSource for &'a MockRateSource {
        async fn fetch_latest(
            &self,
            base: &str,
            symbols: &str,
        ) -> Result<RateResponse, FetchError> {
            assert_eq!(base, "GBP");
            assert_eq!(symbols, "USD,JPY");
            self.call_count.fetch_add(1, Ordering::SeqCst);
            self.responses.lock().unwrap().remove(0)
        }
    }

    fn response(date: &str, rates: &[(&str, f64)]) -> RateResponse {
        RateResponse {
            base: "GBP".to_string(),
            date: date.to_string(),
            rates: rates
                .iter()
                .map(|(code, rate)| (code.to_string(), Some(*rate)))
                .collect::<HashMap<_, _>>(),
        }
    }

    fn status_error() -> FetchError {
        FetchError::Status(reqwest::StatusCode::INTERNAL_SERVER_ERROR)
    }

    #[test]
    fn test_conversions_follow_config_order() {
        let config = CurrencyBoxConfig::default();
        let data = response("2024-03-01", &[("JPY", 189.37), ("USD", 1.2345)]);

        let rates = to_currency_box_rates(&config, &data);

        assert_eq!(rates.conversions.len(), config.conversions.len());
        assert_eq!(rates.conversions[0].currency, "USD");
        assert_eq!(rates.conversions[0].symbol, "$");
        assert_eq!(rates.conversions[0].amount, "1.23");
        assert_eq!(rates.conversions[0].label, "1 GBP = 1.2345 USD");
        assert_eq!(rates.conversions[1].currency, "JPY");
        assert_eq!(rates.conversions[1].amount, "189.37");
        assert_eq!(rates.conversions[1].label, "1 GBP = 189.3700 JPY");
        assert_eq!(rates.updated_at, "Rates for Mar 1, 2024");
        assert_eq!(rates.base, config.base);
    }

    #[test]
    fn test_missing_rate_is_marked_unavailable() {
        let config = CurrencyBoxConfig::default();
        let mut data = response("2024-03-01", &[("USD", 1.2634)]);
        data.rates.insert("JPY".to_string(), Some(f64::NAN));

        let rates = to_currency_box_rates(&config, &data);

        assert_eq!(rates.conversions[0].amount, "1.26");
        assert_eq!(rates.conversions[1].amount, "--");
        assert_eq!(rates.conversions[1].label, "Rate unavailable for JPY");
        assert_eq!(rates.unavailable(), vec!["JPY".to_string()]);
    }

    #[test]
    fn test_base_amount_scales_rate() {
        let mut config = CurrencyBoxConfig::default();
        config.base.amount = "2500".to_string();
        let data = response("2024-03-01", &[("USD", 1.25), ("JPY", 190.0)]);

        let rates = to_currency_box_rates(&config, &data);

        assert_eq!(rates.conversions[0].amount, "3,125.00");
        assert_eq!(rates.conversions[1].amount, "475,000.00");
        assert_eq!(rates.conversions[0].label, "1 GBP = 1.2500 USD");
    }

    #[test]
    fn test_overflowing_amount_is_marked_unavailable() {
        let mut config = CurrencyBoxConfig::default();
        config.base.amount = "2500".to_string();
        let data = response("2024-03-01", &[("USD", 1e308), ("JPY", 190.0)]);

        let rates = to_currency_box_rates(&config, &data);

        assert_eq!(rates.conversions[0].amount, "--");
        assert_eq!(rates.conversions[0].label, "Rate unavailable for USD");
        assert_eq!(rates.conversions[1].amount, "475,000.00");
        assert_eq!(rates.unavailable(), vec!["USD".to_string()]);
    }

    #[test]
    fn test_tie_amounts_round_up() {
        let config = CurrencyBoxConfig::default();
        let data = response("2024-03-01", &[("USD", 1.125), ("JPY", 0.03125)]);

        let rates = to_currency_box_rates(&config, &data);

        assert_eq!(rates.conversions[0].amount, "1.13");
        assert_eq!(rates.conversions[1].amount, "0.0313");
    }

    #[test]
    fn test_invalid_base_amount_uses_raw_rate() {
        let mut config = CurrencyBoxConfig::default();
        config.base.amount = "one".to_string();
        let data = response("not-a-date", &[("USD", 1.2634), ("JPY", 190.1)]);

        let rates = to_currency_box_rates(&config, &data);

        assert_eq!(rates.conversions[0].amount, "1.26");
        assert_eq!(rates.conversions[1].amount, "190.10");
        assert_eq!(rates.updated_at, "Latest rates");
    }

    #[tokio::test]
    async fn test_load_caches_for_one_hour() {
        let source = MockRateSource::new(vec![
            Ok(response("2024-03-01", &[("USD", 1.2634), ("JPY", 190.1)])),
            Ok(response("2024-03-04", &[("USD", 1.27), ("JPY", 191.0)])),
        ]);
        let clock = Arc::new(ManualClock::new());
        let cache = Arc::new(RatesCache::with_clock(RatesCache::ONE_HOUR, clock.clone()));
        let loader = RateLoader::new(&source, CurrencyBoxConfig::default(), cache);

        let first = loader.load_page_data().await;
        assert_eq!(source.calls(), 1);

        clock.advance(Duration::minutes(30));
        let second = loader.load_page_data().await;
        assert_eq!(source.calls(), 1);
        assert_eq!(first, second);

        clock.advance(Duration::minutes(30));
        let third = loader.load_page_data().await;
        assert_eq!(source.calls(), 2);
        assert_eq!(third.rates.unwrap().updated_at, "Rates for Mar 4, 2024");
    }

    #[tokio::test]
    async fn test_failure_keeps_existing_entry() {
        let source = MockRateSource::new(vec![
            Ok(response("2024-03-01", &[("USD", 1.2634), ("JPY", 190.1)])),
            Err(status_error()),
        ]);
        let clock = Arc::new(ManualClock::new());
        let cache = Arc::new(RatesCache::with_clock(RatesCache::ONE_HOUR, clock.clone()));
        let loader = RateLoader::new(&source, CurrencyBoxConfig::default(), Arc::clone(&cache));

        let first = loader.load().await;
        assert!(matches!(first, LoadOutcome::Complete(_)));

        // Force a refresh that fails; the stored entry must survive.
        let stored = cache.get().await.unwrap();
        clock.advance(Duration::hours(2));
        let failed = loader.load().await;
        assert!(matches!(failed, LoadOutcome::Failed(FetchError::Status(_))));
        assert!(failed.into_page_data().rates.is_none());
        assert_eq!(source.calls(), 2);

        clock.advance(Duration::hours(-2));
        assert_eq!(cache.get().await, Some(stored));
    }

    #[tokio::test]
    async fn test_failure_with_empty_cache_returns_null_rates() {
        let source = MockRateSource::new(vec![Err(status_error()), Err(status_error())]);
        let loader = RateLoader::new(
            &source,
            CurrencyBoxConfig::default(),
            Arc::new(RatesCache::new()),
        );

        assert_eq!(loader.load_page_data().await, PageData { rates: None });
        // Nothing was cached, so the next call goes to the source again
        assert_eq!(loader.load_page_data().await, PageData { rates: None });
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_partial_outcome_is_cached() {
        let source = MockRateSource::new(vec![Ok(response("2024-03-01", &[("USD", 1.2634)]))]);
        let loader = RateLoader::new(
            &source,
            CurrencyBoxConfig::default(),
            Arc::new(RatesCache::new()),
        );

        for _ in 0..2 {
            match loader.load().await {
                LoadOutcome::Partial { rates, unavailable } => {
                    assert_eq!(unavailable, vec!["JPY".to_string()]);
                    assert_eq!(rates.conversions.len(), 2);
                }
                other => panic!("Expected partial outcome, got {other:?}"),
            }
        }
        assert_eq!(source.calls(), 1);
    }

    #[test]
    fn test_page_data_serializes_null_rates() {
        let json = serde_json::to_string(&PageData { rates: None }).unwrap();
        assert_eq!(json, r#"{"rates":null}"#);
    }

    #[test]
    fn test_page_data_serializes_camel_case() {
        let config = CurrencyBoxConfig::default();
        let data = response("2024-03-01", &[("USD", 1.2345)]);
        let page = PageData {
            rates: Some(to_currency_box_rates(&config, &data)),
        };

        let value = serde_json::to_value(&page).unwrap();
        assert_eq!(value["rates"]["updatedAt"], "Rates for Mar 1, 2024");
        assert_eq!(value["rates"]["base"]["amount"], "1.00");
        assert_eq!(value["rates"]["conversions"][0]["label"], "1 GBP = 1.2345 USD");
        assert_eq!(value["rates"]["conversions"][1]["amount"], "--");
        assert!(value["rates"]["conversions"][0].get("rate").is_none());
    }
}
