use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use super::currency::CurrencyBoxRates;

/// Source of the current time, injectable so expiry can be tested without sleeping.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    cached_at: DateTime<Utc>,
    rates: Arc<CurrencyBoxRates>,
}

/// Holds at most one computed result, valid for a fixed TTL.
///
/// A put replaces the previous entry wholesale. The lock is only held for the
/// read or the write itself, so callers racing on a stale entry each fetch and
/// the last writer wins.
#[derive(Clone)]
pub struct RatesCache {
    entry: Arc<Mutex<Option<CacheEntry>>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl RatesCache {
    pub const ONE_HOUR: Duration = Duration::hours(1);

    pub fn new() -> Self {
        Self::with_clock(Self::ONE_HOUR, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entry: Arc::new(Mutex::new(None)),
            ttl,
            clock,
        }
    }

    /// Returns the cached result if it is younger than the TTL.
    pub async fn get(&self) -> Option<Arc<CurrencyBoxRates>> {
        let entry = self.entry.lock().await;
        match entry.as_ref() {
            Some(e) => {
                let age = self.clock.now().signed_duration_since(e.cached_at);
                if age < self.ttl {
                    debug!(age_secs = age.num_seconds(), "Cache HIT");
                    Some(Arc::clone(&e.rates))
                } else {
                    debug!(age_secs = age.num_seconds(), "Cache entry expired");
                    None
                }
            }
            None => {
                debug!("Cache MISS");
                None
            }
        }
    }

    pub async fn put(&self, rates: Arc<CurrencyBoxRates>) {
        let mut entry = self.entry.lock().await;
        debug!("Cache PUT");
        *entry = Some(CacheEntry {
            cached_at: self.clock.now(),
            rates,
        });
    }
}

impl Default for RatesCache {
    fn default() -> Self {
        Self::new()
    }
}
