//! Core currency box logic

pub mod cache;
pub mod config;
pub mod currency;
pub mod format;
pub mod loader;
pub mod log;

// Re-export main types for cleaner imports
pub use cache::{Clock, RatesCache, SystemClock};
pub use currency::{CurrencyBoxConfig, CurrencyBoxRates, FetchError, RateResponse, RateSource};
pub use loader::{LoadOutcome, PageData, RateLoader};
