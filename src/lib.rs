pub mod cli;
pub mod core;
pub mod providers;

use crate::core::config::AppConfig;
use crate::core::{PageData, RateLoader, RatesCache};
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

/// Builds a loader from the config, wiring the Frankfurter provider to `cache`.
pub fn build_loader(
    config: &AppConfig,
    cache: Arc<RatesCache>,
) -> Result<RateLoader<providers::FrankfurterProvider>> {
    let provider = providers::FrankfurterProvider::new(config.frankfurter_base_url())?;
    Ok(RateLoader::new(provider, config.currency_box(), cache))
}

/// Loads the currency box for the given config and returns the page payload.
///
/// `cache` is owned by the caller; rates stay fresh across calls sharing it.
pub async fn load_page_data(config: &AppConfig, cache: Arc<RatesCache>) -> Result<PageData> {
    let loader = build_loader(config, cache)?;
    Ok(loader.load_page_data().await)
}

pub async fn run_show(config_path: Option<&str>, json: bool) -> Result<()> {
    info!("Currency box starting...");

    let config = AppConfig::load_or_default(config_path)?;
    debug!("Loaded config: {config:#?}");

    let spinner = (!json).then(|| cli::ui::new_spinner("Fetching exchange rates..."));
    let cache = Arc::new(RatesCache::new());
    let page = load_page_data(&config, cache).await?;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    println!("{}", cli::rates::render(&page, json)?);
    Ok(())
}
