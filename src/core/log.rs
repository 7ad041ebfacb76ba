use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter, filter::Targets, fmt, prelude::__tracing_subscriber_SubscriberExt,
    util::SubscriberInitExt,
};

/// Level for the `ratebox` target. Quiet by default so the currency box output
/// on stdout is all the user sees.
fn crate_level(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::OFF
    }
}

/// `RUST_LOG` when set, otherwise the crate level.
fn env_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(crate_level(verbose).into()))
}

/// Installs a compact stderr subscriber. A second call is a no-op.
pub fn init_logging(verbose: bool) {
    let targets = Targets::new().with_target("ratebox", crate_level(verbose));

    let installed = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .compact()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(targets)
        .with(env_filter(verbose))
        .try_init();

    if installed.is_err() {
        tracing::debug!("Logging already initialised");
    }
}
