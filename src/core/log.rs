use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, Layer, filter::Targets, fmt, prelude::*};

/// Logs go to stderr so they never interleave with conversion output.
///
/// Verbose runs get a pretty debug trace of `xcc` and the store engine;
/// otherwise only errors are shown. `RUST_LOG` overrides both.
pub fn init_logging(verbose: bool) {
    let app_filter = if verbose {
        Targets::new()
            .with_target("xcc", LevelFilter::DEBUG)
            .with_target("fjall", LevelFilter::INFO)
    } else {
        Targets::new().with_default(LevelFilter::ERROR)
    };

    let fmt_layer = if verbose {
        fmt::layer()
            .pretty()
            .without_time()
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        fmt::layer()
            .compact()
            .without_time()
            .with_target(false)
            .with_writer(std::io::stderr)
            .boxed()
    };

    let registry = tracing_subscriber::registry().with(fmt_layer);
    match EnvFilter::try_from_default_env() {
        Ok(env_filter) => registry.with(env_filter).init(),
        Err(_) => registry.with(app_filter).init(),
    }
}
