/// Initialize structured logging with tracing.
/// Safe to call more than once; only the first call installs a subscriber.
pub fn init_logging(json: bool) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let installed = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true)
                    .json()
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .try_init()
    };

    match installed {
        Ok(()) => tracing::info!(json = json, "Structured logging initialized"),
        Err(_) => tracing::debug!("Global tracing subscriber already set"),
    }
}
