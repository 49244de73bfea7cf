use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Used when `RUST_LOG` is unset or unparsable. Query logging from sqlx is
/// kept at `warn`; every statement would otherwise be logged at `info`.
const DEFAULT_FILTER: &str = "info,blogicum_server=debug,sqlx=warn,actix_server=info";

fn filter_from(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}

pub fn init_logging() {
    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    let rust_log = std::env::var("RUST_LOG").ok();
    let filter_layer = filter_from(rust_log.as_deref());

    if let Err(e) = tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .try_init()
    {
        eprintln!("Logging already initialized: {}", e);
        return;
    }

    tracing::info!(
        "Logging initialized ({})",
        rust_log.as_deref().unwrap_or(DEFAULT_FILTER)
    );
}
