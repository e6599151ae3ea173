use tracing_subscriber::EnvFilter;

/// JSON log lines on stdout for CloudWatch, filtered through `RUST_LOG`
/// (default `info`). Later calls are no-ops.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_current_span(false)
        .with_target(false)
        .without_time()
        .try_init();
}
