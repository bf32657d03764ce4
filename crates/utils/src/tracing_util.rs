//! Helpers related to tracing, used by main entrypoints

/// Initialize tracing with the default configuration.
///
/// Diagnostics go to stderr and are controlled by `RUST_LOG`;
/// user-facing narration stays on stdout.
pub fn initialize_tracing() {
    let format = tracing_subscriber::fmt::format()
        .without_time()
        .with_target(false)
        .compact();

    tracing_subscriber::fmt()
        .event_format(format)
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}
