use tracing_subscriber::EnvFilter;

/// Install the global subscriber. Output goes to stderr so command output on
/// stdout stays machine-readable.
pub fn init_logging(level: &str) {
    // Base level from config, still overridable via RUST_LOG.
    let default = format!("warn,factfeed={level},facts_api={level},rusqlite=warn,reqwest=warn");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .try_init();
}
