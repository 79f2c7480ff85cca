use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset or unparsable.
const DEFAULT_DIRECTIVE: &str = "billing_service=info,warn";

/// Log to stderr so stdout stays free for piping batch results.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
