use tracing_subscriber::EnvFilter;

/// Install a global fmt subscriber for binaries and demos.
///
/// `RUST_LOG` wins when set; otherwise `default_directive` applies, with sqlx
/// held at `warn`. The library itself never installs a subscriber.
pub fn init_tracing(default_directive: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new(default_directive).add_directive("sqlx=warn".parse()?),
    };

    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(filter)
        .try_init()
}
