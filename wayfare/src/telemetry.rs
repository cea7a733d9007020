//! Tracing initialization.
//!
//! Log output is controlled with the standard `RUST_LOG` environment variable and defaults to
//! `info`. For example, to see SQL-level detail for the booking repository:
//!
//! ```bash
//! RUST_LOG=info,wayfare::db::handlers::bookings=debug wayfare -f config.yaml
//! ```

use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Install the global tracing subscriber: an env-filtered fmt layer on stdout.
pub fn init_telemetry() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;

    info!("Telemetry initialized");
    Ok(())
}
