//! Logging bootstrap: `RUST_LOG` filter, JSON output by default with a
//! plain-text switch via `LOG_FORMAT`.

use std::sync::OnceLock;

use anyhow::Result;
use tracing_subscriber::layer::Layer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: OnceLock<()> = OnceLock::new();

pub fn init(service_name: &str) -> Result<()> {
    if INIT.get().is_some() {
        return Ok(());
    }

    let json_logs = std::env::var("LOG_FORMAT")
        .map(|value| !matches!(value.to_lowercase().as_str(), "text" | "pretty" | "plain"))
        .unwrap_or(true);
    let fmt_layer = if json_logs {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    INIT.set(()).ok();
    tracing::info!(service = service_name, "logging initialised");
    Ok(())
}
