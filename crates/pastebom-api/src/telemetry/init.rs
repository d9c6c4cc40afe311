use tracing_subscriber::{
    fmt::format::Format, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// Default filter when `RUST_LOG` is unset: our crates and tower-http at `log_level`.
fn default_directives(log_level: &str) -> String {
    format!("pastebom={level},tower_http={level}", level = log_level)
}

/// Initialize console tracing. `RUST_LOG` wins over `log_level` when set.
pub fn init_telemetry(log_level: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Console: compact format (message string for convenience)
    let console_fmt = tracing_subscriber::fmt::layer().event_format(
        Format::default()
            .compact()
            .with_target(false)
            .without_time(),
    );

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_directives(log_level).into()),
        )
        .with(console_fmt)
        .try_init()?;

    tracing::debug!(log_level = %log_level, "Tracing initialized");
    Ok(())
}
