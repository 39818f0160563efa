use tracing_subscriber::{fmt::format::Format, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "stripxmppdf=info,tower_http=info";

/// Initialize console tracing. `RUST_LOG` overrides [`DEFAULT_FILTER`].
///
/// Call once, from the binary.
pub fn init_tracing() {
    let console_fmt = tracing_subscriber::fmt::layer().event_format(Format::default().compact().with_target(false));

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into()))
        .with(console_fmt)
        .init();
}
