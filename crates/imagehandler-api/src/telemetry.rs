use std::sync::Once;

use tracing_subscriber::{
    fmt::format::Format, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

static INIT: Once = Once::new();

/// Install the global subscriber. Later calls are no-ops.
pub fn init_telemetry() {
    INIT.call_once(|| {
        let console_fmt = tracing_subscriber::fmt::layer().event_format(
            Format::default()
                .compact()
                .with_target(false)
                .without_time(),
        );
        let installed = tracing_subscriber::registry()
            .with(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "imagehandler=debug,tower_http=debug".into()),
            )
            .with(console_fmt)
            .try_init();
        if installed.is_err() {
            tracing::debug!("Tracing subscriber already installed");
        }
    });
}
