use once_cell::sync::OnceCell;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

static LOGGER_INIT: OnceCell<()> = OnceCell::new();

/// Output format of the installed subscriber.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    /// Human readable, for terminals.
    Pretty,
    /// One JSON object per line, for log shipping.
    Json,
}

impl LogFormat {
    /// `APP_ENV=production` selects JSON, anything else pretty output.
    pub fn from_app_env(app_env: &str) -> Self {
        if app_env == "production" {
            Self::Json
        } else {
            Self::Pretty
        }
    }
}

/// Installs the global subscriber. Later calls are no-ops.
///
/// Logs go to stderr so that the rendered board on stdout stays clean.
pub fn init_logger(service_name: &'static str, format: LogFormat) {
    LOGGER_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let base = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true) // <-- shows crate/module path
            .with_thread_ids(true)
            .with_line_number(true)
            .with_span_events(fmt::format::FmtSpan::CLOSE);

        match format {
            LogFormat::Json => tracing_subscriber::registry()
                .with(filter)
                .with(base.json())
                .init(),
            LogFormat::Pretty => tracing_subscriber::registry()
                .with(filter)
                .with(base.compact())
                .init(),
        }

        tracing::info!(service = service_name, ?format, "logger initialized");
    });
}
