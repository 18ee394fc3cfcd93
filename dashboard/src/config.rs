use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use chrono_tz::Tz;
use common::logger::LogFormat;
use market::watchlist::Watchlist;

use crate::cli::Cli;
use crate::error::AppError;

/// Bounds of the live refresh interval, in seconds.
pub const MIN_REFRESH_SECS: u64 = 30;
pub const MAX_REFRESH_SECS: u64 = 300;

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Base URL of the chart API; the symbol path is appended per request.
    pub quote_source_url: String,

    /// JSON file listing instruments, indices and highlights.
    pub watchlist_path: PathBuf,

    // =========================
    // Refresh configuration
    // =========================
    /// Delay between scheduled cycles in live mode.
    ///
    /// Always within [`MIN_REFRESH_SECS`, `MAX_REFRESH_SECS`]; out of range
    /// values are clamped rather than rejected.
    pub refresh_interval: Duration,

    /// How long a fetched quote is reused before hitting the source again.
    ///
    /// Keeps back-to-back cycles (start-up plus an early manual refresh)
    /// from re-requesting every symbol. A manual refresh bypasses it.
    pub cache_ttl: Duration,

    /// Maximum in-flight quote requests per cycle.
    pub fetch_concurrency: usize,

    /// Per-request timeout enforced by the HTTP client.
    pub http_timeout: Duration,

    /// Cycles slower than this are reported with a warning.
    pub slow_cycle: Duration,

    // =========================
    // Presentation
    // =========================
    /// Timezone of the board clock.
    pub display_tz: Tz,

    pub log_format: LogFormat,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from any variable lookup; `from_env` passes the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let quote_source_url = lookup("QUOTE_SOURCE_URL")
            .unwrap_or_else(|| "https://query1.finance.yahoo.com".to_string());

        let watchlist_path = lookup("WATCHLIST_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("watchlist.json"));

        let refresh_secs: u64 = parse_var(&lookup, "REFRESH_INTERVAL_SECS", 60)?;
        let cache_ttl_secs: u64 = parse_var(&lookup, "CACHE_TTL_SECS", 30)?;
        let http_timeout_secs: u64 = parse_var(&lookup, "HTTP_TIMEOUT_SECS", 5)?;
        let fetch_concurrency: usize = parse_var(&lookup, "FETCH_CONCURRENCY", 4)?;
        let display_tz: Tz = parse_var(&lookup, "DISPLAY_TZ", chrono_tz::Asia::Tokyo)?;

        let log_format = LogFormat::from_app_env(&lookup("APP_ENV").unwrap_or_default());

        Ok(Self {
            quote_source_url,
            watchlist_path,
            refresh_interval: clamp_refresh_interval(refresh_secs),
            cache_ttl: Duration::from_secs(cache_ttl_secs),
            fetch_concurrency: fetch_concurrency.max(1),
            http_timeout: Duration::from_secs(http_timeout_secs.max(1)),
            slow_cycle: Duration::from_secs(10),
            display_tz,
            log_format,
        })
    }

    /// Command line flags win over the environment.
    pub fn apply_cli(mut self, cli: &Cli) -> Self {
        if let Some(path) = &cli.watchlist {
            self.watchlist_path = path.clone();
        }
        if let Some(secs) = cli.interval {
            self.refresh_interval = clamp_refresh_interval(secs);
        }
        self
    }
}

pub fn clamp_refresh_interval(secs: u64) -> Duration {
    Duration::from_secs(secs.clamp(MIN_REFRESH_SECS, MAX_REFRESH_SECS))
}

fn parse_var<T, F>(lookup: &F, name: &'static str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::InvalidEnv { name, value: raw }),
    }
}

/// Reads and validates the watchlist file.
pub fn load_watchlist(path: &Path) -> Result<Watchlist, AppError> {
    let raw = std::fs::read_to_string(path).map_err(|source| AppError::WatchlistRead {
        path: path.to_path_buf(),
        source,
    })?;

    Watchlist::from_json(&raw).map_err(|source| AppError::Watchlist {
        path: path.to_path_buf(),
        source,
    })
}
