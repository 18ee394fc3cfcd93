use std::path::PathBuf;

use market::watchlist::WatchlistError;
use thiserror::Error;

/// Start-up failures. Anything that goes wrong inside a refresh cycle is
/// logged and absorbed instead.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("invalid value for {name}: {value:?}")]
    InvalidEnv { name: &'static str, value: String },

    #[error("failed to read watchlist {}: {source}", .path.display())]
    WatchlistRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid watchlist {}: {source}", .path.display())]
    Watchlist {
        path: PathBuf,
        #[source]
        source: WatchlistError,
    },
}
