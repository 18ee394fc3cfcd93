use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "kabu-board", version, about = "Watch board for Japanese equities")]
pub struct Cli {
    /// Watchlist JSON file (overrides WATCHLIST_PATH)
    #[arg(long, short = 'w')]
    pub watchlist: Option<PathBuf>,

    /// Keep refreshing until interrupted. Type `r` + Enter to refresh now, `q` + Enter to quit
    #[arg(long)]
    pub live: bool,

    /// Refresh interval in seconds, clamped to 30..=300 (overrides REFRESH_INTERVAL_SECS)
    #[arg(long, requires = "live")]
    pub interval: Option<u64>,

    /// Print each board as JSON instead of a text table
    #[arg(long)]
    pub json: bool,

    /// Never colour the signal column, even on a terminal
    #[arg(long)]
    pub no_color: bool,
}
