use std::io::{BufRead as _, IsTerminal as _, Write as _};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use common::logger::init_logger;
use dashboard::{
    board::{BoardLayout, BoardSnapshot, BoardStore, RefreshMode, Trigger, render_text},
    cli::Cli,
    config::{AppConfig, load_watchlist},
    refresh::RefreshService,
};
use market::{cache::CachedQuoteSource, yahoo::YahooChartClient};
use tokio::sync::{mpsc, watch};

/// Writes one board to stdout, as text or JSON.
fn print_board(snapshot: &BoardSnapshot, layout: &BoardLayout, json: bool) -> anyhow::Result<()> {
    let body = if json {
        serde_json::to_string_pretty(snapshot).context("serialize board")?
    } else {
        render_text(snapshot, layout)
    };

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{body}")?;
    stdout.flush()?;
    Ok(())
}

/// Reads operator commands from stdin: `r` refreshes now, `q` quits.
///
/// Runs on a plain thread: a pending stdin read must not hold up runtime shutdown.
fn spawn_stdin_commands(manual_tx: mpsc::Sender<()>, shutdown_tx: watch::Sender<bool>) {
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            match line.trim() {
                "r" | "refresh" => {
                    if manual_tx.blocking_send(()).is_err() {
                        break;
                    }
                }
                "q" | "quit" => {
                    let _ = shutdown_tx.send(true);
                    break;
                }
                "" => {}
                other => tracing::warn!(command = other, "unknown command; use r or q"),
            }
        }
    });
}

/// Prints every published board until shutdown.
fn spawn_board_printer(
    store: &BoardStore,
    layout: BoardLayout,
    json: bool,
    mut shutdown: watch::Receiver<bool>,
) -> tokio::task::JoinHandle<()> {
    let mut boards = store.subscribe();

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                changed = boards.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let latest = boards.borrow_and_update().clone();
                    if let Some(snapshot) = latest {
                        if let Err(e) = print_board(&snapshot, &layout, json) {
                            tracing::error!(error = ?e, "failed to print board");
                        }
                    }
                }
            }
        }
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cfg = AppConfig::from_env()
        .context("invalid environment configuration")?
        .apply_cli(&cli);

    init_logger("kabu-board", cfg.log_format);

    tracing::info!("Starting watch board...");

    let watchlist = Arc::new(load_watchlist(&cfg.watchlist_path)?);

    let client = YahooChartClient::new(cfg.quote_source_url.clone(), cfg.http_timeout)
        .context("failed to build quote source client")?;
    let cache = Arc::new(CachedQuoteSource::new(client, cfg.cache_ttl));

    let store = BoardStore::new();
    let mode = if cli.live {
        RefreshMode::Live {
            every: cfg.refresh_interval,
        }
    } else {
        RefreshMode::Static
    };
    let color = !cli.no_color && std::io::stdout().is_terminal();
    let layout = BoardLayout::from_watchlist(&watchlist, cfg.display_tz, mode).with_color(color);

    let service = Arc::new(RefreshService::new(
        cache,
        Arc::clone(&watchlist),
        store.clone(),
        cfg.fetch_concurrency,
        cfg.slow_cycle,
    ));

    if !cli.live {
        let snapshot = service.run_cycle(Trigger::OneShot).await;
        print_board(&snapshot, &layout, cli.json)?;
        return Ok(());
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (manual_tx, manual_rx) = mpsc::channel(4);

    let printer = spawn_board_printer(&store, layout, cli.json, shutdown_rx.clone());
    spawn_stdin_commands(manual_tx, shutdown_tx.clone());

    let live = tokio::spawn(Arc::clone(&service).run_live(
        cfg.refresh_interval,
        manual_rx,
        shutdown_rx,
    ));

    let mut quit = shutdown_tx.subscribe();
    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            res.context("failed to listen for ctrl-c")?;
            tracing::info!("Shutdown signal received");
        }
        _ = quit.changed() => {
            tracing::info!("Quit requested");
        }
    }

    let _ = shutdown_tx.send(true);
    live.await.context("live refresh task panicked")?;
    printer.await.context("board printer task panicked")?;

    Ok(())
}
