//! Plain-text rendering of a board snapshot.

use std::fmt::Write;
use std::time::Duration;

use chrono_tz::Tz;
use market::signal::Signal;
use market::types::Evaluation;
use market::watchlist::Watchlist;
use nu_ansi_term::{Color, Style};

use crate::board::snapshot::BoardSnapshot;

/// How the board is being refreshed, shown under the title.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshMode {
    Static,
    Live { every: Duration },
}

impl RefreshMode {
    fn banner(&self) -> String {
        match self {
            RefreshMode::Static => "Static mode: run again to refresh".to_string(),
            RefreshMode::Live { every } => format!(
                "Live monitoring: refreshing every {}s (r = refresh now, q = quit)",
                every.as_secs()
            ),
        }
    }
}

/// Presentation settings that do not change between cycles.
#[derive(Debug, Clone)]
pub struct BoardLayout {
    pub title: String,
    pub highlight: Vec<String>,
    pub top_n: usize,
    pub review_notes: Vec<String>,
    pub tz: Tz,
    pub mode: RefreshMode,
    /// Emit ANSI colours for the signal column.
    pub color: bool,
}

impl BoardLayout {
    pub fn from_watchlist(watchlist: &Watchlist, tz: Tz, mode: RefreshMode) -> Self {
        Self {
            title: watchlist.title.clone(),
            highlight: watchlist.highlight.clone(),
            top_n: watchlist.top_n,
            review_notes: watchlist.review_notes.clone(),
            tz,
            mode,
            color: false,
        }
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }
}

const HEADERS: [&str; 8] = [
    "CODE", "NAME", "PRICE", "BUY BAND", "SIGNAL", "TARGET", "UPSIDE", "NOTE",
];

pub fn render_text(snapshot: &BoardSnapshot, layout: &BoardLayout) -> String {
    let mut out = String::new();
    let clock = snapshot
        .refreshed_at
        .with_timezone(&layout.tz)
        .format("%Y-%m-%d %H:%M:%S %Z");

    let _ = writeln!(
        out,
        "{}  [{}]  cycle #{} ({})",
        layout.title,
        clock,
        snapshot.cycle,
        snapshot.trigger.as_str()
    );
    let _ = writeln!(out, "{}", layout.mode.banner());
    out.push('\n');

    if !snapshot.indices.is_empty() {
        out.push_str("Indices\n");
        for idx in &snapshot.indices {
            let _ = writeln!(
                out,
                "  {:<16} {:>12}  ({}, {}%)",
                idx.index.name,
                group_thousands(idx.last, 2),
                signed(idx.change, 2),
                signed(idx.change_pct, 2),
            );
        }
        out.push('\n');
    }

    let strip = snapshot.metrics_strip(&layout.highlight, layout.top_n);
    if !strip.is_empty() {
        out.push_str("Highlights\n");
        for e in strip {
            write_card(&mut out, e, layout.color);
        }
        out.push('\n');
    }

    let top = snapshot.top_by_upside(layout.top_n);
    if !top.is_empty() {
        let _ = writeln!(out, "Top {} by upside", top.len());
        for e in top {
            write_card(&mut out, e, layout.color);
        }
        out.push('\n');
    }

    if snapshot.evaluations.is_empty() {
        out.push_str("No quotes available this cycle.\n");
    } else {
        write_table(&mut out, &snapshot.evaluations, layout.color);
    }

    if !snapshot.omitted.is_empty() {
        let symbols: Vec<&str> = snapshot.omitted.iter().map(|o| o.symbol.as_str()).collect();
        let _ = writeln!(out, "\nUnavailable: {}", symbols.join(", "));
    }

    if !layout.review_notes.is_empty() {
        out.push_str("\nStrategy notes\n");
        for (i, note) in layout.review_notes.iter().enumerate() {
            let _ = writeln!(out, "  {}. {}", i + 1, note);
        }
    }

    out
}

fn write_card(out: &mut String, e: &Evaluation, color: bool) {
    let label = signal_label(e);
    let _ = writeln!(
        out,
        "  {:<20} {:>10}  {:>7}  target {} | {}",
        e.instrument.name,
        group_thousands(e.price, 0),
        format!("{}%", signed(e.valuation.upside_display(), 1)),
        group_thousands(e.instrument.target, 0),
        if color {
            signal_style(e.valuation.signal).paint(label).to_string()
        } else {
            label.to_string()
        },
    );
}

fn write_table(out: &mut String, evaluations: &[Evaluation], color: bool) {
    let rows: Vec<[String; 8]> = evaluations.iter().map(row).collect();

    let mut widths = HEADERS.map(|h| h.chars().count());
    for r in &rows {
        for (w, cell) in widths.iter_mut().zip(r.iter()) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let header = HEADERS.map(String::from);
    write_row(out, &header, &widths, None);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let _ = writeln!(out, "{}", rule.join("  "));
    for (e, r) in evaluations.iter().zip(&rows) {
        let style = color.then(|| signal_style(e.valuation.signal));
        write_row(out, r, &widths, style);
    }
}

fn row(e: &Evaluation) -> [String; 8] {
    [
        e.instrument.symbol.clone(),
        e.instrument.name.clone(),
        group_thousands(e.price, 0),
        e.instrument
            .buy_band
            .map(|b| b.to_string())
            .unwrap_or_else(|| "-".into()),
        signal_label(e).to_string(),
        group_thousands(e.instrument.target, 0),
        format!("{:.1}%", e.valuation.upside_display()),
        e.instrument.note.clone(),
    ]
}

fn write_row(out: &mut String, cells: &[String; 8], widths: &[usize; 8], signal: Option<Style>) {
    let mut line = String::new();
    for (i, (cell, width)) in cells.iter().zip(widths).enumerate() {
        let pad = width.saturating_sub(cell.chars().count());
        // Numbers right-aligned, text left-aligned.
        let numeric = matches!(i, 2 | 5 | 6);
        if i > 0 {
            line.push_str("  ");
        }
        let text = match signal {
            Some(style) if i == SIGNAL_COLUMN => style.paint(cell.as_str()).to_string(),
            _ => cell.clone(),
        };
        if numeric {
            line.push_str(&" ".repeat(pad));
            line.push_str(&text);
        } else {
            line.push_str(&text);
            // no trailing padding on the last column
            if i + 1 < cells.len() {
                line.push_str(&" ".repeat(pad));
            }
        }
    }
    out.push_str(line.trim_end());
    out.push('\n');
}

const SIGNAL_COLUMN: usize = 4;

/// Red for the buy zone, orange while waiting for a pullback, grey otherwise.
fn signal_style(signal: Option<Signal>) -> Style {
    match signal {
        Some(Signal::AtIdealBuy) => Color::Red.bold(),
        Some(Signal::WatchPullback) => Color::Fixed(208).bold(),
        Some(Signal::Extended) | None => Color::Fixed(244).bold(),
    }
}

fn signal_label(e: &Evaluation) -> &'static str {
    e.valuation.signal.map(|s| s.label()).unwrap_or("-")
}

/// `1234567.891` with 2 decimals → `1,234,567.89`.
pub fn group_thousands(v: f64, decimals: usize) -> String {
    let raw = format!("{:.*}", decimals, v.abs());
    let (int_part, frac_part) = match raw.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (raw.as_str(), None),
    };

    let mut grouped = String::with_capacity(raw.len() + int_part.len() / 3 + 1);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if let Some(f) = frac_part {
        grouped.push('.');
        grouped.push_str(f);
    }

    let is_zero = raw.chars().all(|c| c == '0' || c == '.');
    if v.is_sign_negative() && !is_zero {
        grouped.insert(0, '-');
    }
    grouped
}

/// Always carries a sign: `+400.00`, `-1.25`.
pub fn signed(v: f64, decimals: usize) -> String {
    let body = group_thousands(v, decimals);
    if body.starts_with('-') {
        body
    } else {
        format!("+{body}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::snapshot::tests::{eval, snapshot};
    use chrono::TimeZone;
    use market::instrument::IndexSpec;
    use market::types::{IndexSummary, Omission};

    fn layout(highlight: &[&str]) -> BoardLayout {
        BoardLayout {
            title: "JP AI Board".into(),
            highlight: highlight.iter().map(|s| s.to_string()).collect(),
            top_n: 2,
            review_notes: vec![],
            tz: chrono_tz::Asia::Tokyo,
            mode: RefreshMode::Static,
            color: false,
        }
    }

    #[test]
    fn groups_thousands() {
        assert_eq!(group_thousands(0.0, 0), "0");
        assert_eq!(group_thousands(999.0, 0), "999");
        assert_eq!(group_thousands(1000.0, 0), "1,000");
        assert_eq!(group_thousands(15500.0, 0), "15,500");
        assert_eq!(group_thousands(1234567.891, 2), "1,234,567.89");
        assert_eq!(group_thousands(-40400.5, 2), "-40,400.50");
        assert_eq!(group_thousands(-0.001, 2), "0.00");
    }

    #[test]
    fn signed_values_always_carry_sign() {
        assert_eq!(signed(400.0, 2), "+400.00");
        assert_eq!(signed(-1.25, 2), "-1.25");
        assert_eq!(signed(58.2, 1), "+58.2");
        assert_eq!(signed(0.0, 1), "+0.0");
    }

    #[test]
    fn renders_all_sections_in_display_timezone() {
        let mut snap = snapshot(vec![
            eval("6857.T", 9800.0, 15500.0, Some((9000.0, 10000.0))),
            eval("9984.T", 12000.0, 16000.0, Some((8500.0, 9500.0))),
            eval("2638.T", 2400.0, 3500.0, None),
        ]);
        snap.refreshed_at = chrono::Utc.with_ymd_and_hms(2026, 1, 5, 6, 0, 0).unwrap();
        snap.indices = vec![IndexSummary {
            index: IndexSpec {
                symbol: "^N225".into(),
                name: "Nikkei 225".into(),
            },
            last: 40_400.0,
            previous_close: 40_000.0,
            change: 400.0,
            change_pct: 1.0,
        }];
        snap.omitted = vec![Omission {
            symbol: "3778.T".into(),
            reason: "http error".into(),
        }];

        let text = render_text(&snap, &layout(&["9984.T"]));

        assert!(text.starts_with("JP AI Board  [2026-01-05 15:00:00 JST]  cycle #1 (scheduled)"));
        assert!(text.contains("Nikkei 225"));
        assert!(text.contains("40,400.00  (+400.00, +1.00%)"));
        assert!(text.contains("Highlights\n  9984.T Corp"));
        assert!(text.contains("Top 2 by upside"));
        assert!(text.contains("9000~10000"));
        assert!(text.contains("BUY ZONE"));
        assert!(text.contains("EXTENDED"));
        assert!(text.contains("58.2%"));
        assert!(text.contains("33.3%"));
        assert!(text.contains("Unavailable: 3778.T"));
    }

    #[test]
    fn table_rows_have_band_placeholder_and_notes() {
        let snap = snapshot(vec![eval("2638.T", 2400.0, 3500.0, None)]);
        let text = render_text(&snap, &layout(&[]));

        let row = text
            .lines()
            .find(|l| l.starts_with("2638.T"))
            .expect("board row");
        assert!(row.contains("2,400"));
        assert!(row.contains("3,500"));
        assert!(row.contains("45.8%"));
        assert!(row.ends_with("2638.T note"));
        assert!(row.contains("  -  "));
    }

    #[test]
    fn header_shows_refresh_mode() {
        let snap = snapshot(vec![eval("A", 100.0, 120.0, None)]);

        let text = render_text(&snap, &layout(&[]));
        assert_eq!(text.lines().nth(1), Some("Static mode: run again to refresh"));

        let live = BoardLayout {
            mode: RefreshMode::Live {
                every: Duration::from_secs(90),
            },
            ..layout(&[])
        };
        let text = render_text(&snap, &live);
        assert_eq!(
            text.lines().nth(1),
            Some("Live monitoring: refreshing every 90s (r = refresh now, q = quit)")
        );
    }

    #[test]
    fn one_shot_trigger_is_named_in_header() {
        let mut snap = snapshot(vec![eval("A", 100.0, 120.0, None)]);
        snap.trigger = crate::board::Trigger::OneShot;

        let text = render_text(&snap, &layout(&[]));
        assert!(text.lines().next().unwrap().ends_with("cycle #1 (one-shot)"));
    }

    #[test]
    fn strategy_notes_are_numbered_after_the_table() {
        let snap = snapshot(vec![eval("A", 100.0, 120.0, None)]);
        let with_notes = BoardLayout {
            review_notes: vec!["Scale in over 3-4 entries.".into(), "Take half at target.".into()],
            ..layout(&[])
        };

        let text = render_text(&snap, &with_notes);
        assert!(text.ends_with(
            "Strategy notes\n  1. Scale in over 3-4 entries.\n  2. Take half at target.\n"
        ));

        let plain = render_text(&snap, &layout(&[]));
        assert!(!plain.contains("Strategy notes"));
    }

    #[test]
    fn signal_column_is_coloured_only_when_enabled() {
        let snap = snapshot(vec![
            eval("6857.T", 9800.0, 15500.0, Some((9000.0, 10000.0))),
            eval("6723.T", 2500.0, 4200.0, Some((2200.0, 2400.0))),
        ]);

        let plain = render_text(&snap, &layout(&[]));
        assert!(!plain.contains('\x1b'));

        let coloured = render_text(&snap, &layout(&[]).with_color(true));
        let buy = Color::Red.bold().paint("BUY ZONE").to_string();
        let wait = Color::Fixed(208).bold().paint("WAIT PULLBACK").to_string();
        assert!(coloured.contains(&buy));
        assert!(coloured.contains(&wait));

        // Padding is measured on the plain label, so columns after SIGNAL still line up.
        let strip = |s: &str| s.replace(&buy, "BUY ZONE").replace(&wait, "WAIT PULLBACK");
        let table = |s: &str| -> Vec<String> {
            s.lines()
                .skip_while(|l| !l.starts_with("CODE"))
                .map(String::from)
                .collect()
        };
        assert_eq!(table(&strip(&coloured)), table(&plain));
    }

    #[test]
    fn empty_board_says_so() {
        let text = render_text(&snapshot(vec![]), &layout(&[]));
        assert!(text.contains("No quotes available this cycle."));
        assert!(!text.contains("Highlights"));
    }
}
