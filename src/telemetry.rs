//! Tracing subscriber setup.
//!
//! Environment knobs:
//! - `RUST_LOG` wins when set; otherwise `AXUM_LOG_LEVEL` (default `debug`)
//!   with sqlx statement logging held at `warn` and request tracing at `info`
//! - `AXUM_SPAN_EVENTS`: `full`, `enter_exit`, anything else means CLOSE only
//! - `FORCE_COLOR`: `1|true|yes` on, `0|false|no` off, else TTY detection

use std::env;

use is_terminal::IsTerminal;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

// ---

/// Install the global subscriber. Call once, before the first log line.
pub fn init_tracing() {
    // ---
    let filter = match env::var("RUST_LOG") {
        Ok(_) => EnvFilter::from_default_env(),
        Err(_) => EnvFilter::new(default_directives(env::var("AXUM_LOG_LEVEL").ok().as_deref())),
    };

    let use_color = force_color(env::var("FORCE_COLOR").ok().as_deref())
        .unwrap_or_else(|| std::io::stdout().is_terminal());

    tracing_subscriber::fmt()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(span_events(env::var("AXUM_SPAN_EVENTS").ok().as_deref()))
        .with_env_filter(filter)
        .with_ansi(use_color)
        .compact()
        .init();
}

fn default_directives(level: Option<&str>) -> String {
    // ---
    let level = match level {
        Some(l @ ("trace" | "debug" | "info" | "warn" | "error")) => l,
        _ => "debug",
    };
    format!("{level},sqlx::query=warn,tower_http=info")
}

fn span_events(mode: Option<&str>) -> FmtSpan {
    match mode {
        Some("full") => FmtSpan::FULL,
        Some("enter_exit") => FmtSpan::ENTER | FmtSpan::EXIT,
        _ => FmtSpan::CLOSE,
    }
}

/// `None` leaves the decision to terminal detection.
fn force_color(raw: Option<&str>) -> Option<bool> {
    match raw {
        Some("1" | "true" | "yes") => Some(true),
        Some("0" | "false" | "no") => Some(false),
        _ => None,
    }
}
