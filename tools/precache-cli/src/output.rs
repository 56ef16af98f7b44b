//! Terminal output for the CLI.
//!
//! With `--json` only machine-readable documents reach stdout; every human
//! message is suppressed and errors are written to stderr as JSON.

use std::fmt::Display;
use std::time::Duration;

use console::{style, StyledObject};
use indicatif::{ProgressBar, ProgressStyle};
use precache_core::{Request, WorkerState};
use precache_worker::{CacheStatus, FetchOutcome};

/// Where a human-readable line goes.
enum Stream {
    Stdout,
    Stderr,
}

/// Output handler for CLI messages.
#[derive(Clone)]
pub struct Output {
    verbose: bool,
    json: bool,
}

impl Output {
    pub fn new(verbose: bool, json: bool) -> Self {
        Self { verbose, json }
    }

    pub fn is_json(&self) -> bool {
        self.json
    }

    fn emit(&self, stream: Stream, line: impl Display) {
        if self.json {
            return;
        }
        match stream {
            Stream::Stdout => println!("{line}"),
            Stream::Stderr => eprintln!("{line}"),
        }
    }

    fn marked(&self, stream: Stream, mark: StyledObject<&str>, msg: &str) {
        self.emit(stream, format!("{mark} {msg}"));
    }

    pub fn info(&self, msg: &str) {
        self.marked(Stream::Stdout, style("ℹ").blue(), msg);
    }

    pub fn success(&self, msg: &str) {
        self.marked(Stream::Stdout, style("✓").green(), msg);
    }

    pub fn warn(&self, msg: &str) {
        self.marked(Stream::Stderr, style("⚠").yellow(), msg);
    }

    /// Errors are reported in both modes.
    pub fn error(&self, msg: &str) {
        if self.json {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        } else {
            eprintln!("{} {}", style("✗").red(), style(msg).red());
        }
    }

    /// Shown only with `--verbose`.
    pub fn debug(&self, msg: &str) {
        if self.verbose {
            self.emit(Stream::Stderr, style(format!("→ {msg}")).dim());
        }
    }

    pub fn header(&self, title: &str) {
        self.emit(Stream::Stdout, format!("\n{}", style(title).bold().underlined()));
    }

    pub fn step(&self, num: usize, total: usize, msg: &str) {
        self.emit(
            Stream::Stdout,
            format!("{} {msg}", style(format!("[{num}/{total}]")).dim()),
        );
    }

    pub fn kv(&self, key: &str, value: &str) {
        self.emit(Stream::Stdout, format!("  {}: {value}", style(key).dim()));
    }

    pub fn list_item(&self, item: &str) {
        self.emit(Stream::Stdout, format!("  {} {item}", style("•").dim()));
    }

    /// Left-aligned columns padded to `widths`.
    pub fn table_row(&self, cols: &[&str], widths: &[usize]) {
        let padded: Vec<String> = cols
            .iter()
            .zip(widths)
            .map(|(col, &width)| format!("{col:width$}"))
            .collect();
        self.emit(Stream::Stdout, format!("  {}", padded.join("  ")));
    }

    /// One line per answered request: source, status, URL, size and the
    /// cache that answered.
    pub fn outcome(&self, request: &Request, outcome: &FetchOutcome) {
        let mut line = format!(
            "{} {} {} ({})",
            source_badge(outcome.status),
            outcome.response.status,
            request.url(),
            format_bytes(outcome.response.body.len() as u64),
        );
        if let Some(cache) = &outcome.cache_name {
            line.push_str(&format!(" from {cache}"));
        }
        self.emit(Stream::Stdout, line);
    }

    /// Printed regardless of mode.
    pub fn json<T: serde::Serialize>(&self, value: &T) {
        if let Ok(json) = serde_json::to_string_pretty(value) {
            println!("{json}");
        }
    }

    /// Spinner for the install phase; hidden in JSON mode.
    pub fn spinner(&self, msg: &str) -> ProgressBar {
        if self.json {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new_spinner();
        if let Ok(template) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(template);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }
}

/// Colored worker lifecycle state.
pub fn state_badge(state: WorkerState) -> String {
    let label = style(state.as_str());
    match state {
        WorkerState::Active => label.green(),
        WorkerState::Installing | WorkerState::Installed | WorkerState::Activating => {
            label.yellow()
        }
        WorkerState::Redundant => label.red(),
        WorkerState::Uninstalled => label.dim(),
    }
    .to_string()
}

/// Colored response source.
pub fn source_badge(status: CacheStatus) -> String {
    let label = style(status.to_string());
    match status {
        CacheStatus::Hit => label.green().bold(),
        CacheStatus::Miss => label.yellow(),
        CacheStatus::Bypass => label.dim(),
    }
    .to_string()
}

/// Human-readable byte count in binary units.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 3] = ["KB", "MB", "GB"];

    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.2} {}", value, UNITS[unit])
}
