//! CLI output formatting utilities.
//!
//! Colored status lines, duration formatting and the symbols used to mark
//! actions in build and plan listings.

use std::time::Duration;

use anyhow::Context;
use owo_colors::{OwoColorize, Stream};

use kiln_lib::action::ActionKind;

pub mod symbols {
  pub const SUCCESS: &str = "✓";
  pub const ERROR: &str = "✗";
  pub const WARNING: &str = "⚠";
  pub const INFO: &str = "•";
  pub const ARROW: &str = "→";
  pub const STALE: &str = "+";
  pub const FRESH: &str = "=";
}

/// Fixed-width action kind, so labels line up in listings.
pub fn kind_column(kind: ActionKind) -> String {
  format!("{:<7}", kind.as_str())
}

pub fn format_duration(duration: Duration) -> String {
  let secs = duration.as_secs();
  let millis = duration.subsec_millis();

  if secs >= 60 {
    let mins = secs / 60;
    let remaining_secs = secs % 60;
    format!("{}m {}s", mins, remaining_secs)
  } else if secs > 0 {
    format!("{}.{:02}s", secs, millis / 10)
  } else {
    format!("{}ms", millis)
  }
}

pub fn print_success(message: &str) {
  println!(
    "{} {}",
    symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()),
    message
  );
}

pub fn print_error(message: &str) {
  eprintln!(
    "{} {}",
    symbols::ERROR.if_supports_color(Stream::Stderr, |s| s.red()),
    message.if_supports_color(Stream::Stderr, |s| s.red())
  );
}

pub fn print_warning(message: &str) {
  eprintln!(
    "{} {}",
    symbols::WARNING.if_supports_color(Stream::Stderr, |s| s.yellow()),
    message.if_supports_color(Stream::Stderr, |s| s.yellow())
  );
}

pub fn print_info(message: &str) {
  println!(
    "{} {}",
    symbols::INFO.if_supports_color(Stream::Stdout, |s| s.blue()),
    message
  );
}

pub fn print_stat(label: &str, value: &str) {
  println!(
    "  {}: {}",
    label.if_supports_color(Stream::Stdout, |s| s.dimmed()),
    value
  );
}

/// One action row: `  + compile engine::game.o  (note)`.
pub fn print_action(symbol: &str, kind: ActionKind, label: &str, note: &str) {
  println!(
    "  {} {} {} {}",
    symbol.if_supports_color(Stream::Stdout, |s| s.bold()),
    kind_column(kind),
    label,
    format!("({note})").if_supports_color(Stream::Stdout, |s| s.dimmed())
  );
}

/// Indented diagnostics under a failed action.
pub fn print_diagnostics(text: &str) {
  for line in text.lines() {
    eprintln!("    {}", line.if_supports_color(Stream::Stderr, |s| s.dimmed()));
  }
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(value).context("Failed to serialize to JSON")?;
  println!("{}", json);
  Ok(())
}
