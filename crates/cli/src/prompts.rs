//! Confirmation before `kiln clean` deletes build outputs.

use std::io::{self, BufRead, IsTerminal, Write};
use std::path::Path;

use anyhow::{Result, bail};
use owo_colors::{OwoColorize, Stream};

use crate::output::symbols;

/// Ask whether every recorded output of `backend` may be deleted.
///
/// `force` skips the question. Without a terminal on both stdin and stderr
/// there is nobody to answer, so the command fails instead of guessing.
pub fn confirm_clean(backend: &str, dirs: &[&Path], force: bool) -> Result<bool> {
  if force {
    return Ok(true);
  }
  if !io::stdin().is_terminal() || !io::stderr().is_terminal() {
    bail!("not removing outputs of '{backend}' without confirmation; rerun with `kiln clean --force`");
  }

  let prompt = clean_prompt(backend, dirs);
  ask(&mut io::stdin().lock(), &mut io::stderr(), &prompt)
}

fn clean_prompt(backend: &str, dirs: &[&Path]) -> String {
  let mut prompt = format!(
    "{} Remove every output built by '{backend}'?",
    symbols::WARNING.if_supports_color(Stream::Stderr, |s| s.yellow())
  );
  for dir in dirs {
    prompt.push_str(&format!("\n  {} {}", symbols::ARROW, dir.display()));
  }
  prompt
}

/// Write `prompt` and read one answer line. Only `y`/`yes` agree.
fn ask(input: &mut impl BufRead, output: &mut impl Write, prompt: &str) -> Result<bool> {
  write!(output, "{prompt}\n[y/N] ")?;
  output.flush()?;

  let mut answer = String::new();
  input.read_line(&mut answer)?;
  Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}
