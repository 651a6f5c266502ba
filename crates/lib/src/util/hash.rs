//! Hashing utilities for staleness checks.
//!
//! This module provides:
//! - `ContentHash`: A full 64-character SHA-256 hash
//! - `hash_file()`: Single file hashing
//! - `hash_bytes()`: Arbitrary byte hashing
//! - `file_signature()`: Per-input signature used by the scheduler
//! - `SignatureBuilder`: Combines many signatures into one action signature

use std::fs;
use std::io::{self, Read};
use std::path::Path;
use std::time::UNIX_EPOCH;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A full 64-character SHA256 hash.
///
/// # Format
///
/// The hash is a lowercase hexadecimal string (64 characters).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub String);

impl std::fmt::Display for ContentHash {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// How input files are fingerprinted when deciding staleness.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignatureMode {
  /// SHA-256 of the file contents. Immune to touch-without-change.
  #[default]
  Content,
  /// Modification time (nanoseconds) plus size. Cheaper, but coarser.
  Metadata,
}

impl std::str::FromStr for SignatureMode {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "content" => Ok(Self::Content),
      "metadata" | "mtime" => Ok(Self::Metadata),
      other => Err(format!("unknown signature mode: {}", other)),
    }
  }
}

/// Hash a file's contents.
///
/// Returns the full 64-character SHA256 hash of the file.
pub fn hash_file(path: &Path) -> io::Result<ContentHash> {
  let mut file = fs::File::open(path)?;

  let mut hasher = Sha256::new();
  let mut buffer = [0u8; 8192];

  loop {
    let bytes_read = file.read(&mut buffer)?;
    if bytes_read == 0 {
      break;
    }
    hasher.update(&buffer[..bytes_read]);
  }

  Ok(ContentHash(format!("{:x}", hasher.finalize())))
}

/// Hash arbitrary bytes.
///
/// Returns the full 64-character SHA256 hash.
pub fn hash_bytes(data: &[u8]) -> ContentHash {
  let mut hasher = Sha256::new();
  hasher.update(data);
  ContentHash(format!("{:x}", hasher.finalize()))
}

/// Fingerprint a single file.
///
/// A missing file yields the fixed string `missing`, so an action whose input
/// disappears is stale rather than an error here; the action itself reports
/// the missing file when it runs.
pub fn file_signature(path: &Path, mode: SignatureMode) -> String {
  match mode {
    SignatureMode::Content => match hash_file(path) {
      Ok(hash) => hash.0,
      Err(_) => "missing".to_string(),
    },
    SignatureMode::Metadata => match fs::metadata(path) {
      Ok(meta) => {
        let mtime = meta
          .modified()
          .ok()
          .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
          .map(|d| d.as_nanos())
          .unwrap_or(0);
        format!("{}:{}", mtime, meta.len())
      }
      Err(_) => "missing".to_string(),
    },
  }
}

/// Accumulates labelled parts into a single action signature.
///
/// Every part is length-prefixed, so `("ab", "c")` and `("a", "bc")` never
/// collide.
#[derive(Default)]
pub struct SignatureBuilder {
  hasher: Sha256,
}

impl SignatureBuilder {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn part(&mut self, tag: &str, value: &str) -> &mut Self {
    for field in [tag, value] {
      self.hasher.update((field.len() as u64).to_le_bytes());
      self.hasher.update(field.as_bytes());
    }
    self
  }

  pub fn finish(self) -> ContentHash {
    ContentHash(format!("{:x}", self.hasher.finalize()))
  }
}
