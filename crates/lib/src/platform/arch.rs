use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// CPU architecture a toolchain produces code for.
///
/// Package resolution compares this against the architecture a package was
/// built for, so a 64-bit toolchain never links a 32-bit import library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Arch {
  X86_64,
  X86,
  Aarch64,
}

impl Arch {
  /// All architectures, used when probing package layouts for mismatches.
  pub const ALL: [Arch; 3] = [Arch::X86_64, Arch::X86, Arch::Aarch64];

  /// Detect the current CPU architecture at runtime
  pub fn current() -> Option<Self> {
    match std::env::consts::ARCH {
      "x86_64" => Some(Self::X86_64),
      "x86" => Some(Self::X86),
      "aarch64" => Some(Self::Aarch64),
      _ => None,
    }
  }

  /// Returns the lowercase string identifier for this architecture
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::X86_64 => "x86_64",
      Self::X86 => "x86",
      Self::Aarch64 => "aarch64",
    }
  }

  /// Directory name Visual C++ packages use under `lib/` (`lib/x64`).
  pub fn msvc_dir(&self) -> &'static str {
    match self {
      Self::X86_64 => "x64",
      Self::X86 => "x86",
      Self::Aarch64 => "arm64",
    }
  }

  /// Target triple MinGW-style packages use as a prefix directory.
  pub fn mingw_triple(&self) -> &'static str {
    match self {
      Self::X86_64 => "x86_64-w64-mingw32",
      Self::X86 => "i686-w64-mingw32",
      Self::Aarch64 => "aarch64-w64-mingw32",
    }
  }
}

impl fmt::Display for Arch {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl FromStr for Arch {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "x86_64" | "x64" | "amd64" => Ok(Self::X86_64),
      "x86" | "i686" | "i386" | "win32" => Ok(Self::X86),
      "aarch64" | "arm64" => Ok(Self::Aarch64),
      other => Err(format!("unknown architecture: {}", other)),
    }
  }
}

/// Returns the current CPU architecture, falling back to x86_64 on unknown hosts.
pub fn host_arch() -> Arch {
  Arch::current().unwrap_or(Arch::X86_64)
}
