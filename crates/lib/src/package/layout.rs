//! Filesystem probing shared by the toolchain-specific package strategies.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::types::PackageError;

/// Find directories in `roots` that can hold package `name`.
///
/// A directory matches when it is named exactly `name` or `name-<version>`
/// with the version starting with a digit (`SDL3-3.2.4`, but not
/// `SDL3_image-3.2.0`). A root whose own file name matches is a candidate too.
/// Results are ordered best first: roots in the order given, and within a
/// root the highest version first, compared numerically per `.` segment.
pub fn candidate_dirs(roots: &[PathBuf], name: &str) -> Vec<PathBuf> {
  let mut out = Vec::new();

  for root in roots {
    if root.file_name().and_then(|n| n.to_str()).is_some_and(|n| matches_name(n, name)) && root.is_dir() {
      out.push(root.clone());
    }

    let mut matched: Vec<(String, PathBuf)> = WalkDir::new(root)
      .min_depth(1)
      .max_depth(1)
      .into_iter()
      .filter_map(Result::ok)
      .filter(|e| e.file_type().is_dir())
      .filter_map(|e| {
        let dir_name = e.file_name().to_str()?.to_string();
        matches_name(&dir_name, name).then(|| (dir_name, e.into_path()))
      })
      .collect();

    matched.sort_by(|(a, _), (b, _)| compare_versions(version_of(b, name), version_of(a, name)));
    out.extend(matched.into_iter().map(|(_, path)| path));
  }

  out
}

fn matches_name(dir_name: &str, name: &str) -> bool {
  if dir_name == name {
    return true;
  }
  dir_name
    .strip_prefix(name)
    .and_then(|rest| rest.strip_prefix('-'))
    .and_then(|version| version.chars().next())
    .is_some_and(|c| c.is_ascii_digit())
}

fn version_of<'a>(dir_name: &'a str, name: &str) -> Option<&'a str> {
  dir_name.strip_prefix(name)?.strip_prefix('-')
}

/// Order versions segment by segment: numerically where both segments are
/// numbers, as strings otherwise. An unversioned directory sorts lowest.
fn compare_versions(a: Option<&str>, b: Option<&str>) -> Ordering {
  let (a, b) = match (a, b) {
    (Some(a), Some(b)) => (a, b),
    (a, b) => return a.is_some().cmp(&b.is_some()),
  };
  let mut left = a.split('.');
  let mut right = b.split('.');
  loop {
    let ord = match (left.next(), right.next()) {
      (None, None) => return a.cmp(b),
      (Some(_), None) => return Ordering::Greater,
      (None, Some(_)) => return Ordering::Less,
      (Some(x), Some(y)) => match (x.parse::<u64>(), y.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        _ => x.cmp(y),
      },
    };
    if ord != Ordering::Equal {
      return ord;
    }
  }
}

/// List regular files directly inside `dir` whose names end with one of `suffixes`.
///
/// Matching is ASCII case-insensitive. A missing directory yields an empty list.
pub fn files_with_suffix(dir: &Path, suffixes: &[&str]) -> Result<Vec<PathBuf>, PackageError> {
  if !dir.is_dir() {
    return Ok(Vec::new());
  }

  let mut out = Vec::new();
  for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
    let entry = entry.map_err(|e| PackageError::Io {
      path: dir.to_path_buf(),
      source: e.into(),
    })?;
    if !entry.file_type().is_file() {
      continue;
    }
    let Some(file_name) = entry.file_name().to_str() else {
      continue;
    };
    let lower = file_name.to_ascii_lowercase();
    if suffixes.iter().any(|s| lower.ends_with(s)) {
      out.push(entry.into_path());
    }
  }
  Ok(out)
}

/// Make a runtime file absolute, failing if it does not exist.
pub fn absolute_runtime_file(package: &str, path: &Path) -> Result<PathBuf, PackageError> {
  dunce::canonicalize(path).map_err(|_| PackageError::MissingRuntimeFile {
    name: package.to_string(),
    path: path.to_path_buf(),
  })
}
