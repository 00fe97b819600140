// (C) Copyright 2019-2020 Hewlett Packard Enterprise Development LP

use std::fs;
use std::path::Path;

/// Writes `content` to `root/relative_path`, creating parent directories as
/// needed — the shared fixture helper every scenario test builds its build
/// tree with.
pub fn write_file(root: &Path, relative_path: &str, content: &str) {
  let path = root.join(relative_path);
  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent).unwrap();
  }
  fs::write(path, content).unwrap();
}
