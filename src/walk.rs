// (C) Copyright 2019-2020 Hewlett Packard Enterprise Development LP
//
// Directory Walker (§4.6, AMBIENT): deterministically discovers candidate
// build files under a root directory and hands their contents to the File
// Parser. A file only joins the corpus if the parser finds at least one
// stage declaration in it — everything else is silently irrelevant.
//
// Grounded on the `walkdir::WalkDir` + `regex`/`lazy_static` + `snafu`
// idiom in `other_examples/.../bcressey-twoliter__tools-buildsys-src-builder.rs.rs`,
// here minus the regex (file selection is "does it parse to ≥1 stage", not
// a name/extension filter).

use std::path::Path;

use log::warn;
use snafu::ResultExt;
use walkdir::WalkDir;

use crate::error::{self, Result};
use crate::model::Stage;
use crate::parser::{parse_file, ParseWarning};

/// The merged result of walking and parsing every build file under a root:
/// every stage declared anywhere in the tree, plus every malformed-line
/// warning encountered along the way. Both are already in deterministic
/// order, since the walk itself is path-sorted and each file's stages are
/// parsed in source order.
pub struct Corpus {
  pub stages: Vec<Stage>,
  pub warnings: Vec<ParseWarning>
}

/// Walks `root`, reading and parsing every regular file it finds (skipping
/// `.git` and other dot-directories, matching this corpus's convention of
/// ignoring VCS metadata during tree walks). Per-file read errors are
/// logged and the file is skipped; only a failure to walk the root itself
/// is fatal.
pub fn walk(root: &Path) -> Result<Corpus> {
  let mut stages = Vec::new();
  let mut warnings = Vec::new();

  let mut entries: Vec<walkdir::DirEntry> = Vec::new();
  for entry in WalkDir::new(root).into_iter().filter_entry(|e| !is_hidden(e)) {
    let entry = entry.context(error::WalkSnafu { root: root.to_path_buf() })?;
    entries.push(entry);
  }
  entries.sort_by(|a, b| a.path().cmp(b.path()));

  for entry in entries {
    if !entry.file_type().is_file() {
      continue;
    }

    let path = entry.path();
    let content = match std::fs::read(path) {
      Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
      Err(err) => {
        warn!("skipping {}: {}", path.display(), err);
        continue;
      }
    };

    let relative = path.strip_prefix(root).unwrap_or(path);
    let parse = parse_file(relative, &content);

    if parse.stages.is_empty() {
      continue;
    }

    stages.extend(parse.stages);
    warnings.extend(parse.warnings);
  }

  Ok(Corpus { stages, warnings })
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
  entry.depth() > 0
    && entry.file_name()
      .to_str()
      .map(|name| name.starts_with('.'))
      .unwrap_or(false)
}
