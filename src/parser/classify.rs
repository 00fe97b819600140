// (C) Copyright 2019-2020 Hewlett Packard Enterprise Development LP
//
// Line Classifier: recognizes the three directive shapes that carry
// inter-stage edges (stage introductions, artifact copies, bind mounts) and
// tokenizes each into a structured record. Agnostic to casing and leading
// indentation; comment lines and quoting are handled by the caller (see
// `super::file`) before a logical line ever reaches `classify`.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
  static ref FROM_RE: Regex = Regex::new(
    r"(?i)^from\s+(?P<image>\S+)(?:\s+as\s+(?P<alias>\S+))?\s*$"
  ).unwrap();

  static ref COPY_LEADER_RE: Regex = Regex::new(r"(?i)^copy\b").unwrap();
  static ref RUN_LEADER_RE: Regex = Regex::new(r"(?i)^run\b").unwrap();

  static ref COPY_FROM_RE: Regex = Regex::new(r"--from=(?P<ref>\S+)").unwrap();
  static ref MOUNT_FLAG_RE: Regex = Regex::new(r"--mount=(?P<opts>\S+)").unwrap();
}

/// A stage-introduction directive: `FROM <image> [AS <alias>]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageIntro {
  pub image: String,
  pub alias: Option<String>
}

/// The classification of a single (continuation-stitched, comment-stripped)
/// logical line of build-file source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifiedLine {
  /// `FROM <image> [AS <alias>]`
  StageIntro(StageIntro),

  /// A `COPY` directive carrying one or more `--from=<ref>` flags.
  Copy { froms: Vec<String> },

  /// A `RUN --mount=type=bind,...,from=<ref>,...` directive. Only mount
  /// flags with `type=bind` and a `from=` key contribute a reference; a
  /// cache mount or a bind mount with no `from=` yields an empty vec, which
  /// the caller treats as "recognized, no edge" rather than unrecognized.
  Mount { froms: Vec<String> },

  /// Recognized as directive-shaped but malformed (e.g. `FROM` with no
  /// image). The caller reports this and skips the line.
  Malformed { reason: String }
}

/// Splits a single `--mount=` flag's comma-separated `key=value` options and
/// returns the `from=` value, but only when `type=bind` is also present.
/// BuildKit permits other mount types (`cache`, `secret`, `tmpfs`, ...);
/// those never gate a build ordering since they don't reference another
/// stage's filesystem.
fn bind_mount_from(opts: &str) -> Option<String> {
  let mut is_bind = false;
  let mut from = None;

  for kv in opts.split(',') {
    match kv.split_once('=') {
      Some(("type", "bind")) => is_bind = true,
      Some(("from", value)) => from = Some(value.to_string()),
      _ => {}
    }
  }

  if is_bind {
    from
  } else {
    None
  }
}

/// Classifies one logical (continuation-stitched) line of build-file
/// source. Returns `None` if the line doesn't match any of the three
/// edge-bearing directive shapes — most lines in a Dockerfile (`RUN` with no
/// mount, `ENV`, `LABEL`, blank lines, ...) fall into this bucket and are
/// silently uninteresting to this system.
pub fn classify(line: &str) -> Option<ClassifiedLine> {
  let trimmed = line.trim();

  if trimmed.is_empty() {
    return None;
  }

  if let Some(caps) = FROM_RE.captures(trimmed) {
    let image = caps.name("image").unwrap().as_str().to_string();

    if image.is_empty() {
      return Some(ClassifiedLine::Malformed {
        reason: "FROM requires an image reference".into()
      });
    }

    let alias = caps.name("alias").map(|m| m.as_str().to_string());

    return Some(ClassifiedLine::StageIntro(StageIntro { image, alias }));
  }

  // a line starting with the "from" word but not matching the full pattern
  // (e.g. a dangling `AS` with no alias) is a malformed stage line, not a
  // silently-ignored one
  if trimmed.to_ascii_lowercase().starts_with("from ")
    || trimmed.eq_ignore_ascii_case("from")
  {
    return Some(ClassifiedLine::Malformed {
      reason: format!("malformed FROM directive: {:?}", trimmed)
    });
  }

  if COPY_LEADER_RE.is_match(trimmed) {
    let froms = COPY_FROM_RE.captures_iter(trimmed)
      .map(|c| c.name("ref").unwrap().as_str().to_string())
      .collect();

    return Some(ClassifiedLine::Copy { froms });
  }

  if RUN_LEADER_RE.is_match(trimmed) {
    let froms: Vec<String> = MOUNT_FLAG_RE.captures_iter(trimmed)
      .filter_map(|c| bind_mount_from(c.name("opts").unwrap().as_str()))
      .collect();

    if MOUNT_FLAG_RE.is_match(trimmed) {
      return Some(ClassifiedLine::Mount { froms });
    }
  }

  None
}
