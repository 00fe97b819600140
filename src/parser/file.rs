// (C) Copyright 2019-2020 Hewlett Packard Enterprise Development LP
//
// File Parser (§4.2): consumes one build file and yields the ordered list
// of stages it defines. Line-continuation stitching and comment skipping
// happen here, ahead of the Line Classifier, which only ever sees complete,
// non-comment logical lines.

use std::path::{Path, PathBuf};

use crate::model::{EdgeKind, RawEdge, Stage};
use crate::parser::classify::{classify, ClassifiedLine};

/// A non-fatal problem noticed while parsing one file: a malformed
/// directive. The offending line is skipped and parsing continues (§7
/// `ParseError` is reported, not propagated as a hard failure).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseWarning {
  pub file: PathBuf,
  pub line: usize,
  pub message: String
}

/// The result of parsing one file: its stages, in declaration order, plus
/// any malformed-line warnings encountered along the way.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FileParse {
  pub stages: Vec<Stage>,
  pub warnings: Vec<ParseWarning>
}

/// Joins escaped line continuations (a trailing `\`) into logical lines,
/// yielding `(starting_line_number, logical_line)` pairs. Line numbers are
/// 1-based and refer to the first physical line of each logical line, which
/// is what a human fixing a malformed directive would want to see.
fn stitch_continuations(content: &str) -> Vec<(usize, String)> {
  let mut logical = Vec::new();
  let mut current = String::new();
  let mut current_start = 1;
  let mut in_continuation = false;

  for (idx, raw_line) in content.lines().enumerate() {
    let line_no = idx + 1;

    if !in_continuation {
      current_start = line_no;
    }

    let trimmed_end = raw_line.trim_end();
    if let Some(stripped) = trimmed_end.strip_suffix('\\') {
      if !current.is_empty() {
        current.push(' ');
      }
      current.push_str(stripped.trim_end());
      in_continuation = true;
    } else {
      if !current.is_empty() {
        current.push(' ');
      }
      current.push_str(trimmed_end);
      logical.push((current_start, std::mem::take(&mut current)));
      in_continuation = false;
    }
  }

  if !current.is_empty() {
    logical.push((current_start, current));
  }

  logical
}

/// A logical line is a comment if its first non-whitespace character is
/// `#`. Comment lines are skipped entirely, including any `FROM ... AS ...`
/// they might otherwise appear to contain — this is a known, documented
/// limitation (see DESIGN.md).
fn is_comment(line: &str) -> bool {
  line.trim_start().starts_with('#')
}

/// Parses one build file's contents into its ordered stage list.
pub fn parse_file(path: &Path, content: &str) -> FileParse {
  let mut stages = Vec::new();
  let mut warnings = Vec::new();
  let mut current: Option<Stage> = None;

  for (line_no, logical) in stitch_continuations(content) {
    if logical.trim().is_empty() || is_comment(&logical) {
      continue;
    }

    match classify(&logical) {
      Some(ClassifiedLine::StageIntro(intro)) => {
        if let Some(stage) = current.take() {
          stages.push(stage);
        }

        let position = stages.len();
        let (alias, is_synthetic) = match intro.alias {
          Some(alias) => (alias, false),
          None => (Stage::synthetic_alias(path, position), true)
        };

        current = Some(Stage {
          alias,
          is_synthetic,
          base_ref: intro.image,
          origin_file: path.to_path_buf(),
          position,
          edges: Vec::new()
        });
      },

      Some(ClassifiedLine::Copy { froms }) => {
        if let Some(stage) = current.as_mut() {
          stage.edges.extend(froms.into_iter().map(|reference| RawEdge {
            kind: EdgeKind::Copy,
            reference
          }));
        }
      },

      Some(ClassifiedLine::Mount { froms }) => {
        if let Some(stage) = current.as_mut() {
          stage.edges.extend(froms.into_iter().map(|reference| RawEdge {
            kind: EdgeKind::Mount,
            reference
          }));
        }
      },

      Some(ClassifiedLine::Malformed { reason }) => {
        warnings.push(ParseWarning { file: path.to_path_buf(), line: line_no, message: reason });
      },

      None => {}
    }
  }

  if let Some(stage) = current.take() {
    stages.push(stage);
  }

  FileParse { stages, warnings }
}

#[cfg(test)]
mod tests {
  use super::*;
  use indoc::indoc;

  fn stage_aliases(parse: &FileParse) -> Vec<&str> {
    parse.stages.iter().map(|s| s.alias.as_str()).collect()
  }

  #[test]
  fn parses_linear_chain_single_file() {
    let content = indoc! {r#"
      FROM alpine AS a
      FROM a AS b
      FROM b AS c
      FROM c AS d
    "#};

    let parse = parse_file(Path::new("Dockerfile"), content);
    assert!(parse.warnings.is_empty());
    assert_eq!(stage_aliases(&parse), vec!["a", "b", "c", "d"]);
    assert_eq!(parse.stages[1].base_ref, "a");
  }

  #[test]
  fn anonymous_stage_gets_synthetic_alias() {
    let content = indoc! {r#"
      FROM alpine
      FROM scratch AS named
    "#};

    let parse = parse_file(Path::new("dir/Dockerfile"), content);
    assert_eq!(parse.stages[0].alias, "Dockerfile#0");
    assert!(parse.stages[0].is_synthetic);
    assert_eq!(parse.stages[1].alias, "named");
    assert!(!parse.stages[1].is_synthetic);
  }

  #[test]
  fn copy_and_mount_attach_to_current_stage() {
    let content = indoc! {r#"
      FROM alpine AS build
      COPY --from=deps /out /out
      RUN --mount=type=bind,from=cache,source=/c,target=/c echo hi
    "#};

    let parse = parse_file(Path::new("Dockerfile"), content);
    let build = &parse.stages[0];
    assert_eq!(build.edges.len(), 2);
    assert_eq!(build.edges[0], RawEdge { kind: EdgeKind::Copy, reference: "deps".into() });
    assert_eq!(build.edges[1], RawEdge { kind: EdgeKind::Mount, reference: "cache".into() });
  }

  #[test]
  fn edges_before_any_stage_are_dropped() {
    let content = indoc! {r#"
      COPY --from=nothing /a /b
      FROM alpine AS only
    "#};

    let parse = parse_file(Path::new("Dockerfile"), content);
    assert_eq!(parse.stages.len(), 1);
    assert!(parse.stages[0].edges.is_empty());
  }

  #[test]
  fn comments_are_skipped_entirely() {
    let content = indoc! {r#"
      # FROM alpine AS fake
      FROM alpine AS real
    "#};

    let parse = parse_file(Path::new("Dockerfile"), content);
    assert_eq!(stage_aliases(&parse), vec!["real"]);
  }

  #[test]
  fn line_continuation_is_stitched_before_classification() {
    let content = "FROM alpine \\\n  AS build\nCOPY --from=x \\\n  /a /b\n";

    let parse = parse_file(Path::new("Dockerfile"), content);
    assert_eq!(parse.stages.len(), 1);
    assert_eq!(parse.stages[0].alias, "build");
    assert_eq!(parse.stages[0].edges[0].reference, "x");
  }

  #[test]
  fn malformed_from_is_reported_and_skipped() {
    let content = indoc! {r#"
      FROM
      FROM alpine AS build
    "#};

    let parse = parse_file(Path::new("Dockerfile"), content);
    assert_eq!(parse.warnings.len(), 1);
    assert_eq!(parse.warnings[0].line, 1);
    assert_eq!(stage_aliases(&parse), vec!["build"]);
  }
}
