// (C) Copyright 2019-2020 Hewlett Packard Enterprise Development LP
//
// Shared data model (§3): the Stage records the File Parser emits, and the
// edge-kind tag each dependency carries. Stages are immutable once built;
// only the Graph Builder interprets their `edges`/`base_ref` further.

use std::path::PathBuf;

/// How a dependency edge was extracted from a stage's body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
  /// Derived from the stage's own `FROM` clause.
  Base,
  /// A `COPY --from=<ref>` inside the stage body.
  Copy,
  /// A `RUN --mount=type=bind,from=<ref>,...` inside the stage body.
  Mount
}

/// A raw (unresolved) dependency: a reference string together with the
/// directive shape it came from. Resolution against the global alias table
/// happens in the Graph Builder (`crate::graph`), not here — at parse time
/// we don't yet know every alias declared across the whole corpus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEdge {
  pub kind: EdgeKind,
  pub reference: String
}

/// A build unit declared by a stage-introduction line.
///
/// The pair `(origin_file, alias)` is unique within the repository by
/// construction (each file's stages are numbered by `position` and
/// anonymous stages get a synthetic, file-qualified alias); `alias` alone is
/// assumed globally unique across the repository, per §3 — collisions are
/// detected and reported, not prevented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
  /// The local name assigned to this stage: either its `AS` alias, or a
  /// synthetic `<file-basename>#<position>` name for an anonymous stage.
  pub alias: String,

  /// Whether `alias` was synthesized (no `AS` clause) rather than declared.
  /// Synthetic aliases are excluded from emitted bake targets and can never
  /// be the target of another stage's reference, since nothing in a build
  /// file can spell a synthetic name.
  pub is_synthetic: bool,

  /// The image reference this stage derives from, verbatim (may include a
  /// tag).
  pub base_ref: String,

  /// Path of the file that declared this stage.
  pub origin_file: PathBuf,

  /// Zero-based index within `origin_file`'s stage sequence.
  pub position: usize,

  /// Additional stage references this stage consumes beyond its base,
  /// in source order. The base reference itself is not included here; see
  /// `base_ref`.
  pub edges: Vec<RawEdge>
}

impl Stage {
  /// A synthetic alias for an anonymous stage: `<file-basename>#<position>`.
  pub fn synthetic_alias(origin_file: &std::path::Path, position: usize) -> String {
    let basename = origin_file.file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_else(|| origin_file.to_string_lossy().into_owned());

    format!("{}#{}", basename, position)
  }
}
