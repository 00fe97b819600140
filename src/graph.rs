// (C) Copyright 2019-2020 Hewlett Packard Enterprise Development LP
//
// Graph Builder (§4.3): merges per-file parse results into one global
// graph. Resolves each base/edge reference against locally declared stage
// names, classifies unresolved references as external, and records source
// provenance for every internal node.
//
// Grounded on the teacher's `Stages::new`/`get_by_name` resolution
// (`src/stage.rs`, now removed from this tree), generalized from "one
// file's stage list" to "every file's stage list merged."

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::PathBuf;

use crate::image::ImageRef;
use crate::model::{EdgeKind, Stage};

/// An internal stage node: the provenance the Bake Emitter needs to render
/// a target, plus whether it's targetable at all (non-synthetic).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InternalNode {
  pub alias: String,
  pub origin_file: PathBuf,
  pub position: usize,
  pub is_synthetic: bool
}

/// Whether an external node was only ever a `FROM` target (so the build
/// driver pulls it as a base image) or was also consumed as a build
/// artifact via `COPY --from=`/`RUN --mount=...,from=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExternalKind {
  ExternalBase,
  ExternalDep
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalNode {
  pub name: String,
  pub kind: ExternalKind,
  pub tags_seen: BTreeSet<Option<String>>,
  pub dependents: BTreeSet<String>
}

/// A non-fatal observation surfaced after a successful run (§1 AMBIENT,
/// §7 `AliasCollision`/`UnresolvedInternal`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
  AliasCollision { alias: String, first_origin: PathBuf, second_origin: PathBuf },
  TagMismatch { alias: String, first_tag: Option<String>, conflicting_tag: Option<String>, referenced_from: String },
  ExternalReference { name: String, kind: ExternalKind, tags_seen: Vec<Option<String>>, dependents: Vec<String> }
}

/// The global directed stage graph: classified nodes and deduplicated
/// internal-to-internal edges.
#[derive(Debug, Clone, Default)]
pub struct Graph {
  pub internal: BTreeMap<String, InternalNode>,
  pub external: BTreeMap<String, ExternalNode>,
  /// `(from_alias, to_alias)`, both internal; `to_alias` must build after
  /// `from_alias`.
  pub edges: BTreeSet<(String, String)>,
  pub diagnostics: Vec<Diagnostic>
}

impl Graph {
  /// All internal predecessors of `alias` (the other end of edges
  /// targeting it).
  pub fn predecessors(&self, alias: &str) -> impl Iterator<Item = &str> {
    self.edges.iter()
      .filter(move |(_, to)| to == alias)
      .map(|(from, _)| from.as_str())
  }
}

/// Builds the global graph from every stage parsed across the corpus.
/// Stages are processed in `(origin_file, position)` order regardless of
/// the order they're passed in, so the resulting diagnostics (which record
/// "first" vs. "second" occurrences) are reproducible.
pub fn build(stages: &[Stage]) -> Graph {
  let mut sorted: Vec<&Stage> = stages.iter().collect();
  sorted.sort_by(|a, b| a.origin_file.cmp(&b.origin_file).then(a.position.cmp(&b.position)));

  let mut graph = Graph::default();
  let mut alias_set: HashSet<String> = HashSet::new();

  // pass 1: register non-synthetic aliases, first declaration wins,
  // later ones become AliasCollision diagnostics
  for stage in &sorted {
    if stage.is_synthetic {
      continue;
    }

    if let Some(existing) = graph.internal.get(&stage.alias) {
      graph.diagnostics.push(Diagnostic::AliasCollision {
        alias: stage.alias.clone(),
        first_origin: existing.origin_file.clone(),
        second_origin: stage.origin_file.clone()
      });
      continue;
    }

    alias_set.insert(stage.alias.clone());
    graph.internal.insert(stage.alias.clone(), InternalNode {
      alias: stage.alias.clone(),
      origin_file: stage.origin_file.clone(),
      position: stage.position,
      is_synthetic: false
    });
  }

  let mut external_all_base: HashMap<String, bool> = HashMap::new();

  let mut resolve = |graph: &mut Graph, to_alias: &str, kind: EdgeKind, reference: &str| {
    let image = ImageRef::parse(reference);
    let name = image.name_without_tag();

    if image.could_be_local() && alias_set.contains(&name) {
      // an alias is a bare `AS <name>` identifier with no tag of its own
      // (§3 ImageRef), so its "own declared tag" is always `None` — any
      // tagged reference to it is already a mismatch, not just a second
      // conflicting one.
      if let Some(tag) = &image.tag {
        graph.diagnostics.push(Diagnostic::TagMismatch {
          alias: name.clone(),
          first_tag: None,
          conflicting_tag: Some(tag.clone()),
          referenced_from: to_alias.to_string()
        });
      }

      // self-loops: a stage referencing its own alias, e.g. a pathological
      // `FROM build AS build`
      if name != to_alias {
        graph.edges.insert((name, to_alias.to_string()));
      }
    } else {
      let is_base = matches!(kind, EdgeKind::Base);
      let entry = external_all_base.entry(name.clone()).or_insert(true);
      *entry = *entry && is_base;

      let node = graph.external.entry(name.clone()).or_insert_with(|| ExternalNode {
        name: name.clone(),
        kind: ExternalKind::ExternalBase,
        tags_seen: BTreeSet::new(),
        dependents: BTreeSet::new()
      });
      node.tags_seen.insert(image.tag.clone());
      node.dependents.insert(to_alias.to_string());
    }
  };

  // pass 2: resolve every edge (base ref + explicit copy/mount edges) for
  // every stage, including colliding duplicates — their dependencies still
  // gate the one collapsed internal node (see DESIGN.md)
  for stage in &sorted {
    // an anonymous stage can never be the target of another reference, but
    // its own base/copy/mount edges still resolve normally under its
    // synthetic alias, so external-base diagnostics are surfaced either way.
    let to_alias = stage.alias.as_str();

    resolve(&mut graph, to_alias, EdgeKind::Base, &stage.base_ref);

    for edge in &stage.edges {
      resolve(&mut graph, to_alias, edge.kind, &edge.reference);
    }
  }

  // finalize external classification now that every occurrence has been
  // seen
  for (name, node) in graph.external.iter_mut() {
    let all_base = external_all_base.get(name).copied().unwrap_or(true);
    node.kind = if all_base { ExternalKind::ExternalBase } else { ExternalKind::ExternalDep };
  }

  for node in graph.external.values() {
    graph.diagnostics.push(Diagnostic::ExternalReference {
      name: node.name.clone(),
      kind: node.kind,
      tags_seen: node.tags_seen.iter().cloned().collect(),
      dependents: node.dependents.iter().cloned().collect()
    });
  }

  graph
}
