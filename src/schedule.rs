// (C) Copyright 2019-2020 Hewlett Packard Enterprise Development LP
//
// Batch Scheduler (§4.4): turns the internal-edge graph into an ordered
// sequence of batches, where every stage in batch `k` depends only on
// stages in batches `0..k`. Within a batch, stages are ordered
// lexicographically by alias so the emitted bake file is reproducible byte
// for byte across runs.
//
// Grounded on the Kahn's-algorithm in-degree peeling in
// `other_examples/.../copyleftdev-oxide-ci__crates-oxide-scheduler-src-dag.rs.rs`'s
// `toposort`, adapted to emit whole levels instead of a single flat order,
// and to report every unresolved member of a cycle rather than the first
// one found.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{self, Error, Result};
use crate::graph::Graph;

/// One level of the schedule: every internal alias in it can be built
/// concurrently, in any order, once every earlier batch has finished.
pub type Batch = Vec<String>;

/// Computes the batched build order for every internal node in `graph`.
/// Synthetic (anonymous) stages are excluded — nothing can reference them,
/// so they carry no ordering constraint. Returns `Error::CycleDetected` if
/// any internal stage participates in a dependency cycle.
pub fn schedule(graph: &Graph) -> Result<Vec<Batch>> {
  let nodes: BTreeSet<&str> = graph.internal.keys().map(|s| s.as_str()).collect();

  let mut in_degree: BTreeMap<&str, usize> = nodes.iter().map(|&n| (n, 0)).collect();
  for (from, to) in &graph.edges {
    if nodes.contains(from.as_str()) && nodes.contains(to.as_str()) {
      *in_degree.get_mut(to.as_str()).unwrap() += 1;
    }
  }

  let mut remaining = in_degree.clone();
  let mut batches = Vec::new();
  let mut scheduled = 0;

  loop {
    let ready: Vec<&str> = remaining.iter()
      .filter(|(_, &deg)| deg == 0)
      .map(|(&n, _)| n)
      .collect();

    if ready.is_empty() {
      break;
    }

    let mut batch: Vec<String> = ready.iter().map(|s| s.to_string()).collect();
    batch.sort();
    scheduled += batch.len();

    for &alias in &ready {
      remaining.remove(alias);
    }

    for (from, to) in &graph.edges {
      if ready.contains(&from.as_str()) {
        if let Some(deg) = remaining.get_mut(to.as_str()) {
          *deg -= 1;
        }
      }
    }

    batches.push(batch);
  }

  if scheduled < nodes.len() {
    let mut members: Vec<String> = remaining.keys().map(|s| s.to_string()).collect();
    members.sort();
    return error::CycleDetectedSnafu { members }.fail();
  }

  Ok(batches)
}
