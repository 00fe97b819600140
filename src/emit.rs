// (C) Copyright 2019-2020 Hewlett Packard Enterprise Development LP
//
// Bake Emitter (§4.5): renders a schedule and graph into Docker Buildx
// Bake's HCL configuration format — one `target` block per internal,
// non-anonymous stage, and one `group` block per batch.
//
// Grounded on the deterministic, ordered string-buffer assembly in
// `other_examples/.../fenollp-supergreen__cargo-green-src-md.rs.rs`'s
// `Md::append_blocks`, adapted from a Markdown/TOML blob to bake's HCL
// target/group syntax.

use std::path::Path;

use crate::graph::Graph;
use crate::schedule::Batch;

/// Renders the full bake configuration text for `graph`'s internal nodes,
/// batched per `schedule`. `source_root` is recorded in the header comment
/// relative to the working directory, never as an absolute path, so output
/// doesn't encode the host it was generated on.
pub fn emit(graph: &Graph, schedule: &[Batch], source_root: &Path) -> String {
  let mut out = String::new();

  out.push_str(&format!("# generated by bakegraph from {}\n", source_root.display()));
  out.push_str("# do not edit by hand\n\n");

  let mut aliases: Vec<&String> = graph.internal.keys().collect();
  aliases.sort();

  for alias in aliases {
    let node = &graph.internal[alias];
    let context = node.origin_file.parent()
      .filter(|p| !p.as_os_str().is_empty())
      .map(|p| p.display().to_string())
      .unwrap_or_else(|| ".".to_string());

    out.push_str(&format!("target \"{}\" {{\n", alias));
    out.push_str(&format!("  context = \"{}\"\n", context));
    out.push_str(&format!("  dockerfile = \"{}\"\n", node.origin_file.display()));
    out.push_str(&format!("  target = \"{}\"\n", alias));
    out.push_str("}\n\n");
  }

  for (idx, batch) in schedule.iter().enumerate() {
    out.push_str(&format!("group \"group{}\" {{\n", idx + 1));
    out.push_str("  targets = [");
    let quoted: Vec<String> = batch.iter().map(|a| format!("\"{}\"", a)).collect();
    out.push_str(&quoted.join(", "));
    out.push_str("]\n}\n\n");
  }

  if out.ends_with("\n\n") {
    out.pop();
  }

  out
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::graph;
  use crate::model::Stage;
  use std::path::PathBuf;

  fn stage(alias: &str, base: &str, origin: &str, position: usize) -> Stage {
    Stage {
      alias: alias.to_string(),
      is_synthetic: false,
      base_ref: base.to_string(),
      origin_file: PathBuf::from(origin),
      position,
      edges: Vec::new()
    }
  }

  #[test]
  fn emits_one_target_per_internal_stage_and_one_group_per_batch() {
    let stages = vec![
      stage("a", "alpine", "images/a/Dockerfile", 0),
      stage("b", "a", "images/b/Dockerfile", 0),
    ];
    let g = graph::build(&stages);
    let schedule = crate::schedule::schedule(&g).unwrap();
    let text = emit(&g, &schedule, Path::new("repo"));

    assert!(text.contains("target \"a\" {"));
    assert!(text.contains("context = \"images/a\""));
    assert!(text.contains("dockerfile = \"images/a/Dockerfile\""));
    assert!(text.contains("target \"b\" {"));
    assert!(text.contains("group \"group1\" {\n  targets = [\"a\"]"));
    assert!(text.contains("group \"group2\" {\n  targets = [\"b\"]"));
  }

  #[test]
  fn output_is_deterministic_across_runs() {
    let stages = vec![
      stage("z", "alpine", "Dockerfile", 0),
      stage("a", "alpine", "Dockerfile", 1),
    ];
    let g = graph::build(&stages);
    let schedule = crate::schedule::schedule(&g).unwrap();
    let first = emit(&g, &schedule, Path::new("."));
    let second = emit(&g, &schedule, Path::new("."));
    assert_eq!(first, second);

    // roots land in the same group, lexicographically ordered
    let group_line = first.lines().find(|l| l.contains("targets = [")).unwrap();
    assert_eq!(group_line.trim(), "targets = [\"a\", \"z\"]");
  }

  #[test]
  fn root_level_dockerfile_uses_dot_context() {
    let stages = vec![stage("solo", "alpine", "Dockerfile", 0)];
    let g = graph::build(&stages);
    let schedule = crate::schedule::schedule(&g).unwrap();
    let text = emit(&g, &schedule, Path::new("."));
    assert!(text.contains("context = \".\""));
  }
}
