// (C) Copyright 2019-2020 Hewlett Packard Enterprise Development LP
//
// End-to-end scenarios mirroring the seed suite: each test builds a small
// tree of build files on disk, runs the full walk -> build -> schedule ->
// emit pipeline over it, and checks the resulting batches/targets.

extern crate bakegraph;

use bakegraph::{build, emit, schedule, walk, Diagnostic, Error};
use tempfile::tempdir;

mod common;
use common::write_file;

#[test]
fn s1_single_linear_chain() {
  let dir = tempdir().unwrap();
  write_file(dir.path(), "Dockerfile", "
    FROM alpine AS a
    FROM a AS b
    FROM b AS c
    FROM c AS d
  ");

  let corpus = walk(dir.path()).unwrap();
  let graph = build(&corpus.stages);
  let batches = schedule(&graph).unwrap();

  assert_eq!(batches, vec![
    vec!["a".to_string()],
    vec!["b".to_string()],
    vec!["c".to_string()],
    vec!["d".to_string()],
  ]);

  let text = emit(&graph, &batches, dir.path());
  assert!(text.contains("target \"a\""));
  assert!(text.contains("target \"d\""));
  assert!(text.contains("group \"group4\""));
}

#[test]
fn s2_diamond() {
  let dir = tempdir().unwrap();
  write_file(dir.path(), "r/Dockerfile", "FROM scratch AS r\n");
  write_file(dir.path(), "l/Dockerfile", "FROM r AS l\n");
  write_file(dir.path(), "m/Dockerfile", "FROM r AS m\n");
  write_file(dir.path(), "j/Dockerfile", "
    FROM l AS j
    COPY --from=m /out /out
  ");

  let corpus = walk(dir.path()).unwrap();
  let graph = build(&corpus.stages);
  let batches = schedule(&graph).unwrap();

  assert_eq!(batches, vec![
    vec!["r".to_string()],
    vec!["l".to_string(), "m".to_string()],
    vec!["j".to_string()],
  ]);
}

#[test]
fn s3_external_base() {
  let dir = tempdir().unwrap();
  write_file(dir.path(), "Dockerfile", "
    FROM ubuntu:plucky AS x
    FROM x AS y
  ");

  let corpus = walk(dir.path()).unwrap();
  let graph = build(&corpus.stages);
  let batches = schedule(&graph).unwrap();

  assert_eq!(graph.internal.keys().cloned().collect::<Vec<_>>(), vec!["x".to_string(), "y".to_string()]);
  assert_eq!(batches, vec![vec!["x".to_string()], vec!["y".to_string()]]);

  let base = graph.external.get("ubuntu").expect("ubuntu classified external");
  assert!(base.dependents.contains("x"));
  assert!(graph.diagnostics.iter().any(|d| matches!(
    d,
    Diagnostic::ExternalReference { name, .. } if name == "ubuntu"
  )));
}

#[test]
fn s4_bind_mount_edge() {
  let dir = tempdir().unwrap();
  write_file(dir.path(), "Dockerfile", "
    FROM alpine AS p
    FROM alpine AS q
    RUN --mount=type=bind,from=p,source=/f,target=/g cp /g /h
  ");

  let corpus = walk(dir.path()).unwrap();
  let graph = build(&corpus.stages);
  assert!(graph.edges.contains(&("p".to_string(), "q".to_string())));

  let batches = schedule(&graph).unwrap();
  let level_of = |alias: &str| batches.iter().position(|b| b.contains(&alias.to_string())).unwrap();
  assert!(level_of("p") < level_of("q"));
}

#[test]
fn s5_cross_file_mismatched_tag() {
  let dir = tempdir().unwrap();
  write_file(dir.path(), "a/Dockerfile", "FROM alpine AS k\n");
  write_file(dir.path(), "b/Dockerfile", "FROM k:prebake AS n\n");

  let corpus = walk(dir.path()).unwrap();
  let graph = build(&corpus.stages);

  assert!(graph.edges.contains(&("k".to_string(), "n".to_string())));
  assert!(graph.diagnostics.iter().any(|d| matches!(
    d,
    Diagnostic::TagMismatch { alias, .. } if alias == "k"
  )));

  let batches = schedule(&graph).unwrap();
  let level_of = |alias: &str| batches.iter().position(|b| b.contains(&alias.to_string())).unwrap();
  assert!(level_of("k") < level_of("n"));
}

#[test]
fn s6_cycle_is_detected_and_fatal() {
  let dir = tempdir().unwrap();
  write_file(dir.path(), "a/Dockerfile", "FROM beta AS alpha\n");
  write_file(dir.path(), "b/Dockerfile", "FROM alpha AS beta\n");

  let corpus = walk(dir.path()).unwrap();
  let graph = build(&corpus.stages);
  let err = schedule(&graph).unwrap_err();

  assert_eq!(err.exit_code(), 2);
  match err {
    Error::CycleDetected { members } => {
      assert_eq!(members, vec!["alpha".to_string(), "beta".to_string()]);
    },
    other => panic!("expected CycleDetected, got {:?}", other)
  }
}
