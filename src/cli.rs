// (C) Copyright 2019-2020 Hewlett Packard Enterprise Development LP
//
// CLI shell (§4.7, AMBIENT): argument parsing and pipeline orchestration.
// The binary at `src/bin/bakegraph.rs` is intentionally a few lines long —
// everything it needs lives here so it stays testable without a process
// boundary.

use std::io::Write as _;
use std::path::{Path, PathBuf};

use clap::Parser;
use log::info;
use snafu::ResultExt;

use crate::error::{self, Result};
use crate::graph::{self, Diagnostic};
use crate::{emit, schedule, walk};

/// Resolves a tree of multi-stage build files into a batched bake
/// configuration.
#[derive(Debug, Parser)]
#[command(name = "bakegraph", version)]
pub struct Args {
  /// Directory to scan for build files.
  pub root: PathBuf,

  /// Path to write the bake configuration to.
  #[arg(long, env = "BAKEGRAPH_OUTPUT", default_value = "docker-bake.hcl")]
  pub output: PathBuf,

  /// Increase logging verbosity (repeatable: -v, -vv).
  #[arg(short, long, action = clap::ArgAction::Count)]
  pub verbose: u8
}

/// The immutable configuration a run is assembled from, once, at startup.
#[derive(Debug, Clone)]
pub struct Config {
  pub root: PathBuf,
  pub output: PathBuf
}

impl From<&Args> for Config {
  fn from(args: &Args) -> Self {
    Config { root: args.root.clone(), output: args.output.clone() }
  }
}

/// Maps `-v`/`-vv` to a `log` level filter, used only when `RUST_LOG` isn't
/// already set — `RUST_LOG` is the more specific per-module knob and wins
/// when present.
pub fn level_filter(verbose: u8) -> log::LevelFilter {
  match verbose {
    0 => log::LevelFilter::Warn,
    1 => log::LevelFilter::Info,
    _ => log::LevelFilter::Debug
  }
}

/// Runs the full pipeline: walk, build the graph, schedule, emit, write.
/// Diagnostics are printed to stderr on success; the caller is responsible
/// for mapping a returned `Error` to a process exit code.
pub fn run(config: &Config) -> Result<()> {
  let corpus = walk::walk(&config.root)?;

  for warning in &corpus.warnings {
    eprintln!("{}:{}: {}", warning.file.display(), warning.line, warning.message);
  }

  let graph = graph::build(&corpus.stages);
  print_diagnostics(&graph.diagnostics);

  let batches = schedule::schedule(&graph)?;
  let text = emit::emit(&graph, &batches, &relative_to_cwd(&config.root));

  write_atomically(&config.output, &text)?;
  info!("wrote {} targets across {} batches to {}", graph.internal.len(), batches.len(), config.output.display());

  Ok(())
}

fn print_diagnostics(diagnostics: &[Diagnostic]) {
  for diagnostic in diagnostics {
    match diagnostic {
      Diagnostic::AliasCollision { alias, first_origin, second_origin } => {
        eprintln!(
          "warning: alias {:?} declared in both {} and {}; treating as one stage",
          alias, first_origin.display(), second_origin.display()
        );
      },
      Diagnostic::TagMismatch { alias, first_tag, conflicting_tag, referenced_from } => {
        eprintln!(
          "warning: {} references {} as {:?} but it was first seen as {:?}",
          referenced_from, alias, conflicting_tag, first_tag
        );
      },
      Diagnostic::ExternalReference { name, kind, tags_seen, dependents } => {
        let kind_label = match kind {
          graph::ExternalKind::ExternalBase => "external-base",
          graph::ExternalKind::ExternalDep => "external-dep"
        };
        let tags: Vec<String> = tags_seen.iter()
          .map(|t| t.clone().unwrap_or_else(|| "untagged".to_string()))
          .collect();
        eprintln!(
          "{} ({}, tags seen: {}): depended on by {}",
          name, kind_label, tags.join(", "), dependents.join(", ")
        );
      }
    }
  }
}

/// Expresses `root` relative to the current working directory when possible,
/// so the bake file's header (§6) never bakes in a host-specific absolute
/// path just because the caller happened to invoke `bakegraph` with one.
/// Falls back to `root` unchanged if the working directory can't be read.
fn relative_to_cwd(root: &Path) -> PathBuf {
  if root.is_relative() {
    return root.to_path_buf();
  }

  let cwd = match std::env::current_dir() {
    Ok(cwd) => cwd,
    Err(_) => return root.to_path_buf()
  };

  let root_components: Vec<_> = root.components().collect();
  let cwd_components: Vec<_> = cwd.components().collect();

  let common = root_components.iter().zip(cwd_components.iter())
    .take_while(|(a, b)| a == b)
    .count();

  let mut relative = PathBuf::new();
  for _ in common..cwd_components.len() {
    relative.push("..");
  }
  for component in &root_components[common..] {
    relative.push(component.as_os_str());
  }

  if relative.as_os_str().is_empty() {
    PathBuf::from(".")
  } else {
    relative
  }
}

/// Writes `content` to a temp file beside `path` and renames it into place,
/// so a crash mid-write never leaves a partial bake file (§5).
fn write_atomically(path: &Path, content: &str) -> Result<()> {
  let parent = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or_else(|| Path::new("."));
  let mut tmp = tempfile::NamedTempFile::new_in(parent)
    .context(error::WriteSnafu { path: path.to_path_buf() })?;

  tmp.write_all(content.as_bytes()).context(error::WriteSnafu { path: path.to_path_buf() })?;
  tmp.persist(path).map_err(|e| e.error).context(error::WriteSnafu { path: path.to_path_buf() })?;

  Ok(())
}
