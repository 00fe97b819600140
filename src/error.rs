// (C) Copyright 2019-2020 Hewlett Packard Enterprise Development LP

use std::path::PathBuf;

use snafu::Snafu;

/// The closed set of ways a bake-graph resolution can fail.
///
/// Parse-level problems are reported but non-fatal (the offending line is
/// skipped and resolution continues); graph and schedule problems are fatal
/// because any output they'd produce would be unsound.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
  #[snafu(display(
    "{}:{}: {}", file.display(), line, message
  ))]
  ParseError {
    file: PathBuf,
    line: usize,
    message: String
  },

  #[snafu(display(
    "cycle detected among stages: {}", members.join(", ")
  ))]
  CycleDetected {
    members: Vec<String>
  },

  #[snafu(display(
    "could not read {}: {}", path.display(), source
  ))]
  ReadError {
    path: PathBuf,
    source: std::io::Error
  },

  #[snafu(display(
    "could not write {}: {}", path.display(), source
  ))]
  WriteError {
    path: PathBuf,
    source: std::io::Error
  },

  #[snafu(display(
    "could not walk directory {}: {}", root.display(), source
  ))]
  WalkError {
    root: PathBuf,
    source: walkdir::Error
  }
}

/// A bake-graph resolution result.
pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
  /// Maps an error to the exit code the CLI shell reports. These are the
  /// literal codes the invocation surface contracts to (1/2/3), not the
  /// BSD `sysexits.h` conventions an `exitcode`-style crate would suggest:
  /// the contract here is a fixed external interface, not a general-purpose
  /// CLI exit convention, so the mapping is kept as plain constants.
  pub fn exit_code(&self) -> i32 {
    match self {
      Error::ParseError { .. } => 1,
      Error::CycleDetected { .. } => 2,
      Error::ReadError { .. } | Error::WriteError { .. } | Error::WalkError { .. } => 3,
    }
  }
}
