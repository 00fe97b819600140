// (C) Copyright 2019-2020 Hewlett Packard Enterprise Development LP
//
// Invocation surface (§6): a single command taking a root directory.
// Everything beyond argument parsing and exit-code mapping lives in
// `bakegraph::cli::run`, so this stays a thin process boundary.

use std::process::ExitCode;

use clap::Parser;

use bakegraph::{level_filter, run, Args, Config};

fn main() -> ExitCode {
  let args = Args::parse();

  env_logger::Builder::new()
    .filter_level(level_filter(args.verbose))
    .parse_default_env()
    .init();

  let config = Config::from(&args);

  match run(&config) {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      eprintln!("error: {}", err);
      ExitCode::from(err.exit_code() as u8)
    }
  }
}
