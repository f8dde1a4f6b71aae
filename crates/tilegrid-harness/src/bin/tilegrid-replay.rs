#![forbid(unsafe_code)]

//! Replay tilegrid scenario files and report their final layout.
//!
//! Parses args manually to keep the binary lean. Log verbosity follows
//! `TILEGRID_LOG` (an `EnvFilter` directive, default `info`).

use std::env;
use std::process;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use tilegrid_harness::replay_file;

const VERSION: &str = env!("CARGO_PKG_VERSION");

const HELP_TEXT: &str = "\
tilegrid-replay: deterministic replay of tilegrid scenarios

USAGE:
    tilegrid-replay [OPTIONS] <SCENARIO.jsonl>...

OPTIONS:
    --verbose, -v        Log every step (same as TILEGRID_LOG=trace)
    --help, -h           Show this help message
    --version, -V        Show version

OUTPUT:
    One line per scenario: path, step count, item count, height, checksum.
    Exit code 1 if any scenario fails.

ENVIRONMENT VARIABLES:
    TILEGRID_LOG         Log filter directive (default: info)";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Opts {
    verbose: bool,
    files: Vec<String>,
}

#[derive(Debug, PartialEq, Eq)]
enum ParseError {
    Help,
    Version,
    MissingScenario,
    UnknownArg(String),
}

impl Opts {
    fn parse() -> Self {
        match Self::parse_from(env::args().skip(1)) {
            Ok(opts) => opts,
            Err(ParseError::Help) => {
                println!("{HELP_TEXT}");
                process::exit(0);
            }
            Err(ParseError::Version) => {
                println!("tilegrid-replay {VERSION}");
                process::exit(0);
            }
            Err(ParseError::MissingScenario) => {
                eprintln!("Error: no scenario files given");
                eprintln!("Run with --help for usage information.");
                process::exit(1);
            }
            Err(ParseError::UnknownArg(arg)) => {
                eprintln!("Unknown argument: {arg}");
                eprintln!("Run with --help for usage information.");
                process::exit(1);
            }
        }
    }

    fn parse_from<I, S>(args: I) -> Result<Self, ParseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut opts = Self::default();
        let mut positional_only = false;
        for arg in args {
            let arg = arg.as_ref();
            if positional_only {
                opts.files.push(arg.to_string());
                continue;
            }
            match arg {
                "--help" | "-h" => return Err(ParseError::Help),
                "--version" | "-V" => return Err(ParseError::Version),
                "--verbose" | "-v" => opts.verbose = true,
                "--" => positional_only = true,
                other if other.starts_with('-') && other != "-" => {
                    return Err(ParseError::UnknownArg(other.to_string()));
                }
                path => opts.files.push(path.to_string()),
            }
        }
        if opts.files.is_empty() {
            return Err(ParseError::MissingScenario);
        }
        Ok(opts)
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("trace")
    } else {
        EnvFilter::try_from_env("TILEGRID_LOG").unwrap_or_else(|_| EnvFilter::new("info"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() {
    let opts = Opts::parse();
    init_logging(opts.verbose);

    let mut failed = 0usize;
    for path in &opts.files {
        match replay_file(path) {
            Ok(summary) => {
                println!(
                    "{path}: ok steps={} items={} height={} checksum={:016x}",
                    summary.steps, summary.items, summary.height, summary.checksum
                );
            }
            Err(err) => {
                failed += 1;
                error!(path = %path, %err, "scenario failed");
                println!("{path}: FAILED {err}");
            }
        }
    }
    info!(scenarios = opts.files.len(), failed, "replay finished");
    if failed > 0 {
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flags_and_files() {
        let opts = Opts::parse_from(["-v", "a.jsonl", "b.jsonl"]).unwrap();
        assert!(opts.verbose);
        assert_eq!(opts.files, vec!["a.jsonl", "b.jsonl"]);
    }

    #[test]
    fn double_dash_ends_flags() {
        let opts = Opts::parse_from(["--", "--odd-name.jsonl"]).unwrap();
        assert_eq!(opts.files, vec!["--odd-name.jsonl"]);
    }

    #[test]
    fn rejects_unknown_and_empty() {
        assert_eq!(
            Opts::parse_from(["--fast", "a.jsonl"]),
            Err(ParseError::UnknownArg("--fast".into()))
        );
        assert_eq!(Opts::parse_from(Vec::<String>::new()), Err(ParseError::MissingScenario));
        assert_eq!(Opts::parse_from(["-h"]), Err(ParseError::Help));
    }
}
