// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::types::Direction;

/// Command-line arguments for `datahook`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "datahook",
    version,
    about = "Decode, encode and watch hex/base64 key-value data files.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Datahook.toml` in the current working directory. A missing
    /// default file is not an error.
    #[arg(long, value_name = "PATH", default_value = "Datahook.toml", global = true)]
    pub config: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `DATAHOOK_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    /// Load + validate config, resolve the data file, print both, and exit.
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Watch the data file and print every decoded document.
    Watch {
        /// Data file path (overrides `[target]`).
        #[arg(long, value_name = "PATH")]
        path: Option<PathBuf>,
    },
    /// Decode the data file once and print the document.
    Decode {
        /// Data file path (overrides `[target]`).
        #[arg(long, value_name = "PATH")]
        path: Option<PathBuf>,

        /// Which chunk sequence to decode.
        #[arg(long, value_name = "DIR", default_value = "out", value_parser = parse_direction)]
        direction: Direction,
    },
    /// Encode a document into the `in-*` half of the data file.
    Encode {
        /// Data file path (overrides `[target]`).
        #[arg(long, value_name = "PATH")]
        path: Option<PathBuf>,

        /// File holding the document, or `-` for stdin.
        #[arg(long, value_name = "FILE")]
        input: String,
    },
}

impl Command {
    pub fn path_override(&self) -> Option<&PathBuf> {
        match self {
            Command::Watch { path } | Command::Decode { path, .. } | Command::Encode { path, .. } => {
                path.as_ref()
            }
        }
    }
}

fn parse_direction(s: &str) -> Result<Direction, String> {
    s.parse()
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_decode_with_direction() {
        let args = CliArgs::try_parse_from([
            "datahook", "decode", "--path", "/tmp/x.dat", "--direction", "in",
        ])
        .unwrap();
        match args.command {
            Command::Decode { path, direction } => {
                assert_eq!(path, Some(PathBuf::from("/tmp/x.dat")));
                assert_eq!(direction, Direction::Inbound);
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert_eq!(args.config, "Datahook.toml");
    }

    #[test]
    fn global_flags_after_subcommand() {
        let args =
            CliArgs::try_parse_from(["datahook", "watch", "--dry-run", "--log-level", "debug"])
                .unwrap();
        assert!(args.dry_run);
        assert!(matches!(args.log_level, Some(LogLevel::Debug)));
        assert!(args.command.path_override().is_none());
    }

    #[test]
    fn encode_requires_input() {
        assert!(CliArgs::try_parse_from(["datahook", "encode"]).is_err());
    }
}
