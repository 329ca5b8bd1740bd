// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `minibuild`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "minibuild",
    version,
    about = "Build a mini-program project from declarative pipelines, and rebuild on change.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Minibuild.toml` in the current working directory; built-in
    /// defaults are used when that file does not exist.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `MINIBUILD_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Validate the config, print the build graph and tasks, run nothing.
    #[arg(long)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Run the build graph once and exit.
    Build,
    /// Run the build graph, then rebuild affected parts on every change.
    #[default]
    Watch,
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
    fn defaults_to_watch() {
        let args = CliArgs::parse_from(["minibuild"]);
        assert_eq!(args.command.unwrap_or_default(), Command::Watch);
        assert!(args.config.is_none());
    }

    #[test]
    fn parses_build_with_flags() {
        let args = CliArgs::parse_from([
            "minibuild",
            "--config",
            "app/Minibuild.toml",
            "--dry-run",
            "--log-level",
            "debug",
            "build",
        ]);
        assert_eq!(args.command, Some(Command::Build));
        assert_eq!(args.config.as_deref(), Some("app/Minibuild.toml"));
        assert!(args.dry_run);
        assert!(matches!(args.log_level, Some(LogLevel::Debug)));
    }
}
