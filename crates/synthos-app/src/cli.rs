//! CLI definitions for the `synthos` binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Run and manage a SynthOS bot fleet.
#[derive(Parser)]
#[command(name = "synthos", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, global = true, env = "SYNTHOS_CONFIG", default_value = "synthos.toml")]
    pub config: PathBuf,

    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Log directive implied by `-v`/`-q`, if either was given.
    pub fn log_override(&self) -> Option<&'static str> {
        match self.verbose {
            0 if self.quiet => Some("error"),
            0 => None,
            1 => Some("info,synthos_core=debug,synthos_infra=debug,synthos=debug"),
            _ => Some("trace"),
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the controller and every enabled tenant, then run until
    /// interrupted.
    Run,

    /// Delete every global command registered for the controller application.
    PurgeCommands {
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_run_with_defaults() {
        let cli = Cli::try_parse_from(["synthos", "run"]).unwrap();
        assert!(matches!(cli.command, Commands::Run));
        assert_eq!(cli.log_override(), None);
    }

    #[test]
    fn test_cli_verbosity_overrides_log_level() {
        let cli = Cli::try_parse_from(["synthos", "-vv", "run"]).unwrap();
        assert_eq!(cli.log_override(), Some("trace"));

        let cli = Cli::try_parse_from(["synthos", "run", "--quiet"]).unwrap();
        assert_eq!(cli.log_override(), Some("error"));
    }

    #[test]
    fn test_cli_purge_commands_flag() {
        let cli =
            Cli::try_parse_from(["synthos", "--config", "/etc/synthos.toml", "purge-commands", "--yes"])
                .unwrap();
        assert_eq!(cli.config, PathBuf::from("/etc/synthos.toml"));
        assert!(matches!(cli.command, Commands::PurgeCommands { yes: true }));
    }
}
