use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod global;

pub use global::{GlobalFlags, OutputFormat};

/// Top-level CLI parser for the `warden` binary.
#[derive(Debug, Parser)]
#[command(name = "warden", version, about = "Warden - smart contract audit orchestrator")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format: json, raw
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl Cli {
    #[must_use]
    pub const fn global_flags(&self) -> GlobalFlags {
        GlobalFlags {
            format: self.format,
            quiet: self.quiet,
        }
    }
}

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Submit a contract source file and analyze it.
    Submit {
        /// Path to the contract source.
        file: PathBuf,
        /// Owner the audit is recorded under.
        #[arg(long)]
        owner: String,
        /// Use the built-in canned analysis instead of calling the model.
        #[arg(long)]
        offline: bool,
    },
    /// Analyze an audit still in `submitted` state.
    Analyze {
        id: String,
        #[arg(long)]
        offline: bool,
    },
    /// Request external validation of an analyzed audit.
    Validate { id: String },
    /// Show one audit.
    Show { id: String },
    /// List the audits of an owner, newest first.
    List {
        #[arg(long)]
        owner: String,
    },
}

/// How a command needs the model.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ModelMode {
    /// Calls the configured model endpoint.
    Live,
    /// Uses the canned offline reply.
    Offline,
    /// Never calls the model.
    Unused,
}

impl Commands {
    #[must_use]
    pub const fn model_mode(&self) -> ModelMode {
        match self {
            Self::Submit { offline: true, .. } | Self::Analyze { offline: true, .. } => {
                ModelMode::Offline
            }
            Self::Submit { .. } | Self::Analyze { .. } => ModelMode::Live,
            Self::Validate { .. } | Self::Show { .. } | Self::List { .. } => ModelMode::Unused,
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};
    use pretty_assertions::assert_eq;

    use super::{Cli, Commands, ModelMode, OutputFormat};

    #[test]
    fn clap_command_tree_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn submit_parses_file_owner_and_offline() {
        let cli = Cli::try_parse_from([
            "warden", "submit", "Vault.sol", "--owner", "alice", "--offline",
        ])
        .expect("cli should parse");

        match &cli.command {
            Commands::Submit {
                file,
                owner,
                offline,
            } => {
                assert_eq!(file.to_str(), Some("Vault.sol"));
                assert_eq!(owner, "alice");
                assert!(offline);
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert_eq!(cli.command.model_mode(), ModelMode::Offline);
    }

    #[test]
    fn submit_requires_owner() {
        assert!(Cli::try_parse_from(["warden", "submit", "Vault.sol"]).is_err());
    }

    #[test]
    fn global_flags_parse_before_and_after_subcommand() {
        let cli = Cli::try_parse_from(["warden", "--format", "raw", "show", "aud-1", "--verbose"])
            .expect("cli should parse");
        assert_eq!(cli.format, OutputFormat::Raw);
        assert!(cli.verbose);
        assert!(!cli.quiet);
        assert!(matches!(cli.command, Commands::Show { ref id } if id == "aud-1"));
    }

    #[test]
    fn output_format_rejects_invalid_value() {
        let args = ["warden", "--format", "xml", "list", "--owner", "a"];
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn model_mode_per_command() {
        let mode = |args: &[&str]| Cli::try_parse_from(args).unwrap().command.model_mode();
        assert_eq!(mode(&["warden", "analyze", "aud-1"]), ModelMode::Live);
        assert_eq!(mode(&["warden", "analyze", "aud-1", "--offline"]), ModelMode::Offline);
        assert_eq!(mode(&["warden", "validate", "aud-1"]), ModelMode::Unused);
        assert_eq!(mode(&["warden", "list", "--owner", "a"]), ModelMode::Unused);
    }
}
