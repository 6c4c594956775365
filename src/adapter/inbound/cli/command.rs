//! Command-line interface definitions.
//!
//! Defines the CLI structure for the floodgate application using `clap`.
//! The CLI runs the group monitor, lists groups for discovery and manages
//! configuration.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use super::paths;

/// Watch a group and flood it the moment admins open it
#[derive(Parser, Debug)]
#[command(name = "floodgate")]
#[command(version)]
pub struct Cli {
    /// Color output mode [auto, always, never]
    #[arg(
        long,
        global = true,
        default_value = "auto",
        hide_possible_values = true
    )]
    pub color: ColorChoice,

    /// JSON output for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Decrease output verbosity
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase output verbosity
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Color output mode for terminal rendering.
#[derive(Clone, Debug, Default, clap::ValueEnum)]
pub enum ColorChoice {
    /// Detect automatically
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

/// Top-level subcommands for the floodgate CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Watch the target group and burst when it opens (foreground)
    Run(RunArgs),

    /// List the groups this account participates in
    Groups(GroupsArgs),

    /// Initialize configuration interactively
    Init(InitArgs),

    /// Manage configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// Subcommands for `floodgate config`.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Display the effective configuration with defaults applied.
    Show(ConfigPathArg),
    /// Validate a configuration file for correctness.
    Validate(ConfigPathArg),
}

/// Shared argument struct for commands that require only a configuration path.
#[derive(Parser, Debug)]
pub struct ConfigPathArg {
    /// Path to the configuration file.
    #[arg(short, long, default_value_os_t = paths::default_config())]
    pub config: PathBuf,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Path to the configuration file.
    #[arg(short, long, default_value_os_t = paths::default_config())]
    pub config: PathBuf,

    /// Override the target group identifier.
    #[arg(long)]
    pub target: Option<String>,

    /// Override the number of messages per burst.
    #[arg(long)]
    pub count: Option<u32>,

    /// Override the message payload.
    #[arg(long)]
    pub payload: Option<String>,

    /// Override the stagger between messages (milliseconds).
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// Override the attempts per message.
    #[arg(long)]
    pub max_retries: Option<u32>,

    /// Override log level (debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Use JSON log format instead of pretty-printed logs.
    #[arg(long)]
    pub json_logs: bool,

    /// Skip the startup banner.
    #[arg(long)]
    pub no_banner: bool,
}

/// Arguments for the `groups` subcommand.
#[derive(Parser, Debug)]
pub struct GroupsArgs {
    /// Path to the configuration file.
    #[arg(short, long, default_value_os_t = paths::default_config())]
    pub config: PathBuf,

    /// Seconds to wait for the session to open (defaults to the config value).
    #[arg(long)]
    pub timeout: Option<u64>,
}

/// Arguments for the `init` subcommand.
#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Where to write the configuration file.
    #[arg(short, long, default_value_os_t = paths::default_config())]
    pub config: PathBuf,

    /// Overwrite an existing file.
    #[arg(long)]
    pub force: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_command() {
        let cli = Cli::try_parse_from(["floodgate", "run"]).unwrap();
        assert!(matches!(cli.command, Commands::Run(_)));
        assert!(!cli.json);
        assert!(!cli.quiet);
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["floodgate", "run", "--json", "-vv"]).unwrap();
        assert!(cli.json);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_parse_color_never() {
        let cli = Cli::try_parse_from(["floodgate", "--color", "never", "groups"]).unwrap();
        assert!(matches!(cli.color, ColorChoice::Never));
    }

    #[test]
    fn test_run_args_defaults() {
        let cli = Cli::try_parse_from(["floodgate", "run"]).unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("Expected Run command");
        };
        assert!(args.target.is_none());
        assert!(args.count.is_none());
        assert!(args.payload.is_none());
        assert!(!args.json_logs);
        assert!(!args.no_banner);
        assert!(args.config.ends_with("config.toml"));
    }

    #[test]
    fn test_run_args_overrides() {
        let cli = Cli::try_parse_from([
            "floodgate",
            "run",
            "--target",
            "123@g.us",
            "--count",
            "9",
            "--payload",
            "hi",
            "--delay-ms",
            "25",
            "--max-retries",
            "4",
        ])
        .unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("Expected Run command");
        };
        assert_eq!(args.target.as_deref(), Some("123@g.us"));
        assert_eq!(args.count, Some(9));
        assert_eq!(args.payload.as_deref(), Some("hi"));
        assert_eq!(args.delay_ms, Some(25));
        assert_eq!(args.max_retries, Some(4));
    }

    #[test]
    fn test_groups_timeout() {
        let cli = Cli::try_parse_from(["floodgate", "groups", "--timeout", "5"]).unwrap();
        let Commands::Groups(args) = cli.command else {
            panic!("Expected Groups command");
        };
        assert_eq!(args.timeout, Some(5));
    }

    #[test]
    fn test_config_validate_path() {
        let cli =
            Cli::try_parse_from(["floodgate", "config", "validate", "-c", "custom.toml"]).unwrap();
        let Commands::Config(ConfigCommand::Validate(arg)) = cli.command else {
            panic!("Expected config validate");
        };
        assert_eq!(arg.config, PathBuf::from("custom.toml"));
    }

    #[test]
    fn test_negative_count_is_rejected() {
        assert!(Cli::try_parse_from(["floodgate", "run", "--count", "-1"]).is_err());
    }
}
