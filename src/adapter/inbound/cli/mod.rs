//! CLI module graph and command dispatch.

pub mod banner;
pub mod command;
pub mod config;
pub mod diagnostic;
pub mod groups;
pub mod init;
pub mod output;
pub mod paths;
pub mod run;

use command::{Commands, ConfigCommand};

use crate::error::{Error, Result};

/// Run one parsed subcommand.
pub async fn dispatch(command: Commands) -> Result<()> {
    match command {
        Commands::Run(args) => run::execute(&args).await,
        Commands::Groups(args) => groups::execute(&args).await,
        Commands::Init(args) => init::execute(&args.config, args.force),
        Commands::Config(ConfigCommand::Show(arg)) => config::execute_show(&arg.config),
        Commands::Config(ConfigCommand::Validate(arg)) => config::execute_validate(&arg.config),
    }
}

/// Print a failed command's error with its remediation.
pub fn report_error(err: &Error) {
    if output::is_json() {
        output::error(&err.to_string());
        if let Some(help) = err.remediation() {
            output::hint(help);
        }
        return;
    }
    let diagnostic = diagnostic::FatalDiagnostic::from(err);
    eprintln!("{:?}", miette::Report::new(diagnostic));
}
