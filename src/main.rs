use clap::Parser;
use floodgate::adapter::inbound::cli::{self, command::Cli, output};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    output::configure(output::OutputConfig::new(
        cli.json,
        cli.quiet,
        cli.verbose,
        &cli.color,
    ));

    if let Err(e) = cli::dispatch(cli.command).await {
        cli::report_error(&e);
        std::process::exit(1);
    }
}
