//! Handler for the `run` command.

use tracing::{info, warn};

use crate::adapter::inbound::cli::command::RunArgs;
use crate::adapter::inbound::cli::{banner, config, output};
use crate::error::Result;
use crate::infrastructure::bootstrap;
use crate::infrastructure::config::settings::Config;

/// Execute the run command.
pub async fn execute(args: &RunArgs) -> Result<()> {
    let mut config = config::load(&args.config)?;
    apply_overrides(&mut config, args);
    config.validate()?;

    if args.json_logs || output::is_json() {
        config.logging.format = "json".to_string();
    }
    config.init_logging();

    if !args.no_banner && !output::is_json() && !output::is_quiet() {
        banner::print_banner();
    }
    print_startup_config(&config);

    info!("floodgate starting");
    let report = bootstrap::build_monitor(&config)
        .run(shutdown_signal())
        .await;

    output::stats(&report.stats);
    info!(reconnects = report.reconnects, "floodgate stopped");
    report.into_result().map(|_| ())
}

fn apply_overrides(config: &mut Config, args: &RunArgs) {
    if let Some(target) = &args.target {
        config.target_group = target.trim().to_string();
    }
    if let Some(count) = args.count {
        config.burst.count = count;
    }
    if let Some(payload) = &args.payload {
        config.burst.payload = payload.clone();
    }
    if let Some(delay) = args.delay_ms {
        config.burst.inter_action_delay_ms = delay;
    }
    if let Some(retries) = args.max_retries {
        config.burst.max_retries = retries;
    }
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Cannot listen for Ctrl+C; stop the process externally");
        std::future::pending::<()>().await;
    }
}

/// Print the target group and burst shape, plus bridge details with `-v`.
fn print_startup_config(config: &Config) {
    output::header(env!("CARGO_PKG_VERSION"));
    output::field("Target", config.target());
    output::field(
        "Burst",
        format!("{} x {}", config.burst.count, config.burst.payload),
    );
    if output::verbosity() > 0 {
        output::field("Spacing", format!("{}ms", config.burst.inter_action_delay_ms));
        output::field("Attempts", config.burst.max_retries);
        output::field("Bridge", &config.connection.bridge_url);
        output::field("Credentials", config.connection.auth_dir.display());
    }
    output::note("Press Ctrl+C to stop");
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::adapter::inbound::cli::command::{Cli, Commands};

    fn run_args(argv: &[&str]) -> RunArgs {
        let mut full = vec!["floodgate", "run"];
        full.extend_from_slice(argv);
        match Cli::parse_from(full).command {
            Commands::Run(args) => args,
            other => panic!("expected run, got {other:?}"),
        }
    }

    #[test]
    fn overrides_replace_config_values() {
        let mut config = Config::parse_toml("target_group = \"1@g.us\"\n").unwrap();
        let args = run_args(&[
            "--target", " 2@g.us ", "--count", "12", "--payload", "go", "--delay-ms", "4",
            "--max-retries", "6", "--log-level", "debug",
        ]);

        apply_overrides(&mut config, &args);

        assert_eq!(config.target().as_str(), "2@g.us");
        assert_eq!(config.burst.count, 12);
        assert_eq!(config.burst.payload, "go");
        assert_eq!(config.burst.inter_action_delay_ms, 4);
        assert_eq!(config.burst.max_retries, 6);
        assert_eq!(config.logging.level, "debug");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_count_override_fails_validation() {
        let mut config = Config::parse_toml("target_group = \"1@g.us\"\n").unwrap();
        apply_overrides(&mut config, &run_args(&["--count", "0"]));
        assert!(config.validate().is_err());
    }

    #[test]
    fn no_overrides_keep_file_values() {
        let mut config = Config::parse_toml("target_group = \"1@g.us\"\n").unwrap();
        apply_overrides(&mut config, &run_args(&[]));
        assert_eq!(config.burst.count, 5);
        assert_eq!(config.burst.payload, "🔥");
    }
}
