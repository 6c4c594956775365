//! Handler for the `groups` command.

use std::time::Duration;

use crate::adapter::inbound::cli::command::GroupsArgs;
use crate::adapter::inbound::cli::{config, output};
use crate::application::diagnostic;
use crate::error::Result;
use crate::infrastructure::bootstrap;

/// Execute the groups command.
pub async fn execute(args: &GroupsArgs) -> Result<()> {
    let config = config::load_without_target(&args.config)?;
    if output::verbosity() > 0 {
        config.init_logging();
    }

    let handshake = args
        .timeout
        .map_or_else(|| config.connection.handshake_timeout(), Duration::from_secs);

    let mut session = bootstrap::build_session(&config);
    let groups = diagnostic::list_groups(&mut session, handshake).await?;

    output::section("Groups");
    if groups.is_empty() {
        output::note("This account is not in any groups.");
        return Ok(());
    }
    for group in &groups {
        output::group(group);
    }

    if !output::is_json() {
        let current = config.target();
        if !current.as_str().is_empty() && !groups.iter().any(|g| g.id == current) {
            output::warning(&format!(
                "target_group {current} is not among these groups"
            ));
        }
        output::note("Copy an identifier into target_group in your config.");
    }
    Ok(())
}
