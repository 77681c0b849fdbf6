use anyhow::{bail, Context, Result};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use super::commands::{Cli, Command};
use crate::alerts::DirectInvocation;
use crate::config::{Config, ConfigLoader};
use crate::initialization::build_trigger_handler;
use crate::logging::setup_logging;
use crate::server::DumpwatchServer;

/// Parses nothing itself: takes the already-parsed command line, loads
/// configuration and logging, then runs the command on a fresh runtime.
pub fn process_command(cli: Cli) -> Result<()> {
    let config = ConfigLoader::load(cli.config.as_deref())?;
    let _log_guard = setup_logging(config.log_format, config.log_dir.as_deref())?;

    tokio::runtime::Runtime::new()
        .context("failed to start tokio runtime")?
        .block_on(run_command(cli.command, config))
}

pub async fn run_command(command: Command, mut config: Config) -> Result<()> {
    match command {
        Command::Serve { server } => {
            if let Some(server) = server {
                config.server = server;
            }
            let handler = build_trigger_handler(&config).await?;
            let server = DumpwatchServer::bind(&config.server, handler).await?;
            server.run(CancellationToken::new()).await
        }
        Command::Invoke { event } => {
            let raw = tokio::fs::read_to_string(&event)
                .await
                .with_context(|| format!("failed to read event file {}", event.display()))?;
            let event: Value = serde_json::from_str(&raw).context("event file is not JSON")?;

            let handler = build_trigger_handler(&config).await?;
            let response = handler.handle_event(event).await;
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        }
        Command::Capture(args) => {
            let invocation = serde_json::to_value(DirectInvocation::from(args))?;

            let handler = build_trigger_handler(&config).await?;
            let response = handler.handle_direct(&invocation).await;
            println!("{}", serde_json::to_string_pretty(&response.body)?);
            if !response.status_code.is_success() {
                bail!("capture failed with status {}", response.status_code);
            }
            Ok(())
        }
    }
}
