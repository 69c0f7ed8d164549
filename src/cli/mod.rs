//! CLI module for Switchyard
//!
//! Provides one-shot commands against a freshly built host:
//! - `route`: run one request through the pipeline and router
//! - `transport`: process a raw transport request document
//! - `message`: deliver an agent-to-agent message
//! - `contexts` / `agents` / `status`: inspect the registry

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use switchyard_core::{AgentRequest, Switchyard, TaskMessage, TransportRequest};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub mod host;

/// Switchyard agent orchestration CLI
#[derive(Parser, Debug)]
#[command(name = "switchyard")]
#[command(about = "Context-routed agent orchestration")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Route one task to the agents registered for a context type
    Route {
        /// Context type, e.g. `code_analysis`
        #[arg(long)]
        context_type: String,
        /// Task name, e.g. `analyze`
        #[arg(long)]
        task: String,
        /// Task context as a JSON object
        #[arg(long, default_value = "{}")]
        context: String,
        /// Requesting user
        #[arg(long, default_value = "cli")]
        user: String,
        /// Retry count for transient failures (defaults to the configured value)
        #[arg(long)]
        retries: Option<u32>,
    },
    /// Process a transport request document (`{"contextType", "serializedContext"}`)
    Transport {
        /// Request document as JSON
        request: String,
    },
    /// Send a message to one agent
    Message {
        /// Agent name
        agent: String,
        /// Message payload as JSON
        #[arg(default_value = "{}")]
        payload: String,
    },
    /// List registered context types
    Contexts,
    /// List agents registered for a context type
    Agents {
        /// Context type
        context_type: String,
    },
    /// Show the status of every agent after initialization
    Status,
}

/// Run the CLI command
pub async fn run(cli: Cli) -> Result<()> {
    let Some(command) = cli.command else {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        cmd.print_help()?;
        println!();
        return Ok(());
    };

    let config = crate::loader::load_config()?;
    let switchyard = host::build(config)?;

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling");
            ctrl_c.cancel();
        }
    });

    if let Err(e) = switchyard.initialize_all().await {
        eprint!("{}", switchyard_core::format_error_for_cli(&e));
        bail!("agent initialization failed");
    }

    let outcome = execute(&switchyard, command, &cancel).await;

    if let Err(e) = switchyard.shutdown_all().await {
        warn!(error = %e, "Shutdown incomplete");
    }
    outcome
}

async fn execute(switchyard: &Switchyard, command: Commands, cancel: &CancellationToken) -> Result<()> {
    match command {
        Commands::Route {
            context_type,
            task,
            context,
            user,
            retries,
        } => {
            let context = serde_json::from_str(&context).context("--context is not valid JSON")?;
            let request = AgentRequest::new(context_type, task)
                .with_user(user)
                .with_context(context);
            info!(request_id = %request.request_id(), "Routing request");

            let response = match retries {
                Some(n) => switchyard.process_with_retries(&request, n, cancel).await,
                None => switchyard.process(&request, cancel).await,
            };
            print_json(&response)?;
            if !response.is_success {
                bail!(
                    "request failed ({})",
                    response.error_kind.map_or("unknown", |k| k.as_str())
                );
            }
        }
        Commands::Transport { request } => {
            let request: TransportRequest =
                serde_json::from_str(&request).context("transport request is not valid JSON")?;
            let response = switchyard.handle_transport(&request, cancel).await;
            print_json(&response)?;
            if let Some(body) = response.error_body() {
                bail!("{}: {}", body.error, body.details);
            }
        }
        Commands::Message { agent, payload } => {
            let payload = serde_json::from_str(&payload).context("payload is not valid JSON")?;
            let message = TaskMessage::new("cli", payload);
            match switchyard.send_message(&agent, &message).await {
                Some(response) => print_json(&response)?,
                None => bail!("no agent named '{agent}'"),
            }
        }
        Commands::Contexts => print_json(&switchyard.list_context_types())?,
        Commands::Agents { context_type } => {
            print_json(&switchyard.list_agents_for_context_type(&context_type))?;
        }
        Commands::Status => print_json(&switchyard.status_snapshot())?,
    }
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_route() {
        let cli = Cli::try_parse_from([
            "switchyard",
            "route",
            "--context-type",
            "code_analysis",
            "--task",
            "analyze",
            "--retries",
            "3",
        ])
        .unwrap();

        match cli.command {
            Some(Commands::Route {
                context_type,
                task,
                context,
                user,
                retries,
            }) => {
                assert_eq!(context_type, "code_analysis");
                assert_eq!(task, "analyze");
                assert_eq!(context, "{}");
                assert_eq!(user, "cli");
                assert_eq!(retries, Some(3));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_no_subcommand() {
        let cli = Cli::try_parse_from(["switchyard"]).unwrap();
        assert!(cli.command.is_none());
    }
}
