//! `relay` command line
//!
//! Inspects the MCP servers and agent templates described by `relay.toml`.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use relay_agent::{AgentConfig, AgentRegistry, BuiltinServers};
use relay_core::RelayConfig;
use relay_mcp::McpClientManager;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "relay")]
#[command(version)]
#[command(about = "Pooled MCP connections and composable agents")]
struct Args {
    /// Configuration file (defaults to the nearest relay.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Connect to every configured server and list its tools
    Servers,
    /// List the agent types available to the factory
    Agents,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = RelayConfig::load_from(args.config.as_deref())?;
    relay_telemetry::init_telemetry(&config.observability);

    match args.command {
        Command::Servers => list_servers(&config).await,
        Command::Agents => list_agents(&config),
    }
}

async fn list_servers(config: &RelayConfig) -> Result<()> {
    let manager = McpClientManager::new();
    let shutdown_timeout = config.shutdown.timeout();

    let result = async {
        let clients = manager
            .start_from_config(config)
            .await
            .context("Failed to start MCP servers")?;

        for client in clients {
            let tools = client
                .list_tools()
                .await
                .with_context(|| format!("Failed to list tools of '{}'", client.name()))?;

            println!("{} ({})", client.name(), client.url());
            for tool in tools {
                println!("  - {}: {}", tool.name, tool.description);
            }
        }
        Ok::<_, anyhow::Error>(())
    }
    .await;

    manager.stop_all(shutdown_timeout).await;
    result
}

fn list_agents(config: &RelayConfig) -> Result<()> {
    let mut registry = AgentRegistry::with_builtin_templates(&BuiltinServers::default());
    for template in &config.agents {
        registry.register(&template.id, AgentConfig::from_template(template))?;
    }

    for agent_type in registry.list() {
        let template = registry.get(&agent_type)?;
        // Nothing is connected here, so show what each template asks for.
        let servers = match config.agents.iter().find(|t| t.id == agent_type) {
            Some(declared) => declared.servers.join(", "),
            None => template
                .mcp_servers
                .iter()
                .map(|client| client.name())
                .collect::<Vec<_>>()
                .join(", "),
        };
        println!(
            "{:<12} {:<20} max_turns={:<3} servers=[{}]",
            agent_type, template.name, template.max_turns, servers
        );
    }
    Ok(())
}
