//! CloudPanel CLI - Main Entry Point
//!
//! Drives the CloudPanel client from the terminal: virtual machines, service
//! offerings, the signed-in session and the contact form.

use anyhow::Context;
use clap::{Parser, Subcommand};
use cloudpanel_client::Panel;
use cloudpanel_common::{default_config_path, ClientConfig};
use std::path::PathBuf;
use std::sync::Arc;

mod commands;
mod output;

use commands::{auth, contact, service, vm};
use output::TerminalNotifier;

/// CloudPanel CLI - VM and service control panel
#[derive(Parser)]
#[command(name = "cloudpanel")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// API base URL (overrides config file and CLOUDPANEL_API_BASE_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage virtual machines
    #[command(subcommand)]
    Vm(vm::VmCommands),

    /// Manage service offerings
    #[command(subcommand)]
    Service(service::ServiceCommands),

    /// Sign in
    Login {
        #[arg(short, long)]
        username: String,

        #[arg(short, long, env = "CLOUDPANEL_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Sign out and forget the stored session
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Check the stored session with the backend
    Verify,

    /// Send a message to the operators
    Contact(contact::ContactArgs),

    /// Show version information
    Version,
}

fn load_config(cli: &Cli) -> anyhow::Result<ClientConfig> {
    let path = cli.config.clone().unwrap_or_else(default_config_path);
    let mut config = ClientConfig::load(&path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?
        .with_env();
    if let Some(url) = &cli.api_url {
        config.api.base_url = url.clone();
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Commands::Version = cli.command {
        println!("CloudPanel CLI v{}", cloudpanel_common::VERSION);
        return Ok(());
    }

    let config = load_config(&cli)?;
    let notifier = Arc::new(TerminalNotifier::new(cli.format));
    let panel = Panel::open(config, notifier).context("Failed to open session store")?;

    match cli.command {
        Commands::Vm(cmd) => vm::execute(cmd, &panel, cli.format).await?,
        Commands::Service(cmd) => service::execute(cmd, &panel, cli.format).await?,
        Commands::Login { username, password } => auth::login(&panel, username, password).await?,
        Commands::Logout => auth::logout(&panel).await?,
        Commands::Whoami => auth::whoami(&panel, cli.format)?,
        Commands::Verify => auth::verify(&panel, cli.format).await?,
        Commands::Contact(args) => contact::execute(args, &panel).await?,
        Commands::Version => {}
    }

    Ok(())
}
