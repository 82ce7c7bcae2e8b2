//! LabChat CLI
//!
//! Main entry point for the labchat command-line tool.
//! Provides knowledge-base question answering and tool-using domain
//! agents over biomedical databases.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AgentCommand, ChatCommand, DomainsCommand, KbCommand};
use labchat_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;

/// LabChat CLI - biomedical knowledge-base chat and domain agents
#[derive(Parser, Debug)]
#[command(name = "labchat")]
#[command(about = "Biomedical knowledge-base chat and domain agents", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "LABCHAT_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "LABCHAT_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// Cloud region for the managed model service
    #[arg(short, long, global = true, env = "LABCHAT_REGION")]
    region: Option<String>,

    /// Model identifier
    #[arg(short, long, global = true, env = "LABCHAT_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ask the knowledge base one question
    Kb(KbCommand),

    /// Run one query through a domain agent
    Agent(AgentCommand),

    /// Interactive chat session (knowledge base or a domain agent)
    Chat(ChatCommand),

    /// List the available agent domains
    Domains(DomainsCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Load base configuration from environment
    let config = AppConfig::load()?;

    // Apply CLI overrides
    let config = config.with_overrides(
        cli.workspace,
        cli.config,
        cli.region,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    // Initialize logging with final configuration
    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("LabChat CLI starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Provider: {}", config.provider);
    tracing::debug!("Model: {}", config.model);

    // Emit command span
    let command_name = match &cli.command {
        Commands::Kb(_) => "kb",
        Commands::Agent(_) => "agent",
        Commands::Chat(_) => "chat",
        Commands::Domains(_) => "domains",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    // Route to command handlers
    let result = match cli.command {
        Commands::Kb(cmd) => cmd.execute(&config).await,
        Commands::Agent(cmd) => cmd.execute(&config).await,
        Commands::Chat(cmd) => cmd.execute(&config).await,
        Commands::Domains(cmd) => cmd.execute(),
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
