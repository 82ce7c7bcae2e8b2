//! Agent command handler.
//!
//! Runs one query through a tool-using domain agent.

use clap::Args;
use labchat_agent::{DomainAgent, LogRelay};
use labchat_core::{config::AppConfig, AppError, AppResult};
use labchat_llm::create_client;

/// Run one query through a domain agent
#[derive(Args, Debug)]
pub struct AgentCommand {
    /// Agent domain (see `labchat domains`)
    #[arg(short, long)]
    pub domain: String,

    /// The query to run
    pub query: String,

    /// Stream tool activity to stderr while the agent works
    #[arg(long)]
    pub live: bool,
}

impl AgentCommand {
    /// Execute the agent command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing agent command for domain {}", self.domain);

        if self.query.trim().is_empty() {
            return Err(AppError::Config("Query must not be empty".to_string()));
        }

        config.validate()?;
        let model = create_client(config)?;
        let mut agent = DomainAgent::connect(model, config, &self.domain).await?;

        let relay = if self.live {
            let relay = LogRelay::spawn(|line| eprintln!("{}", line));
            agent.set_progress(relay.sender());
            Some(relay)
        } else {
            None
        };

        let reply = agent.run(&self.query).await;

        if let Some(relay) = relay {
            relay.finish();
        }

        println!("{}", reply);
        Ok(())
    }
}
