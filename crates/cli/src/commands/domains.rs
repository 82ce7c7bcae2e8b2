//! Domains command handler.

use clap::Args;
use labchat_core::AppResult;

/// List the available agent domains
#[derive(Args, Debug)]
pub struct DomainsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl DomainsCommand {
    /// Execute the domains command.
    pub fn execute(&self) -> AppResult<()> {
        let ids = labchat_prompt::builtin_ids();

        if self.json {
            println!("{}", serde_json::to_string_pretty(&ids)?);
            return Ok(());
        }

        for id in ids {
            let title = labchat_prompt::builtin(id)
                .map(|def| def.title)
                .unwrap_or_default();
            println!("{:<22} {}", id, title);
        }

        Ok(())
    }
}
