//! Kb command handler.
//!
//! One-shot knowledge-base question answering with citations.

use clap::Args;
use labchat_core::{config::AppConfig, AppError, AppResult};
use labchat_kb::{ask, KbAnswer, KbContext, OpenSearchClient, RetrieveGenerateClient};
use labchat_llm::create_client;
use std::path::PathBuf;
use std::sync::Arc;

/// Ask the knowledge base one question
#[derive(Args, Debug)]
pub struct KbCommand {
    /// The question to ask
    pub question: Option<String>,

    /// Read the question from a file
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl KbCommand {
    /// Execute the kb command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing kb command");

        let question = self
            .get_question()
            .ok_or_else(|| AppError::Config("No question provided".to_string()))?;

        config.validate()?;
        let ctx = build_context(config)?;

        let answer = ask(&ctx, &question).await?;
        self.print_answer(&answer)?;

        Ok(())
    }

    fn get_question(&self) -> Option<String> {
        self.question.clone().or_else(|| {
            self.file.as_ref().and_then(|path| {
                std::fs::read_to_string(path)
                    .map_err(|e| tracing::error!("Failed to read question file: {}", e))
                    .ok()
            })
        })
    }

    fn print_answer(&self, answer: &KbAnswer) -> AppResult<()> {
        if self.json {
            let json = serde_json::to_string_pretty(answer)
                .map_err(|e| AppError::Serialization(e.to_string()))?;
            println!("{}", json);
            return Ok(());
        }

        println!("{}", answer.answer);

        if !answer.sources.is_empty() {
            println!();
            println!("Sources:");
            for url in &answer.sources {
                println!("  - {}", url);
            }
        }

        Ok(())
    }
}

/// Wire up the knowledge-base pipeline from configuration.
pub fn build_context(config: &AppConfig) -> AppResult<KbContext> {
    let model = create_client(config)?;
    let search = Arc::new(OpenSearchClient::new(&config.search));

    let api_key = config.api_key.clone().unwrap_or_default();
    let generator = Arc::new(RetrieveGenerateClient::new(&config.region, api_key));

    Ok(KbContext::new(model, search, generator, config.clone()))
}
