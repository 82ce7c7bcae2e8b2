//! Chat command handler.
//!
//! Interactive session against the knowledge base, or against one domain
//! agent when `--domain` is given. Prompts and answers go to stdout;
//! diagnostics and live tool activity to stderr.

use clap::Args;
use labchat_agent::{DomainAgent, LogRelay, SlidingWindowConversation};
use labchat_core::{config::AppConfig, AppResult};
use labchat_kb::ask;
use labchat_llm::create_client;
use std::io::{BufRead, Write};

use super::kb::build_context;

/// Interactive chat session
#[derive(Args, Debug)]
pub struct ChatCommand {
    /// Chat with a domain agent instead of the knowledge base
    #[arg(short, long)]
    pub domain: Option<String>,
}

impl ChatCommand {
    /// Execute the chat command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        config.validate()?;

        match self.domain {
            Some(ref domain) => self.chat_with_agent(config, domain).await,
            None => self.chat_with_kb(config).await,
        }
    }

    async fn chat_with_kb(&self, config: &AppConfig) -> AppResult<()> {
        let ctx = build_context(config)?;
        // Kept for transcript display; each question is answered standalone
        let mut conversation = SlidingWindowConversation::new(config.window_size);

        println!("LabChat knowledge base. Ask a question, or /quit to exit.");

        loop {
            let Some(line) = read_line()? else { break };
            if line.is_empty() {
                continue;
            }
            if is_quit(&line) {
                break;
            }

            conversation.push_user(&line);
            match ask(&ctx, &line).await {
                Ok(answer) => {
                    println!("{}", answer.answer);
                    for url in &answer.sources {
                        println!("  - {}", url);
                    }
                    conversation.push_assistant(&answer.answer);
                }
                Err(e) => {
                    let reply = format!("Error: {}", e);
                    println!("{}", reply);
                    conversation.push_assistant(&reply);
                }
            }
        }

        Ok(())
    }

    async fn chat_with_agent(&self, config: &AppConfig, domain: &str) -> AppResult<()> {
        let model = create_client(config)?;
        let mut agent = DomainAgent::connect(model, config, domain).await?;

        let relay = LogRelay::spawn(|line| eprintln!("{}", line));
        agent.set_progress(relay.sender());

        println!("LabChat agent ({}). Ask a question, or /quit to exit.", domain);

        loop {
            let Some(line) = read_line()? else { break };
            if line.is_empty() {
                continue;
            }
            if is_quit(&line) {
                break;
            }

            let reply = agent.run(&line).await;
            println!("{}", reply);
        }

        relay.finish();
        Ok(())
    }
}

/// Read one trimmed line from stdin; None on EOF.
fn read_line() -> AppResult<Option<String>> {
    print!("> ");
    std::io::stdout().flush()?;

    let mut line = String::new();
    let read = std::io::stdin().lock().read_line(&mut line)?;
    if read == 0 {
        return Ok(None);
    }

    let line = line.trim().to_string();
    Ok(Some(line))
}

fn is_quit(line: &str) -> bool {
    matches!(line, "/quit" | "/exit" | "/q")
}
