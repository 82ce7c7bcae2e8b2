//! Tool-using domain agents.
//!
//! A domain agent pairs one system prompt with one MCP server and runs
//! the converse/tool-call loop until the model produces a final answer.
//! Failures never escape [`DomainAgent::run`]: the caller always gets a
//! displayable string, matching the chat surface's contract.

use crate::conversation::SlidingWindowConversation;
use crate::mcp::McpClient;
use crate::servers;
use labchat_core::{AppConfig, AppError, AppResult};
use labchat_llm::{ConverseRequest, Message, ModelClient, ToolSpec};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::mpsc::Sender;
use std::sync::Arc;

/// Upper bound on converse/tool rounds for one user turn.
const MAX_TOOL_ROUNDS: usize = 8;

/// Tool execution seam between the agent loop and the MCP transport.
#[async_trait::async_trait]
pub trait ToolBackend: Send {
    async fn call_tool(&mut self, name: &str, arguments: &Value) -> AppResult<String>;
}

#[async_trait::async_trait]
impl ToolBackend for McpClient {
    async fn call_tool(&mut self, name: &str, arguments: &Value) -> AppResult<String> {
        McpClient::call_tool(self, name, arguments).await
    }
}

/// One domain expert: a system prompt, a tool server, and a model.
pub struct DomainAgent {
    model: Arc<dyn ModelClient>,
    backend: Box<dyn ToolBackend>,
    system: String,
    tools: Vec<ToolSpec>,
    conversation: SlidingWindowConversation,
    config: AppConfig,
    progress: Option<Sender<String>>,
}

impl DomainAgent {
    /// Launch the domain's MCP server and build a ready agent.
    pub async fn connect(
        model: Arc<dyn ModelClient>,
        config: &AppConfig,
        domain: &str,
    ) -> AppResult<Self> {
        let prompt = labchat_prompt::load_prompt(&config.workspace, domain)?;

        let params = servers::server_for(domain)
            .ok_or_else(|| AppError::Agent(format!("No tool server for domain: {}", domain)))?;

        let mut mcp = McpClient::connect(&params).await?;
        let tools = mcp.list_tools().await?;
        tracing::info!("Domain {} exposes {} tools", domain, tools.len());

        // Prompt overrides may interpolate the tool list
        let tool_names = tools
            .iter()
            .map(|t| t.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let mut variables = HashMap::new();
        variables.insert("tools".to_string(), tool_names);
        let system = labchat_prompt::build_prompt(&prompt, &variables)?;

        Ok(Self::with_backend(
            model,
            Box::new(mcp),
            system,
            tools,
            config.clone(),
        ))
    }

    /// Build an agent over an already-connected tool backend.
    pub fn with_backend(
        model: Arc<dyn ModelClient>,
        backend: Box<dyn ToolBackend>,
        system: impl Into<String>,
        tools: Vec<ToolSpec>,
        config: AppConfig,
    ) -> Self {
        let window_size = config.window_size;
        Self {
            model,
            backend,
            system: system.into(),
            tools,
            conversation: SlidingWindowConversation::new(window_size),
            config,
            progress: None,
        }
    }

    /// Stream progress lines (tool activity) through a channel, typically
    /// a [`crate::relay::LogRelay`] sender.
    pub fn set_progress(&mut self, sender: Sender<String>) {
        self.progress = Some(sender);
    }

    /// The conversation so far, for display.
    pub fn conversation(&self) -> &SlidingWindowConversation {
        &self.conversation
    }

    fn report(&self, line: String) {
        if let Some(ref sender) = self.progress {
            let _ = sender.send(line);
        }
    }

    /// Answer one user query, running tools as the model requests them.
    ///
    /// Never fails: any error is rendered as an `Error: ...` reply so
    /// the chat surface can display it like any other message.
    pub async fn run(&mut self, query: &str) -> String {
        match self.run_turn(query).await {
            Ok(answer) => answer,
            Err(e) => {
                tracing::error!("Agent turn failed: {}", e);
                let reply = format!("Error: {}", e);
                self.conversation.push_assistant(&reply);
                reply
            }
        }
    }

    async fn run_turn(&mut self, query: &str) -> AppResult<String> {
        self.conversation.push_user(query);

        // Tool traffic for this turn lives outside the sliding window;
        // only the user/assistant exchange is kept across turns.
        let mut messages = self.conversation.window();

        for round in 1..=MAX_TOOL_ROUNDS {
            let request = ConverseRequest::new(&self.config.model, query)
                .with_messages(messages.clone())
                .with_system(&self.system)
                .with_tools(self.tools.clone())
                .with_params(self.config.agent_generation)
                .with_stop_sequences(vec!["\n\nHuman:".to_string()]);

            let response = self.model.converse(&request).await?;

            if response.is_final() {
                self.conversation.push_assistant(&response.text);
                return Ok(response.text);
            }

            tracing::debug!(
                "Round {}: model requested {} tool calls",
                round,
                response.tool_calls.len()
            );

            messages.push(Message::assistant(&response.text));
            for call in &response.tool_calls {
                self.report(format!("Calling tool {}", call.name));
                let output = self.backend.call_tool(&call.name, &call.input).await?;
                messages.push(Message::tool_result(&call.id, output));
            }
        }

        Err(AppError::Agent(format!(
            "Model did not finish within {} tool rounds",
            MAX_TOOL_ROUNDS
        )))
    }
}
