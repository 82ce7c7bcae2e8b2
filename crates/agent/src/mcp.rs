//! MCP client over a subprocess stdio transport.
//!
//! Speaks JSON-RPC 2.0 with one line-delimited frame per message, the
//! framing the reference MCP servers use. The client owns the child
//! process; dropping it closes stdin and the server exits on EOF.

use labchat_core::{AppError, AppResult};
use labchat_llm::ToolSpec;
use serde_json::{json, Value};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

/// How to launch one MCP server subprocess.
#[derive(Debug, Clone)]
pub struct ServerParameters {
    pub command: String,
    pub args: Vec<String>,
}

impl ServerParameters {
    pub fn new(command: impl Into<String>, args: &[&str]) -> Self {
        Self {
            command: command.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }
}

/// A connected MCP server.
pub struct McpClient {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    next_id: u64,
}

impl McpClient {
    /// Spawn the server subprocess and run the initialize handshake.
    pub async fn connect(params: &ServerParameters) -> AppResult<Self> {
        tracing::info!("Spawning MCP server: {} {:?}", params.command, params.args);

        let mut child = Command::new(&params.command)
            .args(&params.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                AppError::Agent(format!(
                    "Failed to spawn MCP server '{}': {}",
                    params.command, e
                ))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| AppError::Agent("MCP server stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| AppError::Agent("MCP server stdout unavailable".to_string()))?;

        let mut client = Self {
            child,
            stdin,
            stdout: BufReader::new(stdout),
            next_id: 0,
        };

        client
            .request(
                "initialize",
                json!({
                    "protocolVersion": "2024-11-05",
                    "capabilities": {},
                    "clientInfo": {"name": "labchat", "version": env!("CARGO_PKG_VERSION")},
                }),
            )
            .await?;
        client.notify("notifications/initialized", json!({})).await?;

        Ok(client)
    }

    /// List the tools the server exposes, as model-facing tool specs.
    pub async fn list_tools(&mut self) -> AppResult<Vec<ToolSpec>> {
        let result = self.request("tools/list", json!({})).await?;

        let tools = result
            .get("tools")
            .and_then(Value::as_array)
            .ok_or_else(|| AppError::Agent("tools/list response missing tools".to_string()))?;

        tools.iter().map(parse_tool).collect()
    }

    /// Invoke one tool and return its text content.
    pub async fn call_tool(&mut self, name: &str, arguments: &Value) -> AppResult<String> {
        tracing::debug!("Calling MCP tool: {}", name);

        let result = self
            .request("tools/call", json!({"name": name, "arguments": arguments}))
            .await?;

        Ok(extract_text_content(&result))
    }

    /// Terminate the server subprocess.
    pub async fn shutdown(mut self) -> AppResult<()> {
        self.stdin.shutdown().await.ok();
        self.child
            .kill()
            .await
            .map_err(|e| AppError::Agent(format!("Failed to stop MCP server: {}", e)))
    }

    async fn request(&mut self, method: &str, params: Value) -> AppResult<Value> {
        self.next_id += 1;
        let id = self.next_id;

        self.send(&build_request(id, method, params)).await?;

        // Servers may interleave notifications; skip frames until the
        // response carrying our id arrives.
        loop {
            let line = self.receive().await?;

            let frame: Value = serde_json::from_str(&line).map_err(|e| {
                AppError::Agent(format!("Invalid JSON-RPC frame from MCP server: {}", e))
            })?;

            if frame.get("id").and_then(Value::as_u64) != Some(id) {
                continue;
            }

            return parse_response(&frame, method);
        }
    }

    async fn notify(&mut self, method: &str, params: Value) -> AppResult<()> {
        let frame = json!({"jsonrpc": "2.0", "method": method, "params": params});
        self.send(&frame).await
    }

    async fn send(&mut self, frame: &Value) -> AppResult<()> {
        let mut line = serde_json::to_string(frame)?;
        line.push('\n');

        self.stdin
            .write_all(line.as_bytes())
            .await
            .map_err(|e| AppError::Agent(format!("MCP server write failed: {}", e)))?;
        self.stdin
            .flush()
            .await
            .map_err(|e| AppError::Agent(format!("MCP server flush failed: {}", e)))
    }

    async fn receive(&mut self) -> AppResult<String> {
        let mut line = String::new();
        let read = self
            .stdout
            .read_line(&mut line)
            .await
            .map_err(|e| AppError::Agent(format!("MCP server read failed: {}", e)))?;

        if read == 0 {
            return Err(AppError::Agent("MCP server closed its stdout".to_string()));
        }

        Ok(line)
    }
}

fn build_request(id: u64, method: &str, params: Value) -> Value {
    json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params})
}

fn parse_response(frame: &Value, method: &str) -> AppResult<Value> {
    if let Some(error) = frame.get("error") {
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown error");
        let code = error.get("code").and_then(Value::as_i64).unwrap_or(0);
        return Err(AppError::Agent(format!(
            "MCP {} failed: {} (code {})",
            method, message, code
        )));
    }

    frame
        .get("result")
        .cloned()
        .ok_or_else(|| AppError::Agent(format!("MCP {} response has no result", method)))
}

fn parse_tool(tool: &Value) -> AppResult<ToolSpec> {
    let name = tool
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| AppError::Agent("MCP tool entry missing name".to_string()))?;

    let description = tool
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();

    let input_schema = tool
        .get("inputSchema")
        .cloned()
        .unwrap_or_else(|| json!({"type": "object"}));

    Ok(ToolSpec {
        name: name.to_string(),
        description,
        input_schema,
    })
}

/// Join the text blocks of a tools/call result into one string.
fn extract_text_content(result: &Value) -> String {
    let Some(blocks) = result.get("content").and_then(Value::as_array) else {
        return String::new();
    };

    blocks
        .iter()
        .filter_map(|block| block.get("text").and_then(Value::as_str))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_frame_shape() {
        let frame = build_request(7, "tools/list", json!({}));
        assert_eq!(frame["jsonrpc"], "2.0");
        assert_eq!(frame["id"], 7);
        assert_eq!(frame["method"], "tools/list");
    }

    #[test]
    fn test_parse_response_result() {
        let frame = json!({"jsonrpc": "2.0", "id": 1, "result": {"tools": []}});
        let result = parse_response(&frame, "tools/list").unwrap();
        assert_eq!(result, json!({"tools": []}));
    }

    #[test]
    fn test_parse_response_error_object() {
        let frame = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": {"code": -32601, "message": "Method not found"}
        });

        let err = parse_response(&frame, "tools/bogus").unwrap_err();
        assert!(err.to_string().contains("Method not found"));
    }

    #[test]
    fn test_parse_tool_spec() {
        let tool = json!({
            "name": "search_compounds",
            "description": "Search ChEMBL by name",
            "inputSchema": {"type": "object", "properties": {"query": {"type": "string"}}}
        });

        let spec = parse_tool(&tool).unwrap();
        assert_eq!(spec.name, "search_compounds");
        assert_eq!(spec.input_schema["type"], "object");
    }

    #[test]
    fn test_parse_tool_defaults_schema() {
        let spec = parse_tool(&json!({"name": "ping"})).unwrap();
        assert_eq!(spec.input_schema, json!({"type": "object"}));
        assert!(spec.description.is_empty());
    }

    #[test]
    fn test_extract_text_content_joins_blocks() {
        let result = json!({
            "content": [
                {"type": "text", "text": "line one"},
                {"type": "image", "data": "ignored"},
                {"type": "text", "text": "line two"}
            ]
        });

        assert_eq!(extract_text_content(&result), "line one\nline two");
    }
}
