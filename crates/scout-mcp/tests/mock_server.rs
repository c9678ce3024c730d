//! Mock MCP server for integration testing.
//!
//! Speaks newline-delimited JSON-RPC over stdin/stdout and responds to
//! initialize, tools/list, and tools/call.
//!
//! Usage:
//!   mock-mcp-server [--delay-ms N] [--crash-on TOOL] [--shutdown-on TOOL]
//!                   [--slow-tool TOOL:MS] [--paged] [--duplicate-tool]
//!                   [--noise] [--bad-init]
//!
//! Options:
//!   --delay-ms N       Add N ms delay to all responses
//!   --crash-on TOOL    Exit with code 1 when TOOL is called
//!   --shutdown-on TOOL Send a shutdown notification instead of answering
//!                      when TOOL is called, then exit cleanly
//!   --slow-tool T:MS   Add MS delay when tool T is called
//!   --paged            Split tools/list into two cursor-linked pages
//!   --duplicate-tool   List the echo tool twice (protocol anomaly)
//!   --noise            Emit an unknown-id response and a notification
//!                      before every real response
//!   --bad-init         Answer initialize with a malformed result

#![allow(dead_code)]

use std::env;
use std::io::{BufRead, BufReader, Write};
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// JSON-RPC request structure.
#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    id: u64,
    method: String,
    #[serde(default)]
    params: Option<Value>,
}

/// JSON-RPC response structure.
#[derive(Debug, Serialize)]
struct JsonRpcResponse {
    jsonrpc: String,
    id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<Value>,
}

/// Server configuration parsed from command line.
struct ServerConfig {
    delay_ms: u64,
    crash_on: Option<String>,
    shutdown_on: Option<String>,
    slow_tools: Vec<(String, u64)>,
    paged: bool,
    duplicate_tool: bool,
    noise: bool,
    bad_init: bool,
}

impl ServerConfig {
    fn from_args() -> Self {
        let args: Vec<String> = env::args().collect();
        let mut config = Self {
            delay_ms: 0,
            crash_on: None,
            shutdown_on: None,
            slow_tools: Vec::new(),
            paged: false,
            duplicate_tool: false,
            noise: false,
            bad_init: false,
        };

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--delay-ms" => {
                    if i + 1 < args.len() {
                        config.delay_ms = args[i + 1].parse().unwrap_or(0);
                        i += 2;
                    } else {
                        i += 1;
                    }
                }
                "--crash-on" => {
                    if i + 1 < args.len() {
                        config.crash_on = Some(args[i + 1].clone());
                        i += 2;
                    } else {
                        i += 1;
                    }
                }
                "--shutdown-on" => {
                    if i + 1 < args.len() {
                        config.shutdown_on = Some(args[i + 1].clone());
                        i += 2;
                    } else {
                        i += 1;
                    }
                }
                "--slow-tool" => {
                    if i + 1 < args.len() {
                        if let Some((tool, ms)) = args[i + 1].split_once(':') {
                            if let Ok(ms) = ms.parse() {
                                config.slow_tools.push((tool.to_string(), ms));
                            }
                        }
                        i += 2;
                    } else {
                        i += 1;
                    }
                }
                "--paged" => {
                    config.paged = true;
                    i += 1;
                }
                "--duplicate-tool" => {
                    config.duplicate_tool = true;
                    i += 1;
                }
                "--noise" => {
                    config.noise = true;
                    i += 1;
                }
                "--bad-init" => {
                    config.bad_init = true;
                    i += 1;
                }
                _ => {
                    i += 1;
                }
            }
        }

        config
    }

    fn get_tool_delay(&self, tool_name: &str) -> u64 {
        for (tool, ms) in &self.slow_tools {
            if tool == tool_name {
                return *ms;
            }
        }
        0
    }
}

fn main() {
    let config = ServerConfig::from_args();
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    let reader = BufReader::new(stdin.lock());

    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(_) => return,
        };
        if line.trim().is_empty() {
            continue;
        }

        // Requests only; notifications (no id) are consumed silently.
        let request: JsonRpcRequest = match serde_json::from_str(&line) {
            Ok(req) => req,
            Err(_) => continue,
        };

        if config.delay_ms > 0 {
            thread::sleep(Duration::from_millis(config.delay_ms));
        }

        if config.noise {
            let spurious = json!({"jsonrpc": "2.0", "id": 999_999, "result": {"noise": true}});
            writeln!(stdout, "{}", spurious).unwrap();
            let notification =
                json!({"jsonrpc": "2.0", "method": "notifications/progress", "params": {}});
            writeln!(stdout, "{}", notification).unwrap();
        }

        let response = handle_request(&request, &config);
        writeln!(stdout, "{}", serde_json::to_string(&response).unwrap()).unwrap();
        stdout.flush().unwrap();
    }
}

fn tool_page_one(config: &ServerConfig) -> Vec<Value> {
    let mut tools = vec![
        json!({
            "name": "echo",
            "description": "Echo back the input",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "message": { "type": "string" }
                },
                "required": ["message"]
            }
        }),
        json!({
            "name": "add",
            "description": "Add two numbers",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "a": { "type": "number" },
                    "b": { "type": "number" }
                },
                "required": ["a", "b"]
            }
        }),
    ];
    if config.duplicate_tool {
        tools.push(json!({
            "name": "echo",
            "description": "Duplicate listing of echo",
            "inputSchema": { "type": "object", "properties": {} }
        }));
    }
    tools
}

fn tool_page_two() -> Vec<Value> {
    vec![
        json!({
            "name": "slow",
            "description": "A slow tool for testing timeouts",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "delay_ms": { "type": "number" }
                }
            }
        }),
        json!({
            "name": "crash",
            "description": "Crashes the server (for testing)",
            "inputSchema": {
                "type": "object",
                "properties": {}
            }
        }),
    ]
}

fn handle_request(request: &JsonRpcRequest, config: &ServerConfig) -> JsonRpcResponse {
    let result = match request.method.as_str() {
        "initialize" => {
            if config.bad_init {
                Some(json!({"unexpected": "shape"}))
            } else {
                Some(json!({
                    "protocolVersion": "2025-03-26",
                    "capabilities": {
                        "tools": {}
                    },
                    "serverInfo": {
                        "name": "mock-mcp-server",
                        "version": "1.0.0"
                    }
                }))
            }
        }
        "tools/list" => {
            let cursor = request
                .params
                .as_ref()
                .and_then(|p| p.get("cursor"))
                .and_then(|c| c.as_str());

            if config.paged {
                match cursor {
                    None => Some(json!({
                        "tools": tool_page_one(config),
                        "nextCursor": "page-2"
                    })),
                    Some("page-2") => Some(json!({ "tools": tool_page_two() })),
                    Some(other) => Some(json!({
                        "tools": [],
                        "_unknownCursor": other
                    })),
                }
            } else {
                let mut tools = tool_page_one(config);
                tools.extend(tool_page_two());
                Some(json!({ "tools": tools }))
            }
        }
        "tools/call" => {
            let params = request.params.as_ref().cloned().unwrap_or(json!({}));
            let tool_name = params.get("name").and_then(|v| v.as_str()).unwrap_or("");
            let args = params.get("arguments").cloned().unwrap_or(json!({}));

            if let Some(ref crash_tool) = config.crash_on {
                if crash_tool == tool_name {
                    std::process::exit(1);
                }
            }

            if let Some(ref shutdown_tool) = config.shutdown_on {
                if shutdown_tool == tool_name {
                    let mut out = std::io::stdout();
                    let notification =
                        json!({"jsonrpc": "2.0", "method": "notifications/shutdown"});
                    writeln!(out, "{}", notification).unwrap();
                    out.flush().unwrap();
                    std::process::exit(0);
                }
            }

            let tool_delay = config.get_tool_delay(tool_name);
            if tool_delay > 0 {
                thread::sleep(Duration::from_millis(tool_delay));
            }

            match tool_name {
                "echo" => {
                    let message = args.get("message").and_then(|v| v.as_str()).unwrap_or("");
                    Some(json!({
                        "content": [
                            { "type": "text", "text": message }
                        ]
                    }))
                }
                "add" => {
                    let a = args.get("a").and_then(|v| v.as_f64()).unwrap_or(0.0);
                    let b = args.get("b").and_then(|v| v.as_f64()).unwrap_or(0.0);
                    Some(json!({
                        "content": [
                            { "type": "text", "text": format!("{}", a + b) }
                        ]
                    }))
                }
                "slow" => {
                    let delay = args
                        .get("delay_ms")
                        .and_then(|v| v.as_u64())
                        .unwrap_or(1000);
                    thread::sleep(Duration::from_millis(delay));
                    Some(json!({
                        "content": [
                            { "type": "text", "text": format!("Slept for {} ms", delay) }
                        ]
                    }))
                }
                "crash" => {
                    std::process::exit(1);
                }
                _ => Some(json!({
                    "content": [
                        { "type": "text", "text": format!("Unknown tool: {}", tool_name) }
                    ],
                    "isError": true
                })),
            }
        }
        _ => None,
    };

    let error = if result.is_none() {
        Some(json!({
            "code": -32601,
            "message": format!("Method not found: {}", request.method)
        }))
    } else {
        None
    };

    JsonRpcResponse {
        jsonrpc: "2.0".to_string(),
        id: request.id,
        result,
        error,
    }
}
