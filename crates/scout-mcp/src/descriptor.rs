//! Connection descriptors for MCP servers.
//!
//! A descriptor is the JSON shape the surrounding tooling hands this client:
//!
//! ```json
//! { "command": "mcp-server-sqlite", "args": ["--db", "x.db"], "env": {} }
//! { "url": "https://mcp.example.com/api", "headers": {} }
//! ```
//!
//! The transport is detected from the keys present (`url` ⇒ http, `command`
//! ⇒ stdio); an explicit `"transport"` key overrides detection.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{McpError, Result};

/// How to reach an MCP server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionDescriptor {
    /// Spawn a local server process and speak line-delimited JSON-RPC over
    /// its stdin/stdout.
    Stdio {
        /// Command to spawn.
        command: String,
        /// Arguments to pass to the command.
        args: Vec<String>,
        /// Environment overrides merged onto the inherited environment.
        env: BTreeMap<String, String>,
    },
    /// POST JSON-RPC to a remote Streamable HTTP endpoint.
    Http {
        /// Endpoint URL.
        url: String,
        /// Extra headers sent with every request.
        headers: BTreeMap<String, String>,
    },
}

/// Raw descriptor shape as found in configuration JSON.
#[derive(Debug, Default, Deserialize)]
struct RawDescriptor {
    transport: Option<String>,
    command: Option<String>,
    #[serde(default)]
    args: Vec<String>,
    #[serde(default)]
    env: BTreeMap<String, String>,
    url: Option<String>,
    #[serde(default)]
    headers: BTreeMap<String, String>,
    // Tolerated so flat single-server configs with a "name" key parse.
    #[serde(rename = "name")]
    _name: Option<String>,
}

impl ConnectionDescriptor {
    /// Create a stdio descriptor for the given command.
    pub fn stdio(command: impl Into<String>) -> Self {
        Self::Stdio {
            command: command.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
        }
    }

    /// Create an HTTP descriptor for the given URL.
    pub fn http(url: impl Into<String>) -> Self {
        Self::Http {
            url: url.into(),
            headers: BTreeMap::new(),
        }
    }

    /// Add an argument (stdio only; no-op for http).
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        if let Self::Stdio { args, .. } = &mut self {
            args.push(arg.into());
        }
        self
    }

    /// Add an environment override (stdio only; no-op for http).
    pub fn with_env_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        if let Self::Stdio { env, .. } = &mut self {
            env.insert(key.into(), value.into());
        }
        self
    }

    /// Add a header (http only; no-op for stdio).
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        if let Self::Http { headers, .. } = &mut self {
            headers.insert(key.into(), value.into());
        }
        self
    }

    /// Check if this is an HTTP descriptor.
    pub fn is_http(&self) -> bool {
        matches!(self, Self::Http { .. })
    }

    /// Check if this is a stdio descriptor.
    pub fn is_stdio(&self) -> bool {
        matches!(self, Self::Stdio { .. })
    }

    /// Parse a descriptor from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Parse a descriptor from a JSON value, auto-detecting the transport.
    pub fn from_value(value: Value) -> Result<Self> {
        let raw: RawDescriptor = serde_json::from_value(value)?;

        let transport = match raw.transport.as_deref() {
            Some("stdio") => Kind::Stdio,
            Some("http") | Some("sse") | Some("streamable-http") => Kind::Http,
            Some(other) => {
                return Err(McpError::connection(format!(
                    "unknown transport '{}' (expected 'stdio' or 'http')",
                    other
                )));
            }
            None if raw.url.is_some() => Kind::Http,
            None if raw.command.is_some() => Kind::Stdio,
            None => {
                return Err(McpError::connection(
                    "descriptor has neither 'command' nor 'url'",
                ));
            }
        };

        match transport {
            Kind::Stdio => {
                let command = raw.command.ok_or_else(|| {
                    McpError::connection("stdio descriptor requires a 'command'")
                })?;
                Ok(Self::Stdio {
                    command,
                    args: raw.args,
                    env: raw.env,
                })
            }
            Kind::Http => {
                let url = raw
                    .url
                    .ok_or_else(|| McpError::connection("http descriptor requires a 'url'"))?;
                Ok(Self::Http {
                    url,
                    headers: raw.headers,
                })
            }
        }
    }
}

enum Kind {
    Stdio,
    Http,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_detect_stdio_from_command() {
        let desc = ConnectionDescriptor::from_value(json!({
            "command": "mcp-server-sqlite",
            "args": ["--db", "/tmp/test.db"],
            "env": {"DEBUG": "1"}
        }))
        .unwrap();

        match desc {
            ConnectionDescriptor::Stdio { command, args, env } => {
                assert_eq!(command, "mcp-server-sqlite");
                assert_eq!(args, vec!["--db", "/tmp/test.db"]);
                assert_eq!(env.get("DEBUG").map(String::as_str), Some("1"));
            }
            other => panic!("expected stdio, got {:?}", other),
        }
    }

    #[test]
    fn test_detect_http_from_url() {
        let desc = ConnectionDescriptor::from_value(json!({
            "url": "https://mcp.example.com/api",
            "headers": {"Authorization": "Bearer token123"}
        }))
        .unwrap();

        match desc {
            ConnectionDescriptor::Http { url, headers } => {
                assert_eq!(url, "https://mcp.example.com/api");
                assert_eq!(
                    headers.get("Authorization").map(String::as_str),
                    Some("Bearer token123")
                );
            }
            other => panic!("expected http, got {:?}", other),
        }
    }

    #[test]
    fn test_explicit_transport_overrides_detection() {
        // A descriptor with both keys follows the explicit transport.
        let desc = ConnectionDescriptor::from_value(json!({
            "transport": "stdio",
            "command": "local-server",
            "url": "https://unused.example.com"
        }))
        .unwrap();
        assert!(desc.is_stdio());
    }

    #[test]
    fn test_http_aliases() {
        for alias in ["http", "sse", "streamable-http"] {
            let desc = ConnectionDescriptor::from_value(json!({
                "transport": alias,
                "url": "https://mcp.example.com"
            }))
            .unwrap();
            assert!(desc.is_http(), "alias {} should map to http", alias);
        }
    }

    #[test]
    fn test_unknown_transport_rejected() {
        let result = ConnectionDescriptor::from_value(json!({
            "transport": "websocket",
            "url": "wss://mcp.example.com"
        }));
        assert!(matches!(result, Err(McpError::Connection(_))));
    }

    #[test]
    fn test_empty_descriptor_rejected() {
        let result = ConnectionDescriptor::from_value(json!({}));
        assert!(matches!(result, Err(McpError::Connection(_))));
    }

    #[test]
    fn test_transport_without_target_rejected() {
        let result = ConnectionDescriptor::from_value(json!({"transport": "http"}));
        assert!(matches!(result, Err(McpError::Connection(_))));

        let result = ConnectionDescriptor::from_value(json!({"transport": "stdio"}));
        assert!(matches!(result, Err(McpError::Connection(_))));
    }

    #[test]
    fn test_name_key_tolerated() {
        let desc = ConnectionDescriptor::from_json(
            r#"{"name": "github", "command": "mcp-server-github"}"#,
        )
        .unwrap();
        assert!(desc.is_stdio());
    }

    #[test]
    fn test_builders() {
        let desc = ConnectionDescriptor::stdio("mcp-server-test")
            .with_arg("--db")
            .with_arg("/path/to/db")
            .with_env_var("DEBUG", "1");

        match &desc {
            ConnectionDescriptor::Stdio { command, args, env } => {
                assert_eq!(command, "mcp-server-test");
                assert_eq!(args, &vec!["--db".to_string(), "/path/to/db".to_string()]);
                assert_eq!(env.len(), 1);
            }
            other => panic!("expected stdio, got {:?}", other),
        }

        let desc = ConnectionDescriptor::http("http://localhost:8080/mcp")
            .with_header("X-Api-Key", "secret123");
        match &desc {
            ConnectionDescriptor::Http { headers, .. } => assert_eq!(headers.len(), 1),
            other => panic!("expected http, got {:?}", other),
        }
    }
}
