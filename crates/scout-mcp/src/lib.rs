//! MCP (Model Context Protocol) client for Scout.
//!
//! This crate connects to an MCP server over one of two transports (a
//! spawned subprocess speaking newline-delimited JSON-RPC, or a remote
//! Streamable HTTP endpoint) and exposes three operations: list the
//! server's tools, fetch one tool's schema, and invoke a tool.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  introspect (driver)                                        │
//! │  - list_tools (paginated), describe_tool, call_tool         │
//! └─────────────────────────────────────────────────────────────┘
//!                           │
//!                           ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Session                                                    │
//! │  - initialize/initialized handshake state machine           │
//! │  - request-id correlation, per-request timeout              │
//! └─────────────────────────────────────────────────────────────┘
//!                           │
//!                           ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Transport                                                  │
//! │  - Stdio: child process, one JSON object per line           │
//! │  - Http: POST per message, JSON or SSE response body        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use scout_mcp::{ConnectionDescriptor, Session, introspect};
//!
//! let descriptor = ConnectionDescriptor::stdio("mcp-server-sqlite")
//!     .with_arg("--db")
//!     .with_arg("/path/to/database.db");
//!
//! let mut session = Session::connect(&descriptor)?;
//! for tool in introspect::list_tools(&mut session)? {
//!     println!("{}: {:?}", tool.name, tool.description);
//! }
//!
//! let result = introspect::call_tool(
//!     &mut session,
//!     "query",
//!     Some(serde_json::json!({"sql": "SELECT 1"})),
//! )?;
//! println!("{:?}", result.text());
//! ```

pub mod descriptor;
pub mod error;
pub mod introspect;
pub mod protocol;
pub mod session;
pub mod sse;
pub mod transport;

// Re-export main types
pub use descriptor::ConnectionDescriptor;
pub use error::{McpError, Result};
pub use introspect::{ServerReport, call_tool, describe_tool, list_tools};
pub use protocol::{
    CallToolParams, CallToolResult, InitializeParams, InitializeResult, JsonRpcError,
    JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, ListToolsResult, ServerCapabilities,
    ServerInfo, ServerMessage, ToolContent, ToolInfo, ToolSummary,
};
pub use session::{DEFAULT_TIMEOUT, Session, SessionState};
pub use transport::Transport;
