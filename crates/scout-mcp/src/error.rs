//! Error types for MCP operations.

use thiserror::Error;

/// Result type for MCP operations.
pub type Result<T> = std::result::Result<T, McpError>;

/// Error type for MCP operations.
#[derive(Debug, Error)]
pub enum McpError {
    /// Could not establish the transport (spawn failure, bad URL, HTTP
    /// status error).
    #[error("connection error: {0}")]
    Connection(String),

    /// The server rejected or mis-answered the initialize exchange.
    #[error("handshake failed: {0}")]
    Handshake(String),

    /// The transport died mid-session; in-flight and future calls fail.
    #[error("connection lost")]
    ConnectionLost,

    /// Operation attempted on a closed session.
    #[error("session closed")]
    Closed,

    /// A single request exceeded its timeout; the session stays usable.
    #[error("timeout waiting for response")]
    Timeout,

    /// A request was abandoned because the session was closed under it,
    /// as on a server-initiated shutdown notification.
    #[error("request cancelled")]
    Cancelled,

    /// The named tool does not exist on the server.
    #[error("tool not found: {0}")]
    NotFound(String),

    /// The server returned a JSON-RPC error response.
    #[error("server error {code}: {message}")]
    Server {
        /// Error code from the server.
        code: i64,
        /// Error message from the server.
        message: String,
        /// Optional additional data.
        data: Option<serde_json::Value>,
    },

    /// JSON-RPC protocol violation (unexpected shape, missing fields).
    #[error("protocol error: {0}")]
    Protocol(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl McpError {
    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Create a handshake error.
    pub fn handshake(msg: impl Into<String>) -> Self {
        Self::Handshake(msg.into())
    }

    /// Create a protocol error.
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// Create a server error from an error response.
    pub fn server_error(
        code: i64,
        message: impl Into<String>,
        data: Option<serde_json::Value>,
    ) -> Self {
        Self::Server {
            code,
            message: message.into(),
            data,
        }
    }
}

impl From<crate::protocol::JsonRpcError> for McpError {
    fn from(err: crate::protocol::JsonRpcError) -> Self {
        Self::Server {
            code: err.code,
            message: err.message,
            data: err.data,
        }
    }
}
