//! MCP session: handshake state machine and request/response correlation.
//!
//! A session owns its transport for life. Construction runs the MCP
//! handshake (`initialize` request, then the `notifications/initialized`
//! notification), after which tool operations are accepted until the session
//! is closed. The protocol flow is:
//!
//! 1. Client sends `initialize` with capabilities
//! 2. Server responds with its capabilities
//! 3. Client sends `notifications/initialized`
//! 4. Client can now call `tools/list` and `tools/call`

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde_json::Value;

use crate::descriptor::ConnectionDescriptor;
use crate::error::{McpError, Result};
use crate::protocol::{
    InitializeParams, InitializeResult, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse,
    ServerInfo, ServerMessage,
};
use crate::transport::Transport;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Handshake state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Transport not yet opened.
    Uninitialized,
    /// Transport open, initialize exchange in flight.
    Initializing,
    /// Handshake complete; tool operations accepted.
    Ready,
    /// Closed by the caller or by a transport failure. Terminal.
    Closed,
}

/// A client session bound to a single MCP server.
pub struct Session {
    transport: Transport,
    state: SessionState,
    next_id: u64,
    /// In-flight request id → response slot. A response for an id not in
    /// this map is discarded with a warning.
    pending: HashMap<u64, Option<JsonRpcResponse>>,
    timeout: Duration,
    server: Option<ServerInfo>,
}

impl Session {
    /// Open a transport for the descriptor and complete the handshake.
    pub fn connect(descriptor: &ConnectionDescriptor) -> Result<Self> {
        Self::connect_with_timeout(descriptor, DEFAULT_TIMEOUT)
    }

    /// Like [`connect`](Self::connect) with a caller-configured per-request
    /// timeout.
    pub fn connect_with_timeout(
        descriptor: &ConnectionDescriptor,
        timeout: Duration,
    ) -> Result<Self> {
        let transport = Transport::open(descriptor, timeout)?;
        let mut session = Self {
            transport,
            state: SessionState::Initializing,
            next_id: 1,
            pending: HashMap::new(),
            timeout,
            server: None,
        };
        session.handshake()?;
        Ok(session)
    }

    /// Current handshake state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Server info from the initialize result.
    pub fn server_info(&self) -> Option<&ServerInfo> {
        self.server.as_ref()
    }

    /// Whether the session accepts tool operations.
    pub fn is_ready(&self) -> bool {
        self.state == SessionState::Ready
    }

    /// Perform the initialize/initialized exchange.
    fn handshake(&mut self) -> Result<()> {
        let params = serde_json::to_value(InitializeParams::default())?;
        let result = match self.round_trip("initialize", Some(params)) {
            Ok(value) => value,
            Err(McpError::Server {
                code, message, ..
            }) => {
                return Err(self.fail_handshake(format!(
                    "server rejected initialize ({}): {}",
                    code, message
                )));
            }
            // Transport-level failures keep their own identity.
            Err(e) => {
                self.shutdown();
                return Err(e);
            }
        };

        let init: InitializeResult = match serde_json::from_value(result) {
            Ok(init) => init,
            Err(e) => {
                return Err(self.fail_handshake(format!("malformed initialize result: {}", e)));
            }
        };

        tracing::info!(
            server = %init.server_info.name,
            version = %init.server_info.version,
            protocol = %init.protocol_version,
            "MCP server initialized"
        );

        self.notify("notifications/initialized", None)?;
        self.server = Some(init.server_info);
        self.state = SessionState::Ready;
        Ok(())
    }

    fn fail_handshake(&mut self, msg: String) -> McpError {
        self.shutdown();
        McpError::Handshake(msg)
    }

    /// Send a request and await its response. Only valid once `Ready`.
    pub fn request(&mut self, method: &str, params: Option<Value>) -> Result<Value> {
        match self.state {
            SessionState::Ready => self.round_trip(method, params),
            SessionState::Closed => Err(McpError::Closed),
            _ => Err(McpError::protocol("handshake not complete")),
        }
    }

    /// Send a fire-and-forget notification.
    pub fn notify(&mut self, method: &str, params: Option<Value>) -> Result<()> {
        if self.state == SessionState::Closed {
            return Err(McpError::Closed);
        }
        let notification = JsonRpcNotification::new(method, params);
        let message = serde_json::to_value(&notification)?;
        self.transport
            .send(&message)
            .map_err(|e| self.fail_transport(e))
    }

    /// One correlated request/response round trip under the session timeout.
    fn round_trip(&mut self, method: &str, params: Option<Value>) -> Result<Value> {
        let id = self.next_id;
        self.next_id += 1;

        let request = JsonRpcRequest::new(id, method, params);
        let message = serde_json::to_value(&request)?;

        self.pending.insert(id, None);
        if let Err(e) = self.transport.send(&message) {
            self.pending.remove(&id);
            return Err(self.fail_transport(e));
        }

        let deadline = Instant::now() + self.timeout;
        loop {
            if let Some(response) = self.pending.get_mut(&id).and_then(Option::take) {
                self.pending.remove(&id);
                return response.into_result().map_err(Into::into);
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                // Abandon the request; a late response becomes an unknown id.
                self.pending.remove(&id);
                return Err(McpError::Timeout);
            }

            match self.transport.receive(remaining) {
                Ok(incoming) => {
                    if let Err(e) = self.dispatch(incoming) {
                        self.pending.remove(&id);
                        return Err(self.fail_transport(e));
                    }
                }
                Err(McpError::Timeout) => {
                    self.pending.remove(&id);
                    return Err(McpError::Timeout);
                }
                Err(e) => {
                    self.pending.remove(&id);
                    return Err(self.fail_transport(e));
                }
            }
        }
    }

    /// Route one inbound message. Responses fill pending slots; responses
    /// with unknown ids and unexpected server requests are logged and
    /// dropped; a shutdown notification cancels the in-flight request and
    /// takes the session down.
    fn dispatch(&mut self, message: ServerMessage) -> Result<()> {
        match message {
            ServerMessage::Response(response) => {
                match self.pending.get_mut(&response.id) {
                    Some(slot) if slot.is_none() => *slot = Some(response),
                    Some(_) => {
                        tracing::warn!(id = response.id, "duplicate response for pending request");
                    }
                    None => {
                        tracing::warn!(
                            id = response.id,
                            "discarding response with no pending request"
                        );
                    }
                }
                Ok(())
            }
            ServerMessage::Notification(notification) => {
                if notification.method == "notifications/shutdown" {
                    tracing::warn!("server signalled shutdown");
                    return Err(McpError::Cancelled);
                }
                tracing::trace!(method = %notification.method, "ignoring server notification");
                Ok(())
            }
            ServerMessage::Request(request) => {
                tracing::warn!(
                    method = %request.method,
                    id = request.id,
                    "ignoring unexpected server-initiated request"
                );
                Ok(())
            }
        }
    }

    /// Handle a transport-level failure: a timeout leaves the session
    /// usable, anything else fails pending requests and closes it.
    fn fail_transport(&mut self, err: McpError) -> McpError {
        if matches!(err, McpError::Timeout) {
            return err;
        }
        self.shutdown();
        err
    }

    fn shutdown(&mut self) {
        let cancelled = self.pending.len();
        if cancelled > 0 {
            tracing::debug!(cancelled, "failing pending requests");
        }
        self.pending.clear();
        self.transport.close();
        self.state = SessionState::Closed;
    }

    /// Cancel pending requests, close the transport, and mark the session
    /// `Closed`. Idempotent.
    pub fn close(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        let cancelled = self.pending.len();
        if cancelled > 0 {
            tracing::debug!(cancelled, "cancelling pending requests");
        }
        self.pending.clear();
        self.transport.close();
        self.state = SessionState::Closed;
        tracing::debug!("session closed");
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state)
            .field("next_id", &self.next_id)
            .field("pending", &self.pending.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_nonexistent_command() {
        let desc = ConnectionDescriptor::stdio("nonexistent-mcp-server-12345");
        let result = Session::connect(&desc);
        assert!(matches!(result, Err(McpError::Connection(_))));
    }

    #[test]
    fn test_handshake_timeout_against_silent_server() {
        if !cfg!(unix) {
            return;
        }
        // `cat` echoes the initialize request back; the echo classifies as a
        // server request and is ignored, so the handshake times out.
        let desc = ConnectionDescriptor::stdio("cat");
        let result = Session::connect_with_timeout(&desc, Duration::from_millis(100));
        assert!(matches!(result, Err(McpError::Timeout)));
    }

    #[test]
    fn test_handshake_error_on_server_exit() {
        if !cfg!(unix) {
            return;
        }
        // The child exits immediately; the handshake sees the pipe close.
        let desc = ConnectionDescriptor::stdio("true");
        let result = Session::connect_with_timeout(&desc, Duration::from_secs(2));
        assert!(matches!(
            result,
            Err(McpError::ConnectionLost) | Err(McpError::Io(_))
        ));
    }

    #[test]
    fn test_default_timeout() {
        assert_eq!(DEFAULT_TIMEOUT, Duration::from_secs(30));
    }
}
