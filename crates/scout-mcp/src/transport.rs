//! Transport layer for MCP communication.
//!
//! Two wire shapes hide behind one interface: a spawned child process
//! speaking one JSON object per line over stdin/stdout, or a Streamable HTTP
//! endpoint where each request is a POST whose response body is either a
//! single JSON document or a server-sent-event stream of JSON-RPC messages.

use std::collections::VecDeque;
use std::io::{BufRead, BufReader, BufWriter, ErrorKind, Write};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender};
use std::thread::JoinHandle;
use std::time::Duration;

use serde_json::Value;

use crate::descriptor::ConnectionDescriptor;
use crate::error::{McpError, Result};
use crate::protocol::{MCP_PROTOCOL_VERSION, ServerMessage};
use crate::sse::SseEvents;

/// Header carrying the negotiated protocol revision (Streamable HTTP).
const HEADER_PROTOCOL_VERSION: &str = "MCP-Protocol-Version";
/// Header carrying the server-assigned session id (Streamable HTTP).
const HEADER_SESSION_ID: &str = "Mcp-Session-Id";

/// How many parsed messages the stdio reader thread may buffer ahead.
const STDIO_INBOX_DEPTH: usize = 64;

/// Transport for communicating with an MCP server.
pub enum Transport {
    /// Stdio transport - communicates with a child process via stdin/stdout.
    Stdio(StdioTransport),
    /// HTTP transport - communicates via HTTP POST requests.
    Http(HttpTransport),
}

impl Transport {
    /// Open a transport for the given descriptor.
    ///
    /// `timeout` bounds each HTTP round trip; stdio reads are bounded per
    /// [`receive`](Self::receive) call instead.
    pub fn open(descriptor: &ConnectionDescriptor, timeout: Duration) -> Result<Self> {
        match descriptor {
            ConnectionDescriptor::Stdio { command, args, env } => {
                StdioTransport::spawn(command, args, env.iter()).map(Self::Stdio)
            }
            ConnectionDescriptor::Http { url, headers } => {
                HttpTransport::connect(url, headers.iter(), timeout).map(Self::Http)
            }
        }
    }

    /// Send one JSON-RPC message.
    ///
    /// For HTTP this performs the POST and queues every JSON-RPC message the
    /// response body carried; for stdio it writes one line.
    pub fn send(&mut self, message: &Value) -> Result<()> {
        match self {
            Self::Stdio(t) => t.send(message),
            Self::Http(t) => t.send(message),
        }
    }

    /// Receive the next message from the server, waiting up to `timeout`.
    pub fn receive(&mut self, timeout: Duration) -> Result<ServerMessage> {
        match self {
            Self::Stdio(t) => t.receive(timeout),
            Self::Http(t) => t.receive(),
        }
    }

    /// Release the underlying OS resource. Idempotent, safe after failure.
    pub fn close(&mut self) {
        match self {
            Self::Stdio(t) => t.close(),
            Self::Http(t) => t.close(),
        }
    }

    /// Check if this is an HTTP transport.
    pub fn is_http(&self) -> bool {
        matches!(self, Self::Http(_))
    }

    /// Check if this is a stdio transport.
    pub fn is_stdio(&self) -> bool {
        matches!(self, Self::Stdio(_))
    }
}

impl Drop for Transport {
    fn drop(&mut self) {
        self.close();
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Stdio
// ─────────────────────────────────────────────────────────────────────────────

/// Child-process transport: newline-delimited JSON-RPC over stdin/stdout.
///
/// A background thread reads and parses stdout so a receive can time out and
/// out-of-order server output cannot deadlock a send/receive pair. The
/// child's stderr is diagnostic-only and is forwarded to tracing, never
/// parsed as protocol data.
pub struct StdioTransport {
    child: Child,
    stdin: Option<BufWriter<ChildStdin>>,
    inbox: Receiver<ServerMessage>,
    reader: Option<JoinHandle<()>>,
    stderr_pump: Option<JoinHandle<()>>,
    closed: bool,
}

impl StdioTransport {
    /// Spawn the configured command with env overrides merged onto the
    /// inherited environment.
    pub fn spawn<'a>(
        command: &str,
        args: &[String],
        env: impl Iterator<Item = (&'a String, &'a String)>,
    ) -> Result<Self> {
        let mut cmd = Command::new(command);
        cmd.args(args)
            .envs(env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(|e| {
            McpError::connection(format!("failed to spawn '{}': {}", command, e))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| McpError::connection("failed to capture stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| McpError::connection("failed to capture stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| McpError::connection("failed to capture stderr"))?;

        let (tx, rx) = mpsc::sync_channel(STDIO_INBOX_DEPTH);
        let reader = std::thread::spawn(move || read_loop(BufReader::new(stdout), tx));
        let stderr_pump = std::thread::spawn(move || {
            for line in BufReader::new(stderr).lines() {
                match line {
                    Ok(line) => tracing::debug!(target: "scout_mcp::server_stderr", "{}", line),
                    Err(_) => break,
                }
            }
        });

        tracing::info!(command = %command, "spawned MCP server");

        Ok(Self {
            child,
            stdin: Some(BufWriter::new(stdin)),
            inbox: rx,
            reader: Some(reader),
            stderr_pump: Some(stderr_pump),
            closed: false,
        })
    }

    fn send(&mut self, message: &Value) -> Result<()> {
        let stdin = self.stdin.as_mut().ok_or(McpError::Closed)?;
        let json = serde_json::to_string(message)?;

        tracing::trace!(json = %json, "sending MCP message");

        let write = stdin
            .write_all(json.as_bytes())
            .and_then(|()| stdin.write_all(b"\n"))
            .and_then(|()| stdin.flush());

        write.map_err(|e| {
            if e.kind() == ErrorKind::BrokenPipe {
                McpError::ConnectionLost
            } else {
                McpError::Io(e)
            }
        })
    }

    fn receive(&mut self, timeout: Duration) -> Result<ServerMessage> {
        if self.closed {
            return Err(McpError::Closed);
        }
        match self.inbox.recv_timeout(timeout) {
            Ok(message) => Ok(message),
            Err(RecvTimeoutError::Timeout) => Err(McpError::Timeout),
            Err(RecvTimeoutError::Disconnected) => Err(McpError::ConnectionLost),
        }
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        // Dropping stdin signals EOF to a well-behaved server; kill covers
        // the rest.
        drop(self.stdin.take());
        let _ = self.child.kill();
        let _ = self.child.wait();

        if let Some(handle) = self.reader.take() {
            let _ = handle.join();
        }
        if let Some(handle) = self.stderr_pump.take() {
            let _ = handle.join();
        }

        tracing::debug!("stdio transport closed");
    }
}

/// Parse stdout lines into messages until EOF or the receiver goes away.
///
/// Malformed lines are logged and skipped; they must not take the session
/// down.
fn read_loop<R: BufRead>(reader: R, tx: SyncSender<ServerMessage>) {
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                tracing::debug!(error = %e, "stdout read failed");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        let message = match serde_json::from_str::<Value>(&line) {
            Ok(value) => ServerMessage::classify(value),
            Err(e) => {
                tracing::warn!(error = %e, "skipping malformed line from server");
                continue;
            }
        };
        let Some(message) = message else {
            tracing::warn!(line = %line, "skipping unrecognized JSON-RPC message");
            continue;
        };
        if tx.send(message).is_err() {
            break;
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// HTTP (Streamable HTTP)
// ─────────────────────────────────────────────────────────────────────────────

/// Streamable HTTP transport: one POST per outbound message.
///
/// The response body may carry zero (notification acknowledged), one (plain
/// JSON), or several (event stream) JSON-RPC messages; parsed messages queue
/// up and drain through `receive`.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
    url: String,
    headers: Vec<(String, String)>,
    session_id: Option<String>,
    inbox: VecDeque<ServerMessage>,
    closed: bool,
}

impl HttpTransport {
    /// Build the HTTP client for the given endpoint.
    pub fn connect<'a>(
        url: &str,
        headers: impl Iterator<Item = (&'a String, &'a String)>,
        timeout: Duration,
    ) -> Result<Self> {
        let _parsed = url::Url::parse(url)
            .map_err(|e| McpError::connection(format!("invalid URL '{}': {}", url, e)))?;

        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .tcp_keepalive(Duration::from_secs(30))
            .build()
            .map_err(|e| McpError::connection(format!("failed to build HTTP client: {}", e)))?;

        tracing::info!(url = %url, timeout_secs = timeout.as_secs(), "created HTTP transport");

        Ok(Self {
            client,
            url: url.to_string(),
            headers: headers.map(|(k, v)| (k.clone(), v.clone())).collect(),
            session_id: None,
            inbox: VecDeque::new(),
            closed: false,
        })
    }

    fn send(&mut self, message: &Value) -> Result<()> {
        if self.closed {
            return Err(McpError::Closed);
        }

        let json = serde_json::to_string(message)?;
        tracing::trace!(url = %self.url, json = %json, "sending MCP HTTP request");

        let mut req = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json, text/event-stream")
            .header(HEADER_PROTOCOL_VERSION, MCP_PROTOCOL_VERSION)
            .body(json);
        for (key, value) in &self.headers {
            req = req.header(key, value);
        }
        if let Some(session_id) = &self.session_id {
            req = req.header(HEADER_SESSION_ID, session_id);
        }

        let resp = req.send().map_err(|e| {
            if e.is_timeout() {
                McpError::Timeout
            } else {
                McpError::connection(format!("HTTP request failed: {}", e))
            }
        })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(McpError::connection(format!("HTTP error {}: {}", status, body)));
        }

        // The server assigns a session id on initialize; echo it afterwards.
        if let Some(id) = resp
            .headers()
            .get(HEADER_SESSION_ID)
            .and_then(|v| v.to_str().ok())
        {
            self.session_id = Some(id.to_string());
        }

        let content_type = resp
            .headers()
            .get("Content-Type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        // 202/204 acknowledge a notification; there is nothing to parse.
        if status.as_u16() == 202 || status.as_u16() == 204 {
            return Ok(());
        }

        if content_type.starts_with("application/json") {
            let body = resp
                .text()
                .map_err(|e| McpError::connection(format!("failed to read response body: {}", e)))?;
            if body.trim().is_empty() {
                return Ok(());
            }
            tracing::trace!(json = %body, "received MCP HTTP response");
            self.enqueue(serde_json::from_str(&body)?);
            Ok(())
        } else if content_type.starts_with("text/event-stream") {
            for event in SseEvents::new(BufReader::new(resp)) {
                let data = event?;
                tracing::trace!(json = %data, "received MCP event");
                match serde_json::from_str::<Value>(&data) {
                    Ok(value) => self.enqueue(value),
                    Err(e) => {
                        tracing::warn!(error = %e, "skipping malformed event from server");
                    }
                }
            }
            Ok(())
        } else {
            Err(McpError::connection(format!(
                "unrecognized response content type '{}'",
                content_type
            )))
        }
    }

    fn enqueue(&mut self, value: Value) {
        match ServerMessage::classify(value) {
            Some(message) => self.inbox.push_back(message),
            None => tracing::warn!("skipping unrecognized JSON-RPC message"),
        }
    }

    fn receive(&mut self) -> Result<ServerMessage> {
        if self.closed {
            return Err(McpError::Closed);
        }
        self.inbox
            .pop_front()
            .ok_or_else(|| McpError::protocol("server response carried no matching message"))
    }

    fn close(&mut self) {
        // Connection pooling belongs to reqwest; just drop pending messages.
        self.closed = true;
        self.inbox.clear();
    }
}
