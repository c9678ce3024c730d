//! Introspection driver: tool discovery and invocation on a ready session.
//!
//! One conversion run connects, lists every tool (following pagination
//! cursors), and hands the caller a normalized model to render. Tool-reported
//! failures are data, not errors: a `tools/call` result with `isError: true`
//! comes back as a normal [`CallToolResult`] so the caller can show the
//! tool's own error content.

use std::collections::HashSet;
use std::time::Duration;

use serde_json::Value;

use crate::descriptor::ConnectionDescriptor;
use crate::error::{McpError, Result};
use crate::protocol::{
    CallToolParams, CallToolResult, ListToolsParams, ListToolsResult, ServerInfo, ToolInfo,
};
use crate::session::Session;

/// The normalized result of one introspection run.
#[derive(Debug, Clone)]
pub struct ServerReport {
    /// Server identity from the handshake.
    pub server: ServerInfo,
    /// Every tool the server exposes, in server order.
    pub tools: Vec<ToolInfo>,
}

/// List every tool the server exposes, following pagination cursors until
/// the server stops returning one. Order is the server's. A literal
/// duplicate name is a protocol anomaly: logged, first occurrence wins.
pub fn list_tools(session: &mut Session) -> Result<Vec<ToolInfo>> {
    let mut tools = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut cursor: Option<String> = None;

    loop {
        let params = match &cursor {
            Some(c) => Some(serde_json::to_value(ListToolsParams {
                cursor: Some(c.clone()),
            })?),
            None => None,
        };

        let result = session.request("tools/list", params)?;
        let page: ListToolsResult = serde_json::from_value(result)?;

        for tool in page.tools {
            if seen.insert(tool.name.clone()) {
                tools.push(tool);
            } else {
                tracing::warn!(tool = %tool.name, "server sent duplicate tool, keeping first");
            }
        }

        match page.next_cursor {
            Some(next) => {
                // A server replaying the same cursor would loop forever.
                if cursor.as_deref() == Some(next.as_str()) {
                    return Err(McpError::protocol(format!(
                        "tools/list repeated cursor '{}'",
                        next
                    )));
                }
                cursor = Some(next);
            }
            None => break,
        }
    }

    tracing::debug!(tool_count = tools.len(), "listed MCP tools");
    Ok(tools)
}

/// Fetch the full schema record for one tool.
///
/// MCP has no finer-grained fetch than `tools/list`, so this re-lists and
/// filters. Fails with `NotFound` if the name is absent; the session stays
/// usable either way.
pub fn describe_tool(session: &mut Session, name: &str) -> Result<ToolInfo> {
    list_tools(session)?
        .into_iter()
        .find(|tool| tool.name == name)
        .ok_or_else(|| McpError::NotFound(name.to_string()))
}

/// Invoke a tool with the given arguments.
pub fn call_tool(
    session: &mut Session,
    name: &str,
    arguments: Option<Value>,
) -> Result<CallToolResult> {
    let params = CallToolParams {
        name: name.to_string(),
        arguments,
    };

    let result = session.request("tools/call", Some(serde_json::to_value(&params)?))?;
    let call_result: CallToolResult = serde_json::from_value(result)?;

    if call_result.is_error() {
        tracing::warn!(tool = %name, "tool call returned error content");
    } else {
        tracing::debug!(tool = %name, "tool call succeeded");
    }

    Ok(call_result)
}

/// Run one whole introspection pass: connect, handshake, full tool listing.
///
/// This is the entry point for callers that render documentation from the
/// returned model and never invoke anything.
pub fn introspect(descriptor: &ConnectionDescriptor, timeout: Duration) -> Result<ServerReport> {
    let mut session = Session::connect_with_timeout(descriptor, timeout)?;
    let tools = list_tools(&mut session)?;
    let server = session
        .server_info()
        .cloned()
        .ok_or_else(|| McpError::protocol("session ready without server info"))?;
    session.close();

    Ok(ServerReport { server, tools })
}
