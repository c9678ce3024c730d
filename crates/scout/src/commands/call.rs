//! `scout call` - invoke a tool with a JSON payload.

use anyhow::{Result, anyhow};
use clap::Args;
use scout_mcp::{ToolContent, introspect};
use serde::Deserialize;
use serde_json::Value;

use super::Context;

/// Arguments for `scout call`.
#[derive(Args, Debug)]
pub struct CallArgs {
    /// Tool call as JSON: {"tool": "name", "arguments": {...}}
    pub payload: String,
}

/// The structured call payload.
#[derive(Debug, Deserialize)]
struct CallPayload {
    tool: String,
    #[serde(default)]
    arguments: Option<Value>,
}

/// Run `scout call`.
pub fn run(args: CallArgs, ctx: &Context) -> Result<()> {
    // Validate the payload before touching the network: a bad payload is a
    // user-input error, not a protocol error.
    let payload: CallPayload = serde_json::from_str(&args.payload).map_err(|e| {
        anyhow!(
            "invalid call payload: {} (expected {{\"tool\": \"name\", \"arguments\": {{...}}}})",
            e
        )
    })?;

    let mut session = ctx.connect()?;
    let result = introspect::call_tool(&mut session, &payload.tool, payload.arguments)?;
    session.close();

    if result.is_error() {
        // The invocation mechanics succeeded; the tool reported its own
        // failure. Print its content and exit 0.
        tracing::warn!(tool = %payload.tool, "tool reported an error");
    }

    for block in &result.content {
        match block {
            ToolContent::Text { text } => println!("{}", text),
            other => println!("{}", serde_json::to_string_pretty(other)?),
        }
    }

    Ok(())
}
