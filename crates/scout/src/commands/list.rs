//! `scout list` - list the server's tools.

use anyhow::Result;
use clap::Args;
use scout_mcp::{ToolSummary, introspect};

use super::Context;

/// Arguments for `scout list`.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Include each tool's full input schema
    #[arg(long)]
    pub full: bool,
}

/// Run `scout list`.
pub fn run(args: ListArgs, ctx: &Context) -> Result<()> {
    let descriptor = ctx.descriptor()?;
    let report = introspect::introspect(&descriptor, ctx.timeout)?;

    if ctx.verbose {
        tracing::info!(
            server = %report.server.name,
            version = %report.server.version,
            tool_count = report.tools.len(),
            "listed tools"
        );
    }

    if args.full {
        println!("{}", serde_json::to_string_pretty(&report.tools)?);
    } else {
        let summaries: Vec<ToolSummary> = report.tools.iter().map(ToolSummary::from).collect();
        println!("{}", serde_json::to_string_pretty(&summaries)?);
    }

    Ok(())
}
