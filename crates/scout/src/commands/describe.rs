//! `scout describe` - print one tool's full schema.

use anyhow::Result;
use clap::Args;
use scout_mcp::introspect;

use super::Context;

/// Arguments for `scout describe`.
#[derive(Args, Debug)]
pub struct DescribeArgs {
    /// Name of the tool to describe
    pub name: String,
}

/// Run `scout describe`.
pub fn run(args: DescribeArgs, ctx: &Context) -> Result<()> {
    let mut session = ctx.connect()?;
    let tool = introspect::describe_tool(&mut session, &args.name)?;
    session.close();

    println!("{}", serde_json::to_string_pretty(&tool)?);
    Ok(())
}
