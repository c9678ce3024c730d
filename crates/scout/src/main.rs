//! Scout - MCP server introspection and invocation CLI
//!
//! Main entry point for the Scout CLI.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use scout_mcp::McpError;

mod commands;

use commands::{call, describe, list};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// Scout - list, describe, and invoke the tools of an MCP server
#[derive(Parser)]
#[command(name = "scout")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the connection descriptor JSON
    #[arg(short, long, global = true, env = "SCOUT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Per-request timeout in seconds
    #[arg(long, global = true, default_value_t = 30)]
    pub timeout: u64,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the server's tools
    List(list::ListArgs),

    /// Print one tool's full schema
    Describe(describe::DescribeArgs),

    /// Invoke a tool with a JSON payload
    Call(call::CallArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

fn main() -> ExitCode {
    // Clap usage failures are user-input errors; keep them in that exit
    // class instead of clap's default.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = if err.use_stderr() { 1 } else { 0 };
            let _ = err.print();
            return ExitCode::from(code);
        }
    };

    // Logs go to stderr; stdout is reserved for command output.
    let filter = if cli.verbose {
        "scout=debug,scout_mcp=debug,info"
    } else {
        "scout=info,scout_mcp=warn,warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    let ctx = commands::Context {
        config: cli.config,
        timeout: Duration::from_secs(cli.timeout),
        verbose: cli.verbose,
    };

    let result = match cli.command {
        Commands::List(args) => list::run(args, &ctx),
        Commands::Describe(args) => describe::run(args, &ctx),
        Commands::Call(args) => call::run(args, &ctx),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::from(exit_code(&err))
        }
    }
}

/// Map an error to its exit class: 1 for user input, 2 for
/// connection/protocol failures.
fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<McpError>() {
        // Asking for a tool the server does not have is a user mistake;
        // the connection and protocol both worked.
        Some(McpError::NotFound(_)) => 1,
        Some(_) => 2,
        // Bad payloads, unreadable or invalid descriptors.
        None => 1,
    }
}
