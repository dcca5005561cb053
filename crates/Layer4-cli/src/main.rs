//! Kiln CLI - Main entry point

mod cli;
mod confirm;
mod hooks;
mod session;

use clap::{Parser, Subcommand};
use kiln_foundation::ApprovalMode;
use session::{Session, SessionOptions};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Kiln - tool-call orchestration for a terminal coding agent
#[derive(Parser, Debug)]
#[command(name = "kiln")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Approval mode (ask, auto-edit, yolo)
    #[arg(long, global = true)]
    approval_mode: Option<ApprovalMode>,

    /// Sandbox (true, false, docker, podman, sandbox-exec)
    #[arg(long, global = true)]
    sandbox: Option<String>,

    /// Sandbox container image
    #[arg(long, global = true)]
    sandbox_image: Option<String>,

    /// Working directory (defaults to the current directory)
    #[arg(long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Execute one tool without confirmation and print the response
    Exec {
        /// Tool name
        tool: String,
        /// Tool parameters as a JSON object
        #[arg(short, long)]
        params: Option<String>,
        /// Call ID (generated when omitted)
        #[arg(long)]
        call_id: Option<String>,
    },
    /// Run a JSON array of tool calls through the scheduler
    Batch {
        /// Path to the batch file
        file: PathBuf,
        /// Agent profile to apply
        #[arg(short, long)]
        agent: Option<String>,
    },
    /// List agent profiles
    Agents {
        /// Show the composed system prompt
        #[arg(long)]
        prompt: bool,
    },
    /// List tools
    Tools {
        /// Only tools available to this agent
        #[arg(short, long)]
        agent: Option<String>,
        /// Print function declarations as JSON
        #[arg(long)]
        json: bool,
    },
    /// Fire the hooks configured for an event
    Hook {
        /// Event name (SessionStart, PreToolUse, ...)
        event: String,
        /// Matcher target (tool name)
        #[arg(long)]
        target: Option<String>,
        /// Wait for hooks to finish
        #[arg(long)]
        blocking: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging (stdout은 결과 출력용)
    let log_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let session = Session::open(SessionOptions {
        working_dir: args.cwd,
        approval_mode: args.approval_mode,
        sandbox: args.sandbox,
        sandbox_image: args.sandbox_image,
    })?;

    let ok = match args.command {
        Command::Exec {
            tool,
            params,
            call_id,
        } => cli::run_exec(&session, &tool, params.as_deref(), call_id).await?,
        Command::Batch { file, agent } => cli::run_batch(&session, &file, agent.as_deref()).await?,
        Command::Agents { prompt } => {
            cli::run_agents(&session, prompt);
            true
        }
        Command::Tools { agent, json } => {
            cli::run_tools(&session, agent.as_deref(), json)?;
            true
        }
        Command::Hook {
            event,
            target,
            blocking,
        } => {
            cli::run_hook(&session, &event, target.as_deref(), blocking).await?;
            true
        }
    };

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}
