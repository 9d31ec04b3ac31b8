use anyhow::Result;
use clap::{CommandFactory, Parser};
use tracing_subscriber::{fmt, EnvFilter};

mod api;
mod cli;
mod command;
mod config;
mod error;
mod operation;
mod workspace;

use cli::{Cli, Commands};
use command::CommandContext;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins; stdout is reserved for user-facing output.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("warn")
        }
    });

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let Some(subcommand) = &cli.command else {
        if cli.prompt.is_empty() {
            Cli::command().print_help()?;
            return Ok(());
        }
        // A bare invocation is a prompt; validate it before touching the network.
        let source = command::read_prompt_source(&cli.prompt)?;
        let ctx = CommandContext::prepare(&cli).await?;
        return command::run_prompt(&ctx, &cli.prompt, source, cli.verbose).await;
    };

    let ctx = CommandContext::prepare(&cli).await?;
    match subcommand {
        Commands::Status => command::run_status(&ctx).await?,
        Commands::GitStore(args) => command::run_git_store(&ctx, *args).await?,
        Commands::GitSync {
            branch_name,
            management,
        } => command::run_git_sync(&ctx, branch_name, *management).await?,
        Commands::GitDelete(args) => command::run_git_delete(&ctx, *args).await?,
    }

    Ok(())
}
