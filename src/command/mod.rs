mod context;
mod delete;
mod prompt;
mod status;
mod store;
mod sync;

pub use context::CommandContext;
pub use delete::run_git_delete;
pub use prompt::{read_prompt_source, run_prompt};
pub use status::run_status;
pub use store::run_git_store;
pub use sync::run_git_sync;

use anyhow::{Context, Result};

use crate::cli::ManagementArgs;
use crate::operation::{
    ConsoleGate, OperationOutcome, OperationRequest, OperationResponse, Orchestrator, RunOptions,
};

fn print_ignore_files(ignore_files: &[String]) {
    println!();
    println!("Ignoring files based on .machtiani.ignore:");
    if ignore_files.is_empty() {
        println!("No files to ignore.");
    } else {
        println!();
        for path in ignore_files {
            println!("{}", path);
        }
    }
}

/// Run a repository management request with console confirmation.
///
/// Returns `None` when the operation was aborted; the reason has already
/// been printed.
async fn run_management(
    ctx: &CommandContext,
    request: &OperationRequest,
    args: ManagementArgs,
) -> Result<Option<OperationResponse>> {
    let mut orchestrator = Orchestrator::new(&ctx.client, ConsoleGate::stdio());
    let options = RunOptions {
        force: args.force,
        dry_run: args.dry_run,
    };

    match orchestrator.run(request, options).await {
        OperationOutcome::Aborted { reason } => {
            println!("{}", reason);
            Ok(None)
        }
        OperationOutcome::Succeeded(response) => Ok(Some(response)),
        OperationOutcome::Failed(e) => Err(e).with_context(|| format!("Failed to {}", request.name())),
    }
}
