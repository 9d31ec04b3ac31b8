use anyhow::{bail, Result};

use super::{print_ignore_files, run_management, CommandContext};
use crate::cli::ManagementArgs;
use crate::operation::{OperationRequest, OperationResponse};

pub async fn run_git_sync(
    ctx: &CommandContext,
    branch_name: &str,
    args: ManagementArgs,
) -> Result<()> {
    let ignore_files = ctx.ignore_files()?;
    print_ignore_files(&ignore_files);

    let target = ctx.target(ignore_files)?;
    let request = OperationRequest::sync_branch(target, branch_name)?;

    match run_management(ctx, &request, args).await? {
        Some(OperationResponse::BranchSynced { body }) => {
            println!(
                "Successfully synced the repository: {}.\nServer response: {}",
                request.target().project_name(),
                body
            );
        }
        Some(other) => bail!("Unexpected response to {}: {:?}", request.name(), other),
        None => {}
    }

    Ok(())
}
