use anyhow::{bail, Result};

use super::{print_ignore_files, run_management, CommandContext};
use crate::cli::ManagementArgs;
use crate::operation::{OperationRequest, OperationResponse};

pub async fn run_git_delete(ctx: &CommandContext, args: ManagementArgs) -> Result<()> {
    let ignore_files = ctx.ignore_files()?;
    print_ignore_files(&ignore_files);

    let request = OperationRequest::delete_store(ctx.target(ignore_files)?);

    match run_management(ctx, &request, args).await? {
        Some(OperationResponse::StoreDeleted(response)) => println!("{}", response.message),
        Some(other) => bail!("Unexpected response to {}: {:?}", request.name(), other),
        None => {}
    }

    Ok(())
}
