use anyhow::{bail, Result};
use tracing::debug;

use super::{print_ignore_files, run_management, CommandContext};
use crate::cli::ManagementArgs;
use crate::operation::{OperationRequest, OperationResponse};

pub async fn run_git_store(ctx: &CommandContext, args: ManagementArgs) -> Result<()> {
    let ignore_files = ctx.ignore_files()?;
    print_ignore_files(&ignore_files);

    let request = OperationRequest::add_repository(ctx.target(ignore_files)?);

    match run_management(ctx, &request, args).await? {
        Some(OperationResponse::RepositoryAdded(response)) => {
            debug!(
                full_path = %response.full_path,
                api_key_provided = response.api_key_provided,
                openai_api_key_provided = response.openai_api_key_provided,
                "Repository registered"
            );
            println!("{}", response.message);
            println!("---");
            println!("Your repo is getting added to machtiani is in progress!");
            println!("Please check back by running `machtiani status` to see if it completed.");
        }
        Some(other) => bail!("Unexpected response to {}: {:?}", request.name(), other),
        None => {}
    }

    Ok(())
}
