use anyhow::{Context, Result};

use super::CommandContext;
use crate::api::StatusResponse;

pub async fn run_status(ctx: &CommandContext) -> Result<()> {
    let status = ctx
        .client
        .status(
            &ctx.repository.remote_url,
            ctx.settings.code_host_api_key.as_deref(),
        )
        .await
        .context("Failed to check status")?;

    println!("{}", render_status(&status));
    Ok(())
}

fn render_status(status: &StatusResponse) -> String {
    if status.lock_file_present {
        format!(
            "Project is getting processed and not ready for chat.\nLock duration: {}",
            status.lock_duration_hms()
        )
    } else {
        "Project is ready for chat!".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_locked() {
        let status = StatusResponse {
            lock_file_present: true,
            lock_time_duration: 3665.0,
        };
        assert_eq!(
            render_status(&status),
            "Project is getting processed and not ready for chat.\nLock duration: 01:01:05"
        );
    }

    #[test]
    fn test_render_ready() {
        let status = StatusResponse {
            lock_file_present: false,
            lock_time_duration: 12.0,
        };
        assert_eq!(render_status(&status), "Project is ready for chat!");
    }
}
