use anyhow::{bail, Context, Result};
use std::time::Instant;

use super::CommandContext;
use crate::cli::PromptArgs;
use crate::operation::{
    ConsoleGate, Materialized, Materializer, OperationOutcome, OperationRequest,
    OperationResponse, Orchestrator, PromptRequest, PromptSource, RunOptions,
};

/// Resolve the prompt text from `--file` or the positional words.
///
/// Runs before startup so that an empty invocation fails without any
/// network activity.
pub fn read_prompt_source(args: &PromptArgs) -> Result<PromptSource> {
    if let Some(path) = &args.file {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Error reading markdown file {}", path.display()))?;
        return Ok(PromptSource::File {
            path: path.clone(),
            content,
        });
    }

    let prompt = args.prompt.join(" ");
    if prompt.trim().is_empty() {
        bail!("No prompt provided. Please provide either a prompt or a markdown file.");
    }
    Ok(PromptSource::Inline(prompt))
}

fn print_verbose_info(args: &PromptArgs, prompt: &str) {
    let file = args
        .file
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_default();

    println!("Arguments passed:");
    println!("Markdown file: {}", file);
    println!("Model: {}", args.model.as_str());
    println!("Match strength: {}", args.match_strength.as_str());
    println!("Mode: {}", args.mode.as_str());
    println!("Prompt: {}", prompt);
}

pub async fn run_prompt(
    ctx: &CommandContext,
    args: &PromptArgs,
    source: PromptSource,
    verbose: bool,
) -> Result<()> {
    let started = Instant::now();

    if verbose {
        print_verbose_info(args, source.text());
    }

    let target = ctx.target(ctx.ignore_files()?)?;
    let request = OperationRequest::generate_response(
        target,
        PromptRequest {
            prompt: source.text().to_string(),
            mode: args.mode,
            model: args.model,
            match_strength: args.match_strength,
        },
    );

    let mut orchestrator = Orchestrator::new(&ctx.client, ConsoleGate::stdio());
    let outcome = match orchestrator.run(&request, RunOptions::default()).await {
        OperationOutcome::Succeeded(OperationResponse::Generated(outcome)) => outcome,
        OperationOutcome::Failed(e) => return Err(e).context("Error making API call"),
        other => bail!("Unexpected outcome for {}: {:?}", request.name(), other),
    };

    let materializer = Materializer::new(
        &ctx.client,
        ctx.repository.chat_dir(),
        ctx.settings.model_api_key.as_deref(),
    );
    match materializer
        .materialize(&source, outcome)
        .await
        .context("Failed to save the response")?
    {
        Materialized::Informational(message) => println!("Machtiani Message: {}", message),
        Materialized::Saved { path, content } => {
            println!("{}", content);
            println!("Response saved to {}", path.display());
        }
    }

    println!("Total response handling took {:?}", started.elapsed());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::tempdir;

    #[test]
    fn test_words_are_joined() {
        let args = PromptArgs {
            prompt: vec!["how".into(), "do".into(), "I".into(), "add".into(), "stats?".into()],
            ..Default::default()
        };
        assert_eq!(
            read_prompt_source(&args).unwrap(),
            PromptSource::Inline("how do I add stats?".to_string())
        );
    }

    #[test]
    fn test_empty_prompt_is_rejected() {
        let args = PromptArgs {
            prompt: vec!["  ".into()],
            ..Default::default()
        };
        let err = read_prompt_source(&args).unwrap_err();
        assert!(err.to_string().contains("No prompt provided"));
    }

    #[test]
    fn test_file_wins_over_words() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("stats.md");
        std::fs::write(&path, "# User\n\nearlier question").unwrap();

        let args = PromptArgs {
            prompt: vec!["ignored".into()],
            file: Some(path.clone()),
            ..Default::default()
        };
        assert_eq!(
            read_prompt_source(&args).unwrap(),
            PromptSource::File {
                path,
                content: "# User\n\nearlier question".to_string()
            }
        );
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let args = PromptArgs {
            file: Some(PathBuf::from("/nonexistent/stats.md")),
            ..Default::default()
        };
        assert!(read_prompt_source(&args).is_err());
    }
}
