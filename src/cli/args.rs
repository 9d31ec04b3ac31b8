use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Machtiani CLI - chat with your code repository
///
/// Without a subcommand, the remaining words are sent as a prompt and the
/// answer is saved as a markdown transcript under .machtiani/chat.
#[derive(Parser)]
#[command(name = "machtiani")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Name of the git remote identifying the repository
    #[arg(long, global = true, default_value = "origin")]
    pub remote: String,

    /// Path to the settings file (defaults to ./.machtiani-config.yml, then ~/.machtiani-config.yml)
    #[arg(long, global = true, env = "MACHTIANI_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub prompt: PromptArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check whether the current project is ready for chat
    Status,
    /// Add the repository to Machtiani
    GitStore(ManagementArgs),
    /// Fetch and checkout a branch of the repository
    GitSync {
        /// Name of the branch to sync
        #[arg(long)]
        branch_name: String,

        #[command(flatten)]
        management: ManagementArgs,
    },
    /// Remove the repository from Machtiani
    GitDelete(ManagementArgs),
}

/// Flags shared by the repository management commands.
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct ManagementArgs {
    /// Skip the confirmation prompt and proceed with the operation
    #[arg(long)]
    pub force: bool,

    /// Show the token estimate without changing anything
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct PromptArgs {
    /// Prompt to send
    pub prompt: Vec<String>,

    /// Markdown file whose content is used as the prompt
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Model to use
    #[arg(long, value_enum, default_value_t = Model::Gpt4oMini)]
    pub model: Model,

    /// Conversation strategy
    #[arg(long, value_enum, default_value_t = Mode::Commit)]
    pub mode: Mode,

    /// Retrieval sensitivity for locating relevant code
    #[arg(long, value_enum, default_value_t = MatchStrength::Mid)]
    pub match_strength: MatchStrength,
}

impl PromptArgs {
    /// No prompt words and no `--file`: nothing to send.
    pub fn is_empty(&self) -> bool {
        self.prompt.is_empty() && self.file.is_none()
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Model {
    #[value(name = "gpt-4o")]
    Gpt4o,
    #[default]
    #[value(name = "gpt-4o-mini")]
    Gpt4oMini,
}

impl Model {
    pub fn as_str(&self) -> &'static str {
        match self {
            Model::Gpt4o => "gpt-4o",
            Model::Gpt4oMini => "gpt-4o-mini",
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    PureChat,
    #[default]
    Commit,
    Super,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::PureChat => "pure-chat",
            Mode::Commit => "commit",
            Mode::Super => "super",
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MatchStrength {
    High,
    #[default]
    Mid,
    Low,
}

impl MatchStrength {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStrength::High => "high",
            MatchStrength::Mid => "mid",
            MatchStrength::Low => "low",
        }
    }
}
