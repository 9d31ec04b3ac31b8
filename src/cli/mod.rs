mod args;
mod paths;

pub use args::{Cli, Commands, ManagementArgs, MatchStrength, Mode, Model, PromptArgs};
pub use paths::{resolve_project_root, CHAT_DIR, IGNORE_FILE_NAME};
