//! Local repository context.
//!
//! Derives the identity of the repository the CLI runs in (remote URL,
//! project root) and the ignore patterns sent along with every request.

mod git;
mod ignore_file;

pub use git::RepositoryContext;
pub use ignore_file::read_ignore_file;
