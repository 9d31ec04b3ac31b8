//! Yes/no confirmation before a mutating remote operation.
//!
//! Anything other than a plain `y` (case-insensitive, surrounding
//! whitespace ignored) declines. Read errors decline as well.

use std::io::{BufRead, BufReader, Stdin, Stdout, Write};
use tracing::{debug, warn};

pub const CONFIRMATION_PROMPT: &str = "Do you wish to proceed? (y/n): ";

/// Decides whether an operation may go ahead.
pub trait ConfirmationGate {
    fn should_proceed(&mut self, forced: bool) -> bool;
}

/// `true` iff the answer is exactly `y`, ignoring case and surrounding whitespace.
pub fn is_affirmative(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case("y")
}

/// Asks on a console-like reader/writer pair.
pub struct ConsoleGate<R, W> {
    input: R,
    output: W,
}

impl ConsoleGate<BufReader<Stdin>, Stdout> {
    /// Gate bound to the process's stdin and stdout.
    pub fn stdio() -> Self {
        Self::new(BufReader::new(std::io::stdin()), std::io::stdout())
    }
}

impl<R: BufRead, W: Write> ConsoleGate<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> ConfirmationGate for ConsoleGate<R, W> {
    fn should_proceed(&mut self, forced: bool) -> bool {
        if forced {
            debug!("Confirmation skipped (--force)");
            return true;
        }

        if let Err(e) = write!(self.output, "{}", CONFIRMATION_PROMPT).and_then(|_| self.output.flush())
        {
            warn!("Failed to write confirmation prompt: {}", e);
        }

        let mut answer = String::new();
        match self.input.read_line(&mut answer) {
            Ok(_) => is_affirmative(&answer),
            Err(e) => {
                warn!("Failed to read confirmation answer: {}", e);
                false
            }
        }
    }
}
