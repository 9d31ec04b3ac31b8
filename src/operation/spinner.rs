//! Progress indicator shown while a long-running request is outstanding.
//!
//! The spinner runs as its own task and only listens for a stop signal; it
//! never touches operation state. Dropping a [`Spinner`] without calling
//! [`Spinner::stop`] still cancels the task.

use std::io::Write;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Time between frames.
pub const SPINNER_INTERVAL: Duration = Duration::from_millis(100);

const FRAMES: [char; 4] = ['|', '/', '-', '\\'];

pub struct Spinner {
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl Spinner {
    /// Start spinning on `out`. Must be called within a tokio runtime.
    pub fn start_with<W>(mut out: W) -> Self
    where
        W: Write + Send + 'static,
    {
        let token = CancellationToken::new();
        let stop = token.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(SPINNER_INTERVAL);
            let mut frame = 0;

            loop {
                tokio::select! {
                    biased;
                    _ = stop.cancelled() => break,
                    _ = ticker.tick() => {
                        let _ = write!(out, "\r{}", FRAMES[frame]);
                        let _ = out.flush();
                        frame = (frame + 1) % FRAMES.len();
                    }
                }
            }

            // Blank out the last frame.
            let _ = write!(out, "\r \r");
            let _ = out.flush();
        });

        Self {
            token,
            handle: Some(handle),
        }
    }

    /// Signal the spinner to stop and wait until its line is cleared.
    pub async fn stop(mut self) {
        self.token.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                debug!("Spinner task ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
