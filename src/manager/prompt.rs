//! Line input from the operator.
//!
//! Terminal reads block and cannot be cancelled, so [`StdinPrompt`] reads on
//! its own OS thread and hands lines over a channel. Dropping a pending
//! [`Prompt::read_line`] loses nothing, and no runtime task is left waiting
//! on the terminal when the menu quits.

use async_trait::async_trait;
use std::io::{self, BufRead};
use std::thread;
use tokio::sync::{Mutex, mpsc};
use tracing::debug;

/// Source of operator input, one line at a time.
///
/// Implementations must be cancel safe: a `read_line` future dropped before
/// it completes must not consume a line.
#[async_trait]
pub trait Prompt: Send + Sync {
    /// Next line without its terminator, or `None` at end of input.
    async fn read_line(&self) -> io::Result<Option<String>>;
}

/// Lines read by a background thread, stdin unless built with
/// [`StdinPrompt::from_reader`].
pub struct StdinPrompt {
    lines: Mutex<mpsc::Receiver<io::Result<String>>>,
}

impl StdinPrompt {
    pub fn new() -> Self {
        Self::from_reader(io::BufReader::new(io::stdin()))
    }

    /// Read lines from `reader` on a dedicated thread.
    ///
    /// The thread holds at most one line the caller has not asked for yet,
    /// and ends at end of input or once the prompt is dropped.
    pub fn from_reader<R>(reader: R) -> Self
    where
        R: BufRead + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(1);

        let spawned = thread::Builder::new()
            .name("edgectl-stdin".to_string())
            .spawn(move || {
                for line in reader.lines() {
                    let failed = line.is_err();
                    if tx.blocking_send(line).is_err() || failed {
                        break;
                    }
                }
                debug!("Input reader finished");
            });
        // Without a reader thread the sender is gone and reads see end of input
        if let Err(e) = spawned {
            debug!("Failed to start input reader: {}", e);
        }

        Self {
            lines: Mutex::new(rx),
        }
    }
}

impl Default for StdinPrompt {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Prompt for StdinPrompt {
    async fn read_line(&self) -> io::Result<Option<String>> {
        self.lines.lock().await.recv().await.transpose()
    }
}
