//! Where key combinations come from.
//!
//! Global keyboard hooks are platform specific; everything above this module
//! only sees parsed [`Combo`]s delivered by a [`HotkeySource`].

use std::io::{BufRead, BufReader, Stdin};
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use crate::combo::Combo;
use crate::error::HotkeyError;

/// Blocking producer of pressed combinations.
pub trait HotkeySource: Send {
    /// Wait for the next combination. `None` means the source is exhausted.
    ///
    /// # Errors
    ///
    /// [`HotkeyError::Source`] when the underlying device fails.
    fn recv(&mut self) -> Result<Option<Combo>, HotkeyError>;
}

/// Reads one combination per line, e.g. from stdin.
///
/// Blank lines are skipped; lines that do not parse are reported and skipped.
#[derive(Debug)]
pub struct ConsoleSource<R> {
    reader: R,
    line: String,
}

impl<R: BufRead + Send> ConsoleSource<R> {
    /// Source over `reader`.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::new(),
        }
    }
}

impl ConsoleSource<BufReader<Stdin>> {
    /// Source over the process stdin.
    pub fn stdin() -> Self {
        Self::new(BufReader::new(std::io::stdin()))
    }
}

impl<R: BufRead + Send> HotkeySource for ConsoleSource<R> {
    fn recv(&mut self) -> Result<Option<Combo>, HotkeyError> {
        loop {
            self.line.clear();
            if self.reader.read_line(&mut self.line)? == 0 {
                return Ok(None);
            }
            let text = self.line.trim();
            if text.is_empty() {
                continue;
            }
            match Combo::parse(text) {
                Ok(combo) => return Ok(Some(combo)),
                Err(e) => warn!(error = %e, "Ignoring input"),
            }
        }
    }
}

/// Drive `source` on a dedicated thread and forward combinations to the
/// returned channel.
///
/// The thread ends when the source is exhausted, fails, or the receiver is
/// dropped; a thread blocked in [`HotkeySource::recv`] is left behind at
/// process exit.
pub fn spawn_source<S>(mut source: S, capacity: usize) -> mpsc::Receiver<Combo>
where
    S: HotkeySource + 'static,
{
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let spawned = std::thread::Builder::new()
        .name("hotkey-source".to_string())
        .spawn(move || {
            loop {
                match source.recv() {
                    Ok(Some(combo)) => {
                        if tx.blocking_send(combo).is_err() {
                            break;
                        }
                    }
                    Ok(None) => {
                        debug!("Hotkey source exhausted");
                        break;
                    }
                    Err(e) => {
                        error!(error = %e, "Hotkey source failed");
                        break;
                    }
                }
            }
        });
    if let Err(e) = spawned {
        error!(error = %e, "Failed to start hotkey source thread");
    }
    rx
}
