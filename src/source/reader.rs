//! Blocking source reader
//!
//! Reads newline-delimited records from a named pipe and pushes them into
//! the decoupling queue. Open and read on a FIFO block for unbounded time
//! (a read open blocks until a writer appears), so the adapter runs on a
//! dedicated thread, never on the async runtime.

use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use crate::registry::Line;

use super::queue::LineSender;

/// Delay before re-checking a source path that does not exist yet
pub const DEFAULT_ABSENT_RETRY: Duration = Duration::from_millis(200);

/// Delay before reopening the source after an open/read error
pub const DEFAULT_ERROR_RETRY: Duration = Duration::from_millis(100);

/// Create the pipe rendezvous point if nothing exists at `path`
///
/// The external writer may also create it first; either order works. On
/// non-unix targets a regular file stands in for the FIFO.
pub fn ensure_fifo(path: &Path) -> std::io::Result<()> {
    if path.exists() {
        return Ok(());
    }

    #[cfg(unix)]
    {
        use nix::sys::stat::Mode;
        use nix::unistd::mkfifo;

        mkfifo(path, Mode::S_IRUSR | Mode::S_IWUSR).map_err(std::io::Error::other)?;
    }

    #[cfg(not(unix))]
    {
        File::create(path)?;
    }

    tracing::info!(path = %path.display(), "Created pipe");
    Ok(())
}

/// How one reader session (open to end-of-stream) finished
enum SessionEnd {
    /// Writer closed its end; reopen and keep reading
    Eof,
    /// Read failed mid-session; back off and reopen
    IoError(std::io::Error),
    /// Queue consumer is gone; the process is shutting down
    ConsumerGone,
}

/// Continuously produces lines from the source path
///
/// Runs forever: a missing path and every I/O error are transient states
/// recovered with a short delay, and end-of-stream means the writer closed
/// its end, not that the source is exhausted. Nothing here is ever surfaced
/// to subscribers.
pub struct SourceAdapter {
    path: PathBuf,
    absent_retry: Duration,
    error_retry: Duration,
    tx: LineSender,
}

impl SourceAdapter {
    /// Create an adapter for the given source path
    pub fn new(path: impl Into<PathBuf>, tx: LineSender) -> Self {
        Self {
            path: path.into(),
            absent_retry: DEFAULT_ABSENT_RETRY,
            error_retry: DEFAULT_ERROR_RETRY,
            tx,
        }
    }

    /// Set the retry delay for a source path that does not exist yet
    pub fn absent_retry(mut self, delay: Duration) -> Self {
        self.absent_retry = delay;
        self
    }

    /// Set the retry delay after an open/read error
    pub fn error_retry(mut self, delay: Duration) -> Self {
        self.error_retry = delay;
        self
    }

    /// Start the reader on its own named thread
    pub fn spawn(self) -> std::io::Result<thread::JoinHandle<()>> {
        thread::Builder::new()
            .name("pipecast-source".into())
            .spawn(move || self.run())
    }

    fn run(self) {
        tracing::debug!(path = %self.path.display(), "Source reader started");

        loop {
            match File::open(&self.path) {
                Ok(file) => match drain_session(BufReader::new(file), &self.tx) {
                    // Writer closed its end; the next open waits for a new writer
                    SessionEnd::Eof => continue,
                    SessionEnd::IoError(e) => {
                        tracing::warn!(
                            path = %self.path.display(),
                            error = %e,
                            "Source read failed, reopening"
                        );
                        thread::sleep(self.error_retry);
                    }
                    SessionEnd::ConsumerGone => break,
                },
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    // Writer has not created the pipe yet; expected at startup
                    tracing::trace!(path = %self.path.display(), "Source not present yet");
                    thread::sleep(self.absent_retry);
                }
                Err(e) => {
                    tracing::warn!(
                        path = %self.path.display(),
                        error = %e,
                        "Failed to open source, retrying"
                    );
                    thread::sleep(self.error_retry);
                }
            }
        }

        tracing::debug!(path = %self.path.display(), "Source reader stopped");
    }
}

/// Read one writer session to end-of-stream, pushing each record
///
/// `lines()` strips the trailing delimiter, so subscribers receive the bare
/// record text.
fn drain_session<R: BufRead>(reader: R, tx: &LineSender) -> SessionEnd {
    for record in reader.lines() {
        match record {
            Ok(text) => {
                if tx.push(Line::new(text)).is_err() {
                    return SessionEnd::ConsumerGone;
                }
            }
            Err(e) => return SessionEnd::IoError(e),
        }
    }

    SessionEnd::Eof
}
