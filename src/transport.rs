//! Transport collaborators
//!
//! The engine never performs network I/O; raw text is obtained before the
//! engine runs. This module defines that seam: an opaque error, the
//! [`Transport`] trait, and a file-backed implementation that replays
//! previously captured output. Real session transports (ssh and friends)
//! implement the trait outside this crate.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Opaque failure from a transport provider. This crate never interprets or
/// retries it; it passes through unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Options a transport may honor when fetching output.
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    /// Advisory overall deadline.
    pub timeout: Option<Duration>,
}

/// A source of raw command output for a named target.
pub trait Transport {
    fn fetch_output(
        &self,
        target: &str,
        command: &str,
        options: &FetchOptions,
    ) -> Result<String, TransportError>;
}

/// Replays captured output from disk: `<root>/<target>/<command>`, with
/// spaces in the command replaced by underscores.
#[derive(Debug, Clone)]
pub struct FileTransport {
    root: PathBuf,
}

impl FileTransport {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn capture_path(&self, target: &str, command: &str) -> PathBuf {
        self.root.join(target).join(command.replace(' ', "_"))
    }
}

impl Transport for FileTransport {
    fn fetch_output(
        &self,
        target: &str,
        command: &str,
        _options: &FetchOptions,
    ) -> Result<String, TransportError> {
        let path = self.capture_path(target, command);
        fs::read_to_string(&path)
            .map_err(|e| TransportError(format!("failed to read capture {}: {e}", path.display())))
    }
}
