//! Failure taxonomy for one download.
//!
//! Every variant is fatal for the whole download. An already-complete file is
//! not an error: see [`crate::DownloadOutcome::already_complete`].

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DownloadError {
    /// Size could not be determined or the server could not be reached.
    #[error("probe failed: {0}")]
    Probe(String),

    /// Destination could not be created, opened or written.
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    /// Unexpected status code on a ranged GET.
    #[error("server error: HTTP {status} for segment {segment}")]
    Server { segment: usize, status: u32 },

    /// Transport failure or short body mid-transfer.
    #[error("network error on segment {segment}: {message}")]
    Network { segment: usize, message: String },
}

impl DownloadError {
    pub(crate) fn io(context: impl Into<String>, source: io::Error) -> Self {
        DownloadError::Io {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn network(segment: usize, message: impl fmt::Display) -> Self {
        DownloadError::Network {
            segment,
            message: message.to_string(),
        }
    }
}

/// Terminal outcome of a failed run: every collected error plus enough
/// context to tell concurrent downloads apart.
#[derive(Debug)]
pub struct DownloadFailure {
    pub url: String,
    /// `None` when the run failed before a destination was chosen.
    pub filename: Option<PathBuf>,
    pub errors: Vec<DownloadError>,
}

impl fmt::Display for DownloadFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.filename {
            Some(name) => write!(f, "download of {} ({}) failed", self.url, name.display())?,
            None => write!(f, "download of {} failed", self.url)?,
        }
        match self.errors.as_slice() {
            [] => Ok(()),
            [only] => write!(f, ": {}", only),
            many => write!(f, " with {} errors, first: {}", many.len(), many[0]),
        }
    }
}

impl std::error::Error for DownloadFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.errors
            .first()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}
