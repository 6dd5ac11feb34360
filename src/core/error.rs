//! Error taxonomy for the updater.
//!
//! Slipway distinguishes a small set of strongly-typed failure cases
//! ([`SlipwayError`]) from incidental I/O context, which travels through
//! [`anyhow::Error`] like the rest of the call chain. The typed variants exist
//! because callers branch on them:
//!
//! - local/recoverable conditions (corrupt local record, unreachable migration
//!   candidate, absent backup directory) are swallowed at the point of
//!   detection with a log line and a safe default,
//! - everything else propagates to `main`, is logged with its full chain, and
//!   causes exit code `1`.
//!
//! There is deliberately no "partial success" path: a run that cannot reach
//! launch fails loudly so the calling launcher gets an unambiguous signal.

use std::path::PathBuf;

use thiserror::Error;

/// Why a transfer operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferFailure {
    /// The remote endpoint could not be reached or answered with an error
    /// status (connect failure, DNS, non-2xx).
    Unreachable,
    /// The endpoint answered, but the body could not be parsed as the
    /// expected document.
    Malformed,
}

impl std::fmt::Display for TransferFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unreachable => f.write_str("unreachable"),
            Self::Malformed => f.write_str("malformed response"),
        }
    }
}

/// Enumerated error types for all protocol-level failure cases.
#[derive(Error, Debug)]
pub enum SlipwayError {
    /// A network fetch failed.
    ///
    /// Carries whether the endpoint was unreachable or returned a body that
    /// could not be parsed - the distinction matters for the manifest
    /// resolver, which treats both the same (fall back) but logs them
    /// differently.
    #[error("transfer failed ({kind}) for {url}: {reason}")]
    Transfer {
        /// URL of the failed request.
        url: String,
        /// Unreachable vs. malformed payload.
        kind: TransferFailure,
        /// Underlying transport or parse error, stringified.
        reason: String,
    },

    /// A downloaded artifact's content digest did not match the digest the
    /// manifest promised. Always fatal for that artifact, never ignored.
    #[error(
        "checksum mismatch for {}: expected {expected}, actual {actual}",
        path.display()
    )]
    HashMismatch {
        /// The file that failed verification.
        path: PathBuf,
        /// Digest the remote record supplied.
        expected: String,
        /// Digest actually computed from the file.
        actual: String,
    },

    /// The managed application is running while a build swap is required.
    /// The operator must close it first; replacing files backing a live
    /// process is never attempted.
    #[error("application '{process}' is currently running; close it and retry the update")]
    AppRunning {
        /// Process name the check matched on.
        process: String,
    },

    /// A required section is absent from the remote manifest (e.g. no `build`
    /// record at all). A missing `updater` section is *not* an error.
    #[error("remote manifest is missing required section '{field}'")]
    MissingRemoteField {
        /// Name of the absent section.
        field: String,
    },

    /// Persisting the local manifest record failed. Read-side problems are
    /// recovered locally (empty record) and never surface as this error.
    #[error("failed to persist local state at {}", path.display())]
    StateIo {
        /// Path of the record (or its temp sibling) that failed.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A rename in the build swap sequence failed. One best-effort rollback
    /// is attempted before this propagates.
    #[error("build swap failed renaming {} -> {}", from.display(), to.display())]
    Swap {
        /// Rename source.
        from: PathBuf,
        /// Rename destination.
        to: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}
