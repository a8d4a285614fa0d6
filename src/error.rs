use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while configuring or running a scan.
#[derive(Error, Debug)]
pub enum ScanError {
    // Config
    #[error("no root directory provided")]
    MissingRoot,

    #[error("no patient filter provided")]
    MissingFilter,

    #[error("invalid patient filter: {0}")]
    InvalidFilter(String),

    #[error("concurrency cap must be at least 1")]
    InvalidConcurrency,

    // Traversal
    #[error("cannot list directory")]
    List {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot read entry metadata")]
    Stat {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported entry type")]
    Unsupported { path: PathBuf },

    #[error("cannot read file")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("file rejected")]
    Rejected {
        path: PathBuf,
        #[source]
        source: TagError,
    },

    #[error("cannot delete rejected path")]
    Delete {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Runtime
    #[error("branch task failed: {reason}")]
    Task { path: PathBuf, reason: String },
}

impl ScanError {
    /// The path this error occurred at, if applicable.
    /// Callers use this to present "Skipped: <path>" without pattern matching on variants.
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::List { path, .. }
            | Self::Stat { path, .. }
            | Self::Unsupported { path }
            | Self::Read { path, .. }
            | Self::Rejected { path, .. }
            | Self::Delete { path, .. }
            | Self::Task { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Whether the scan continues past this error.
    ///
    /// Traversal errors are absorbed into
    /// [`ScanReport::skipped`](crate::ScanReport::skipped) and only cost
    /// their own subtree.
    ///
    /// Configuration errors abort [`run()`](crate::ScanBuilder::run) before
    /// any filesystem work starts.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            Self::MissingRoot
                | Self::MissingFilter
                | Self::InvalidFilter(_)
                | Self::InvalidConcurrency
        )
    }
}

/// Errors from extracting patient tags out of raw file bytes.
///
/// Returned by [`TagParser`](crate::TagParser) implementations. Either kind
/// rejects the file.
#[derive(Error, Debug)]
pub enum TagError {
    /// The bytes do not decode as a DICOM stream.
    #[error("not a DICOM stream: {0}")]
    NotDicom(String),

    /// The stream decoded but a required tag is absent.
    #[error("missing tag {0}")]
    MissingTag(&'static str),
}
