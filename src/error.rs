// Copyright 2026 Manual Mirror Contributors
// SPDX-License-Identifier: Apache-2.0

//! Error taxonomy for the mirror engine.
//!
//! Leaf-level failures (`AcquisitionError`) are caught and logged by the
//! tree walker. Directory failures (`FilesystemError`) propagate, except
//! `AlreadyExists`, which the materializer treats as success.

use std::path::PathBuf;
use std::time::Duration;

/// Failure while creating a directory of the mirror tree.
#[derive(thiserror::Error, Debug)]
pub enum FilesystemError {
    /// The directory is already there. The only recoverable variant.
    #[error("directory already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    #[error("path exists and is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("permission denied creating {}", path.display())]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FilesystemError {
    /// Classify an I/O error raised while creating `path`.
    pub fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::AlreadyExists if path.is_dir() => Self::AlreadyExists(path),
            std::io::ErrorKind::AlreadyExists => Self::NotADirectory(path),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path, source },
            _ => Self::Io { path, source },
        }
    }

    /// Whether the tree walker may continue past this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::AlreadyExists(_))
    }
}

/// Failure while turning one leaf reference into a local document.
#[derive(thiserror::Error, Debug)]
pub enum AcquisitionError {
    #[error("invalid reference {reference:?}: {source}")]
    InvalidReference {
        reference: String,
        #[source]
        source: url::ParseError,
    },

    /// The ToC produced an empty or placeholder value where a name or
    /// reference was expected.
    #[error("malformed leaf: {0:?} is a placeholder, not a reference")]
    Placeholder(String),

    #[error("{stage} did not finish within {}s", after.as_secs())]
    Timeout { stage: Stage, after: Duration },

    #[error("neither load nor download fired (load: {load:#}; download: {download:#})")]
    SignalsLost {
        load: anyhow::Error,
        download: anyhow::Error,
    },

    #[error("{stage} failed: {source:#}")]
    Session {
        stage: Stage,
        #[source]
        source: anyhow::Error,
    },
}

/// The suspension points of a single acquisition, used in error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Arm,
    Navigate,
    Settle,
    Inspect,
    Redirect,
    Download,
    Save,
    Render,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Arm => "arming page signals",
            Stage::Navigate => "navigation",
            Stage::Settle => "waiting for load or download",
            Stage::Inspect => "reading page state",
            Stage::Redirect => "re-navigating to resolved document",
            Stage::Download => "waiting for download",
            Stage::Save => "saving download",
            Stage::Render => "rendering page to PDF",
        };
        f.write_str(s)
    }
}

/// Failure that aborts the traversal of a subtree.
#[derive(thiserror::Error, Debug)]
pub enum WalkError {
    #[error(transparent)]
    Filesystem(#[from] FilesystemError),

    #[error("malformed ToC: section name {name:?} under {} is a placeholder", parent.display())]
    MalformedNode { name: String, parent: PathBuf },
}

/// Failure fetching or parsing the remote table of contents.
#[derive(thiserror::Error, Debug)]
pub enum TocError {
    #[error("Manual {0} doesn't appear to exist-- are you sure the ID is right?")]
    NotFound(String),

    #[error("unexpected HTTP {status} fetching ToC for manual {manual}")]
    Status { manual: String, status: u16 },

    #[error("unknown error getting ToC XML for manual {manual}: {source}")]
    Request {
        manual: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("invalid ToC URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("ToC XML parse error: {0}")]
    Parse(String),
}
