//! Upload Backend Abstraction
//!
//! Defines the contract between the upload orchestrator and the backend
//! client libraries. Two structurally different protocols share one trait:
//! a two-phase backend (Transkribus) that requires a server-side container
//! handshake before any file transfer, and a direct backend (Dropbox) that
//! accepts file writes immediately. The orchestrator consults the
//! `requires_container` capability flag instead of downcasting.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::{BridgeError, Result};

/// Backend-assigned identifier for a remote upload container.
///
/// Two-phase backends hand one out per document title during container
/// resolution; every file of that title is transferred against it. The
/// identifier must survive process restarts so an interrupted upload can be
/// resumed by polling instead of creating a duplicate remote container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UploadId(i64);

impl UploadId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for UploadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for UploadId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Supported archival backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Scholarly-transcription platform; two-phase upload protocol.
    Transkribus,
    /// Generic cloud storage; direct file writes.
    Dropbox,
}

impl BackendKind {
    /// Human-readable display name for notifications and logs.
    pub fn display_name(&self) -> &'static str {
        match self {
            BackendKind::Transkribus => "Transkribus",
            BackendKind::Dropbox => "Dropbox",
        }
    }

    /// Whether this backend needs a container handshake before accepting
    /// file transfers.
    pub fn requires_container(&self) -> bool {
        matches!(self, BackendKind::Transkribus)
    }

    /// String representation used in the persisted queue document.
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Transkribus => "transkribus",
            BackendKind::Dropbox => "dropbox",
        }
    }
}

impl FromStr for BackendKind {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "transkribus" => Ok(BackendKind::Transkribus),
            "dropbox" => Ok(BackendKind::Dropbox),
            _ => Err(BridgeError::NotAvailable(format!("backend kind: {}", s))),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Terminal signal from a single file transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    /// The backend accepted and stored the file during this call.
    Completed,
    /// The remote side already holds this file from a prior attempt; no
    /// bytes were transferred. Only two-phase backends report this.
    AlreadyFinished,
}

/// One title's container handshake result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerAssignment {
    pub title: String,
    pub upload_id: UploadId,
}

/// Client-library contract for one file's transfer.
///
/// Implementations wrap the actual wire protocol (out of scope here) and
/// must support independent success/error completion per call. The
/// orchestrator never issues two calls concurrently.
#[async_trait]
pub trait UploadBackend: Send + Sync {
    /// Which backend this adapter talks to.
    fn kind(&self) -> BackendKind;

    /// Capability flag: true when `resolve_containers`/`poll_unfinished`
    /// must run before file transfers.
    fn requires_container(&self) -> bool {
        self.kind().requires_container()
    }

    /// Transfer one local file. `upload_id` is present iff the owning
    /// record belongs to a two-phase container.
    async fn upload_file(&self, path: &Path, upload_id: Option<UploadId>) -> Result<UploadOutcome>;

    /// Two-phase only: create or resolve the remote container for each
    /// title, yielding one upload id per title. May report
    /// [`BridgeError::FilesDeleted`] when the backend detects that the
    /// local artifacts backing a title are gone.
    async fn resolve_containers(&self, titles: &[String]) -> Result<Vec<ContainerAssignment>> {
        let _ = titles;
        Err(BridgeError::NotAvailable("resolve_containers".to_string()))
    }

    /// Two-phase only: file names the remote container still considers
    /// unfinished. An empty list means the upload completed remotely in a
    /// prior attempt.
    async fn poll_unfinished(&self, upload_id: UploadId) -> Result<Vec<String>> {
        let _ = upload_id;
        Err(BridgeError::NotAvailable("poll_unfinished".to_string()))
    }
}
