//! # Sync Records
//!
//! The unit of work for the upload queue: one local file, its backend
//! affinity, and its upload state.
//!
//! ## State Machine
//!
//! ```text
//! NotUploaded → AwaitingUpload → Uploaded
//! ```
//!
//! Transitions only move forward. A record never regresses except by being
//! removed and re-enqueued; the crash-recovery reset from `AwaitingUpload`
//! back to `NotUploaded` is the one sanctioned exception, because an
//! interrupted transfer's outcome is unknown and the file must be retried.

use crate::{Result, SyncError};
use bridge_traits::{BackendKind, UploadId};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

// ============================================================================
// Upload State
// ============================================================================

/// Where a record stands in its upload lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadState {
    /// Queued; no transfer issued yet.
    NotUploaded,
    /// A transfer for this file is (or was) in flight; outcome unknown.
    AwaitingUpload,
    /// The backend confirmed the transfer.
    Uploaded,
}

impl UploadState {
    /// String representation used in the persisted queue document.
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadState::NotUploaded => "not_uploaded",
            UploadState::AwaitingUpload => "awaiting_upload",
            UploadState::Uploaded => "uploaded",
        }
    }

    /// Check if this state is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, UploadState::Uploaded)
    }
}

impl FromStr for UploadState {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "not_uploaded" => Ok(UploadState::NotUploaded),
            "awaiting_upload" => Ok(UploadState::AwaitingUpload),
            "uploaded" => Ok(UploadState::Uploaded),
            _ => Err(SyncError::InvalidState(s.to_string())),
        }
    }
}

impl std::fmt::Display for UploadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Sync Record
// ============================================================================

/// One file's upload bookkeeping entry.
///
/// `file_path` and `backend` are fixed at creation; only `state` advances,
/// and `upload_id` is assigned once during container resolution for
/// two-phase backends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncRecord {
    /// Identifier of the local artifact.
    pub file_path: PathBuf,
    /// Which backend adapter owns this record.
    pub backend: BackendKind,
    /// Container identifier, present for two-phase backends only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_id: Option<UploadId>,
    /// Current lifecycle state.
    pub state: UploadState,
}

impl SyncRecord {
    /// Create a record for a direct backend.
    pub fn new(file_path: impl Into<PathBuf>, backend: BackendKind) -> Self {
        Self {
            file_path: file_path.into(),
            backend,
            upload_id: None,
            state: UploadState::NotUploaded,
        }
    }

    /// Create a record bound to a two-phase container.
    pub fn with_container(
        file_path: impl Into<PathBuf>,
        backend: BackendKind,
        upload_id: UploadId,
    ) -> Self {
        Self {
            file_path: file_path.into(),
            backend,
            upload_id: Some(upload_id),
            state: UploadState::NotUploaded,
        }
    }

    /// The file name component, as two-phase status polling reports it.
    pub fn file_name(&self) -> Option<&str> {
        self.file_path.file_name().and_then(|n| n.to_str())
    }

    pub fn matches_path(&self, path: &Path) -> bool {
        self.file_path == path
    }

    /// Advance the record's state.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidStateTransition`] for anything but a
    /// forward step or the crash-recovery reset
    /// (`AwaitingUpload → NotUploaded`).
    pub fn transition(&mut self, to: UploadState) -> Result<()> {
        let valid = matches!(
            (self.state, to),
            (UploadState::NotUploaded, UploadState::AwaitingUpload)
                | (UploadState::AwaitingUpload, UploadState::Uploaded)
                | (UploadState::AwaitingUpload, UploadState::NotUploaded)
                | (UploadState::NotUploaded, UploadState::Uploaded)
        );

        if !valid {
            return Err(SyncError::InvalidStateTransition {
                from: self.state.as_str().to_string(),
                to: to.as_str().to_string(),
            });
        }

        self.state = to;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
