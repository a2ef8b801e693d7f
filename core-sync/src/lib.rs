//! # Upload Sync Module
//!
//! Orchestrates background upload of captured documents to archival
//! backends.
//!
//! ## Overview
//!
//! This crate manages the durable upload queue and the sequential upload
//! state machine:
//! - Persisting queue state across process restarts
//! - Materializing queued document titles into per-file upload records
//! - Driving the two-phase container handshake (Transkribus) and direct
//!   file writes (Dropbox) through one backend contract
//! - Classifying failures into distinct user-visible outcomes without
//!   corrupting the durable queue
//!
//! ## Components
//!
//! - **Sync Records** (`record`): one file's upload bookkeeping entry with
//!   validated state transitions
//! - **Sync Queue Store** (`store`): durable queue, completed log, title
//!   and container bookkeeping
//! - **Upload Orchestrator** (`orchestrator`): one sync attempt at a time,
//!   one file in flight at a time

pub mod error;
pub mod orchestrator;
pub mod record;
pub mod store;

pub use error::{Result, SyncError};
pub use orchestrator::{
    AttemptId, AttemptPhase, AttemptSummary, SyncConfig, UploadOrchestrator,
};
pub use record::{SyncRecord, UploadState};
pub use store::{SyncQueueStore, SYNC_STORE_FILE_NAME};
