//! # Host Bridge Traits
//!
//! External-collaborator contracts consumed by the document sync core.
//!
//! ## Overview
//!
//! This crate defines the narrow interfaces between the upload orchestration
//! core and everything it does not own: the capture pipeline's document
//! store, the backend authentication service, the backend client libraries,
//! the host job scheduler, and the notification surface. Each trait is the
//! complete surface the core is allowed to touch; backend wire protocols,
//! UI rendering, and trigger policy live behind them.
//!
//! ## Traits
//!
//! - [`DocumentStore`](documents::DocumentStore) - Read-only document/title resolution
//! - [`SessionService`](session::SessionService) - Login and session invalidation
//! - [`UploadBackend`](backend::UploadBackend) - Per-file transfer, two-phase container
//!   handshake and status polling behind one capability-flagged contract
//! - [`NotificationSink`](notify::NotificationSink) - Progress and terminal outcome display
//! - [`SyncScheduler`](background::SyncScheduler) - Retry scheduling after aborted batches
//!
//! ## Error Handling
//!
//! All fallible bridge operations use [`BridgeError`](error::BridgeError).
//! Implementations should map their library-specific failures onto the
//! variants the core dispatches on: `AuthRejected`, `Transport`, and
//! `FilesDeleted` each produce a distinct user-visible outcome.
//!
//! ## Thread Safety
//!
//! All traits require `Send + Sync`; the core shares them across async
//! tasks behind `Arc`.

pub mod background;
pub mod backend;
pub mod documents;
pub mod error;
pub mod notify;
pub mod session;

pub use error::BridgeError;

// Re-export commonly used types
pub use backend::{BackendKind, ContainerAssignment, UploadBackend, UploadId, UploadOutcome};
pub use background::{SyncScheduler, TaskConstraints};
pub use documents::{Document, DocumentStore};
pub use notify::{NotificationKind, NotificationSink};
pub use session::{Session, SessionService};
