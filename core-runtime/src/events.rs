//! # Event Bus System
//!
//! Event-driven plumbing for the document sync core, built on
//! `tokio::sync::broadcast`. The orchestrator publishes typed events; any
//! number of UI listeners subscribe independently.
//!
//! ## Overview
//!
//! The event bus consists of:
//! - **Event Types**: strongly-typed enums per domain (`AuthEvent`,
//!   `UploadEvent`) wrapped in [`CoreEvent`]
//! - **EventBus**: central broadcast channel for publishing events
//! - **Subscription Management**: each `subscribe()` call yields an
//!   independent receiver
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{EventBus, CoreEvent, UploadEvent};
//!
//! let event_bus = EventBus::new(100);
//! let mut stream = event_bus.subscribe();
//!
//! event_bus
//!     .emit(CoreEvent::Upload(UploadEvent::Finished {
//!         attempt_id: "a-1".to_string(),
//!         backend: "Transkribus".to_string(),
//!         files_uploaded: 12,
//!         duration_secs: 34,
//!     }))
//!     .ok();
//! ```
//!
//! ## Error Handling
//!
//! `broadcast` receivers can observe `RecvError::Lagged(n)` when they fall
//! behind (non-fatal; newer events still arrive) and `RecvError::Closed`
//! once every sender is gone. `emit` fails only when no subscriber exists,
//! which callers treat as ignorable.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

// Re-export commonly used types
pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum encompassing all event categories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Authentication-related events
    Auth(AuthEvent),
    /// Upload-attempt events
    Upload(UploadEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Auth(e) => e.description(),
            CoreEvent::Upload(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Auth(AuthEvent::AuthError { .. }) => EventSeverity::Error,
            CoreEvent::Upload(UploadEvent::Failed { .. }) => EventSeverity::Error,
            CoreEvent::Upload(UploadEvent::OfflineError { .. }) => EventSeverity::Warning,
            CoreEvent::Upload(UploadEvent::FilesDeleted { .. }) => EventSeverity::Warning,
            CoreEvent::Auth(AuthEvent::SignedIn { .. }) => EventSeverity::Info,
            CoreEvent::Upload(UploadEvent::Finished { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    /// Debug-level events (verbose)
    Debug,
    /// Informational events
    Info,
    /// Warning events
    Warning,
    /// Error events
    Error,
}

// ============================================================================
// Authentication Events
// ============================================================================

/// Events related to backend authentication.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum AuthEvent {
    /// Login succeeded against a backend.
    SignedIn {
        /// Account name the session belongs to.
        user: String,
        /// The backend that accepted the login.
        backend: String,
    },
    /// The session was invalidated; the next attempt re-authenticates.
    SignedOut {
        /// The backend the session belonged to.
        backend: String,
    },
    /// Login was rejected or could not be performed.
    AuthError {
        /// Human-readable error message.
        message: String,
        /// Whether a retry was requested from the host scheduler.
        retry_requested: bool,
    },
}

impl AuthEvent {
    fn description(&self) -> &str {
        match self {
            AuthEvent::SignedIn { .. } => "Signed in",
            AuthEvent::SignedOut { .. } => "Session invalidated",
            AuthEvent::AuthError { .. } => "Authentication error",
        }
    }
}

// ============================================================================
// Upload Events
// ============================================================================

/// Events emitted over the lifetime of one upload attempt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum UploadEvent {
    /// An attempt started its per-file loop.
    Started {
        /// Unique identifier of this attempt.
        attempt_id: String,
        /// The backend being uploaded to.
        backend: String,
        /// Number of files in the batch, fixed at batch start.
        files_total: u64,
    },
    /// One file finished; progress over the fixed batch.
    Progress {
        /// The attempt ID.
        attempt_id: String,
        /// Files uploaded so far in this attempt.
        files_uploaded: u64,
        /// Batch size fixed at batch start.
        files_total: u64,
        /// Progress percentage (0-100).
        percent: u8,
    },
    /// The queue drained; every file is uploaded.
    Finished {
        /// The attempt ID.
        attempt_id: String,
        /// The backend uploaded to.
        backend: String,
        /// Files uploaded during this attempt.
        files_uploaded: u64,
        /// Attempt duration in seconds.
        duration_secs: u64,
    },
    /// A transport failure aborted the batch; a retry was requested.
    OfflineError {
        /// The attempt ID.
        attempt_id: String,
        /// Human-readable error message.
        message: String,
        /// Files uploaded before the failure.
        files_uploaded: u64,
    },
    /// Local files backing a queued document were deleted.
    FilesDeleted {
        /// The attempt ID.
        attempt_id: String,
        /// Titles whose files are gone.
        titles: Vec<String>,
    },
    /// The attempt failed for a non-transport reason (auth, misconfigured
    /// backend).
    Failed {
        /// The attempt ID.
        attempt_id: String,
        /// Human-readable error message.
        message: String,
    },
}

impl UploadEvent {
    fn description(&self) -> &str {
        match self {
            UploadEvent::Started { .. } => "Upload attempt started",
            UploadEvent::Progress { .. } => "Upload in progress",
            UploadEvent::Finished { .. } => "Upload attempt finished",
            UploadEvent::OfflineError { .. } => "Upload aborted, backend unreachable",
            UploadEvent::FilesDeleted { .. } => "Queued files deleted locally",
            UploadEvent::Failed { .. } => "Upload attempt failed",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to events.
///
/// Uses `tokio::sync::broadcast` internally: multiple producers (clone the
/// bus), multiple independent consumers, non-blocking sends, lagging
/// detection for slow subscribers.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an
    /// error when there is none.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn finished_event() -> CoreEvent {
        CoreEvent::Upload(UploadEvent::Finished {
            attempt_id: "a-1".to_string(),
            backend: "Dropbox".to_string(),
            files_uploaded: 3,
            duration_secs: 5,
        })
    }

    #[tokio::test]
    async fn test_emit_and_receive() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();

        bus.emit(finished_event()).unwrap();

        let received = rx.recv().await.unwrap();
        assert_eq!(received, finished_event());
    }

    #[tokio::test]
    async fn test_multiple_subscribers_receive_same_event() {
        let bus = EventBus::new(8);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        assert_eq!(bus.subscriber_count(), 2);
        bus.emit(finished_event()).unwrap();

        assert_eq!(rx1.recv().await.unwrap(), finished_event());
        assert_eq!(rx2.recv().await.unwrap(), finished_event());
    }

    #[test]
    fn test_emit_without_subscribers_errors() {
        let bus = EventBus::new(8);
        assert!(bus.emit(finished_event()).is_err());
    }

    #[test]
    fn test_severity_mapping() {
        assert_eq!(finished_event().severity(), EventSeverity::Info);
        assert_eq!(
            CoreEvent::Upload(UploadEvent::OfflineError {
                attempt_id: "a-1".to_string(),
                message: "timeout".to_string(),
                files_uploaded: 1,
            })
            .severity(),
            EventSeverity::Warning
        );
        assert_eq!(
            CoreEvent::Auth(AuthEvent::AuthError {
                message: "rejected".to_string(),
                retry_requested: true,
            })
            .severity(),
            EventSeverity::Error
        );
    }

    #[test]
    fn test_event_serializes_with_tag() {
        let json = serde_json::to_value(finished_event()).unwrap();
        assert_eq!(json["type"], "Upload");
        assert_eq!(json["payload"]["event"], "Finished");
    }
}
