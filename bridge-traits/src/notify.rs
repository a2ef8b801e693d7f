//! Notification Sink Abstraction
//!
//! The core reports attempt progress and terminal outcomes through this
//! sink; rendering (system notification, status bar, headless log) is the
//! host's concern. An attempt emits exactly one terminal update (success,
//! error, or files-deleted) plus any number of progress updates.

/// What the notification should present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    /// Upload running; `progress_percent` carries uploaded/total.
    Progress,
    /// Attempt aborted by an auth or transport failure; retry pending.
    Error,
    /// All queued files uploaded.
    Success,
    /// Local files backing a queued document were deleted.
    FilesDeleted,
}

/// Host-rendered notification surface.
pub trait NotificationSink: Send + Sync {
    /// Makes the notification visible. Idempotent; called once per attempt
    /// before the first update.
    fn show(&self);

    /// Updates the visible notification. `progress_percent` is only
    /// meaningful for [`NotificationKind::Progress`].
    fn update(&self, kind: NotificationKind, progress_percent: Option<u8>);
}
