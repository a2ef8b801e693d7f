//! Background Scheduling Abstraction
//!
//! The decision of *when* a sync attempt runs belongs to the host's job
//! scheduler (connectivity change, periodic timer, user action). The core
//! only asks it to schedule a retry after an aborted batch; it never loops
//! on its own.

/// Constraints the host scheduler should honor before re-triggering.
#[derive(Debug, Clone)]
pub struct TaskConstraints {
    /// Require an unmetered WiFi connection.
    pub requires_wifi: bool,
    /// Require any network connection.
    pub requires_network: bool,
    /// Require the device to be charging.
    pub requires_charging: bool,
}

impl Default for TaskConstraints {
    fn default() -> Self {
        Self {
            requires_wifi: false,
            requires_network: true,
            requires_charging: false,
        }
    }
}

/// Host scheduler contract.
pub trait SyncScheduler: Send + Sync {
    /// Asks the host to schedule another sync attempt once `constraints`
    /// are met. Fire-and-forget; the core does not observe the schedule.
    fn request_retry(&self, constraints: TaskConstraints);
}
