//! Session & Authentication Abstraction
//!
//! Narrow contract over the backend authentication service. The orchestrator
//! logs in at most once per attempt and invalidates the session whenever a
//! batch aborts, so the next attempt re-authenticates from scratch.

use async_trait::async_trait;

use crate::backend::BackendKind;
use crate::error::Result;

/// An authenticated session with one archival backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Account name the session belongs to.
    pub user: String,
    /// The backend this session is valid for; also selects which adapter
    /// newly enqueued titles are materialized against.
    pub backend: BackendKind,
}

/// Authentication contract.
#[async_trait]
pub trait SessionService: Send + Sync {
    /// Performs a login against the configured backend.
    ///
    /// # Errors
    ///
    /// [`BridgeError::AuthRejected`](crate::BridgeError::AuthRejected) when
    /// the credentials are refused, [`BridgeError::Transport`](crate::BridgeError::Transport)
    /// when the service is unreachable.
    async fn login(&self) -> Result<Session>;

    /// The currently valid session, if any.
    async fn current_session(&self) -> Option<Session>;

    /// Drops the current session so the next attempt must log in again.
    async fn invalidate(&self);
}
