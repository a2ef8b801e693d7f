//! # Upload Orchestrator
//!
//! Drives one end-to-end sync attempt: authenticate, resolve two-phase
//! containers, then pull records one at a time from the queue store and
//! push each through its backend adapter.
//!
//! ## State Machine
//!
//! ```text
//! Idle → Authenticating → ResolvingContainers (two-phase only)
//!      → Uploading → Finished | Failed
//! ```
//!
//! ## Workflow
//!
//! 1. Reuse the current session or log in
//! 2. Two-phase backends: poll containers left unfinished by earlier runs,
//!    folding remotely-finished files into the completed log
//! 3. Materialize queued document titles into records (two-phase backends
//!    get a container id per title first)
//! 4. Per-file loop, strictly sequential: mark in-flight, persist, transfer,
//!    persist the outcome, report progress
//! 5. Terminal: success notification and event, or one of the distinct
//!    failure outcomes (auth, transport, files deleted)
//!
//! Uploads are serialized because both backends impose per-container
//! ordering and identity constraints, and because durable-state writes stay
//! trivially consistent with at most one outstanding network operation. Any
//! error aborts the whole batch: a network or auth failure will recur for
//! every subsequent file, so the external scheduler retries the whole
//! attempt later instead of skipping records.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_sync::{SyncConfig, UploadOrchestrator};
//! use std::sync::Arc;
//!
//! # async fn example(orchestrator: Arc<UploadOrchestrator>) -> Result<(), Box<dyn std::error::Error>> {
//! orchestrator.enqueue_document("field notes").await?;
//! let summary = orchestrator.start_attempt().await?;
//! println!("uploaded {} files", summary.files_uploaded);
//! # Ok(())
//! # }
//! ```

use crate::record::{SyncRecord, UploadState};
use crate::store::SyncQueueStore;
use crate::{Result, SyncError};
use bridge_traits::{
    BackendKind, BridgeError, Document, DocumentStore, NotificationKind, NotificationSink,
    Session, SessionService, SyncScheduler, TaskConstraints, UploadBackend, UploadId,
    UploadOutcome,
};
use chrono::Utc;
use core_runtime::events::{AuthEvent, CoreEvent, EventBus, UploadEvent};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

// ============================================================================
// ID Types
// ============================================================================

/// Unique identifier for one sync attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttemptId(Uuid);

impl AttemptId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for AttemptId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AttemptId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Configuration & Attempt Types
// ============================================================================

/// Orchestrator configuration.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Location of the persisted queue document.
    pub store_path: PathBuf,

    /// Constraints handed to the host scheduler when requesting a retry.
    pub retry_constraints: TaskConstraints,
}

impl SyncConfig {
    pub fn new(store_path: impl Into<PathBuf>) -> Self {
        Self {
            store_path: store_path.into(),
            retry_constraints: TaskConstraints::default(),
        }
    }
}

/// Observable attempt phase. External readers poll this for display and
/// must tolerate stale snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptPhase {
    /// No attempt running.
    Idle,
    /// Logging in.
    Authenticating,
    /// Two-phase container handshake / resume polling.
    ResolvingContainers,
    /// Per-file loop running.
    Uploading,
    /// Last attempt drained the queue.
    Finished,
    /// Last attempt aborted.
    Failed,
}

impl AttemptPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptPhase::Idle => "idle",
            AttemptPhase::Authenticating => "authenticating",
            AttemptPhase::ResolvingContainers => "resolving_containers",
            AttemptPhase::Uploading => "uploading",
            AttemptPhase::Finished => "finished",
            AttemptPhase::Failed => "failed",
        }
    }
}

impl std::fmt::Display for AttemptPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What a finished attempt accomplished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptSummary {
    pub attempt_id: AttemptId,
    pub backend: BackendKind,
    /// Files uploaded during this attempt.
    pub files_uploaded: u64,
    /// Batch size fixed at batch start.
    pub files_total: u64,
    pub duration_secs: u64,
}

/// Resets the single-attempt guard when the attempt scope ends.
struct AttemptGuard<'a>(&'a AtomicBool);

impl Drop for AttemptGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Runs one sync attempt at a time against the shared queue store.
pub struct UploadOrchestrator {
    config: SyncConfig,
    store: Mutex<SyncQueueStore>,
    documents: Arc<dyn DocumentStore>,
    session: Arc<dyn SessionService>,
    backends: RwLock<HashMap<BackendKind, Arc<dyn UploadBackend>>>,
    notifier: Arc<dyn NotificationSink>,
    scheduler: Arc<dyn SyncScheduler>,
    event_bus: Arc<EventBus>,
    attempt_active: AtomicBool,
    cancel: Mutex<CancellationToken>,
    phase: Mutex<AttemptPhase>,
}

impl UploadOrchestrator {
    /// Create an orchestrator, loading the persisted queue from
    /// `config.store_path`. A missing or corrupt document starts empty.
    pub async fn new(
        config: SyncConfig,
        documents: Arc<dyn DocumentStore>,
        session: Arc<dyn SessionService>,
        notifier: Arc<dyn NotificationSink>,
        scheduler: Arc<dyn SyncScheduler>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        let store = SyncQueueStore::load(&config.store_path).await;
        Self {
            config,
            store: Mutex::new(store),
            documents,
            session,
            backends: RwLock::new(HashMap::new()),
            notifier,
            scheduler,
            event_bus,
            attempt_active: AtomicBool::new(false),
            cancel: Mutex::new(CancellationToken::new()),
            phase: Mutex::new(AttemptPhase::Idle),
        }
    }

    /// Register a backend adapter, keyed by its kind. Adapters must be
    /// registered before records of their kind reach the upload loop.
    pub async fn register_backend(&self, backend: Arc<dyn UploadBackend>) {
        let kind = backend.kind();
        self.backends.write().await.insert(kind, backend);
        info!(backend = %kind, "registered upload backend");
    }

    /// Queue a document title for upload and persist the queue.
    pub async fn enqueue_document(&self, title: &str) -> Result<()> {
        let mut store = self.store.lock().await;
        store.enqueue_titles([title]);
        store.save(&self.config.store_path).await
    }

    /// Forget a locally deleted document's completed uploads.
    ///
    /// Still-pending records are left queued; see
    /// [`SyncQueueStore::remove_document`].
    pub async fn remove_document(&self, title: &str) -> Result<()> {
        let Some(document) = self.documents.get_document(title).await else {
            return Ok(());
        };
        let mut store = self.store.lock().await;
        store.remove_document(&document);
        store.save(&self.config.store_path).await
    }

    /// Cloned queue view for UI readers. May be stale by the time the
    /// caller looks at it.
    pub async fn snapshot(&self) -> SyncQueueStore {
        self.store.lock().await.clone()
    }

    /// Current attempt phase, for display.
    pub async fn phase(&self) -> AttemptPhase {
        *self.phase.lock().await
    }

    /// Cooperative cancellation, invoked by the host scheduler. Takes
    /// effect at the next per-file loop boundary; an in-flight transfer is
    /// allowed to finish and its outcome is still recorded.
    pub async fn on_stop(&self) {
        warn!("stop requested, cancelling at next loop boundary");
        self.cancel.lock().await.cancel();
    }

    // ------------------------------------------------------------------
    // Attempt driver
    // ------------------------------------------------------------------

    /// Run one sync attempt to completion or to its first fatal error.
    ///
    /// # Errors
    ///
    /// [`SyncError::AttemptInProgress`] when an attempt is already running
    /// (the trigger is ignored, not queued). Otherwise the terminal outcome
    /// of the attempt: `Auth`, `Transport`, `FilesDeleted`, `Cancelled`.
    #[instrument(skip(self))]
    pub async fn start_attempt(&self) -> Result<AttemptSummary> {
        if self.attempt_active.swap(true, Ordering::SeqCst) {
            debug!("attempt trigger ignored, one is already running");
            return Err(SyncError::AttemptInProgress);
        }
        let _guard = AttemptGuard(&self.attempt_active);

        let token = {
            let mut cancel = self.cancel.lock().await;
            *cancel = CancellationToken::new();
            cancel.clone()
        };

        let attempt_id = AttemptId::new();
        info!(%attempt_id, "================= upload attempt starting =================");

        let result = self.run_attempt(attempt_id, token).await;
        match &result {
            Ok(summary) => info!(
                %attempt_id,
                files_uploaded = summary.files_uploaded,
                "attempt finished"
            ),
            Err(e) => warn!(%attempt_id, error = %e, "attempt ended early"),
        }
        result
    }

    async fn run_attempt(
        &self,
        attempt_id: AttemptId,
        token: CancellationToken,
    ) -> Result<AttemptSummary> {
        let started_at = Utc::now().timestamp();

        self.set_phase(AttemptPhase::Authenticating).await;
        let session = match self.session.current_session().await {
            Some(session) => {
                debug!(backend = %session.backend, "session still valid");
                session
            }
            None => match self.session.login().await {
                Ok(session) => {
                    info!(backend = %session.backend, "logged in");
                    self.emit(CoreEvent::Auth(AuthEvent::SignedIn {
                        user: session.user.clone(),
                        backend: session.backend.display_name().to_string(),
                    }));
                    session
                }
                Err(e) => return self.fail_auth(attempt_id, e).await,
            },
        };

        let backend = self.backend_for(session.backend).await?;

        if backend.requires_container() {
            self.set_phase(AttemptPhase::ResolvingContainers).await;
            self.resume_unfinished_containers(attempt_id, &token, backend.as_ref())
                .await?;
        }
        self.materialize_pending_titles(attempt_id, &session, backend.as_ref())
            .await?;

        self.drain_queue(attempt_id, &session, &token, started_at)
            .await
    }

    /// Per-file loop: strictly sequential, cancellation observed at the top
    /// of each iteration, the store persisted before every network call.
    async fn drain_queue(
        &self,
        attempt_id: AttemptId,
        session: &Session,
        token: &CancellationToken,
        started_at: i64,
    ) -> Result<AttemptSummary> {
        self.set_phase(AttemptPhase::Uploading).await;

        let files_total = {
            let mut store = self.store.lock().await;
            // A record persisted in-flight marks a transfer with unknown
            // outcome; retry it in this batch.
            store.reset_in_flight();
            store.save(&self.config.store_path).await?;
            store.not_uploaded_count() as u64
        };
        let mut files_uploaded = 0u64;

        self.notifier.show();
        self.emit(CoreEvent::Upload(UploadEvent::Started {
            attempt_id: attempt_id.as_str(),
            backend: session.backend.display_name().to_string(),
            files_total,
        }));

        loop {
            if token.is_cancelled() {
                return self.stop_cancelled(attempt_id).await;
            }

            let Some(record) = self.store.lock().await.next_pending() else {
                break;
            };

            {
                let mut store = self.store.lock().await;
                store.set_state(&record.file_path, UploadState::AwaitingUpload)?;
                store.save(&self.config.store_path).await?;
            }

            let adapter = self.backend_for(record.backend).await?;
            debug!(
                file = %record.file_path.display(),
                backend = %record.backend,
                "uploading file"
            );

            match adapter
                .upload_file(&record.file_path, record.upload_id)
                .await
            {
                Ok(outcome) => {
                    {
                        let mut store = self.store.lock().await;
                        store.mark_uploaded(&record.file_path)?;
                        if let Some(id) = record.upload_id {
                            if store.container_drained(id) {
                                store.remove_unfinished(id);
                            }
                        }
                        store.save(&self.config.store_path).await?;
                    }
                    files_uploaded += 1;

                    match outcome {
                        UploadOutcome::Completed => {
                            info!(file = %record.file_path.display(), "uploaded file")
                        }
                        UploadOutcome::AlreadyFinished => {
                            info!(
                                file = %record.file_path.display(),
                                "remote side already held file, folded without transfer"
                            )
                        }
                    }

                    let percent = (files_uploaded * 100 / files_total) as u8;
                    self.notifier
                        .update(NotificationKind::Progress, Some(percent));
                    self.emit(CoreEvent::Upload(UploadEvent::Progress {
                        attempt_id: attempt_id.as_str(),
                        files_uploaded,
                        files_total,
                        percent,
                    }));
                }
                Err(e) => return self.fail_transport(attempt_id, files_uploaded, e).await,
            }
        }

        self.finish(attempt_id, session, files_uploaded, files_total, started_at)
            .await
    }

    async fn finish(
        &self,
        attempt_id: AttemptId,
        session: &Session,
        files_uploaded: u64,
        files_total: u64,
        started_at: i64,
    ) -> Result<AttemptSummary> {
        self.set_phase(AttemptPhase::Finished).await;

        {
            let mut store = self.store.lock().await;
            let confirmed: Vec<UploadId> = store
                .unprocessed_upload_ids()
                .iter()
                .copied()
                .filter(|id| store.container_drained(*id))
                .collect();
            for id in confirmed {
                store.remove_unprocessed(id);
                store.remove_unfinished(id);
            }
            store.clear_pending_titles();
            store.save(&self.config.store_path).await?;
        }

        self.notifier.show();
        self.notifier.update(NotificationKind::Success, None);

        let duration_secs = (Utc::now().timestamp() - started_at).max(0) as u64;
        self.emit(CoreEvent::Upload(UploadEvent::Finished {
            attempt_id: attempt_id.as_str(),
            backend: session.backend.display_name().to_string(),
            files_uploaded,
            duration_secs,
        }));

        Ok(AttemptSummary {
            attempt_id,
            backend: session.backend,
            files_uploaded,
            files_total,
            duration_secs,
        })
    }

    // ------------------------------------------------------------------
    // Container resolution (two-phase backends)
    // ------------------------------------------------------------------

    /// Poll containers a previous run left unfinished. Files the remote
    /// side no longer lists as unfinished completed in an earlier attempt;
    /// fold them into the completed log so they are not uploaded twice.
    async fn resume_unfinished_containers(
        &self,
        attempt_id: AttemptId,
        token: &CancellationToken,
        backend: &dyn UploadBackend,
    ) -> Result<()> {
        let ids = {
            let store = self.store.lock().await;
            store.unfinished_upload_ids().to_vec()
        };

        for id in ids {
            if token.is_cancelled() {
                self.stop_cancelled(attempt_id).await?;
            }

            let unfinished = match backend.poll_unfinished(id).await {
                Ok(names) => names,
                Err(e) => {
                    return self
                        .fail_transport(attempt_id, 0, e)
                        .await
                        .map(|_| ())
                }
            };

            let mut store = self.store.lock().await;
            if unfinished.is_empty() {
                info!(upload_id = %id, "container finished remotely in a prior attempt");
                store.fold_container_completed(id);
            } else {
                let finished: Vec<PathBuf> = store
                    .pending()
                    .iter()
                    .filter(|r| r.upload_id == Some(id))
                    .filter(|r| {
                        r.file_name()
                            .map(|n| !unfinished.iter().any(|u| u == n))
                            .unwrap_or(false)
                    })
                    .map(|r| r.file_path.clone())
                    .collect();
                for path in &finished {
                    debug!(file = %path.display(), upload_id = %id, "remote already holds file");
                    store.fold_file_completed(path)?;
                }
                if store.container_drained(id) {
                    store.remove_unfinished(id);
                }
            }
            store.save(&self.config.store_path).await?;
        }

        Ok(())
    }

    /// Turn queued document titles into upload records. Two-phase backends
    /// get one container per title first; titles whose files are all
    /// tracked already were materialized by an earlier attempt and are
    /// skipped, so a retry never creates a duplicate remote container.
    async fn materialize_pending_titles(
        &self,
        attempt_id: AttemptId,
        session: &Session,
        backend: &dyn UploadBackend,
    ) -> Result<()> {
        let titles = {
            let store = self.store.lock().await;
            store.pending_titles().to_vec()
        };
        if titles.is_empty() {
            return Ok(());
        }

        let mut documents: Vec<Document> = Vec::new();
        let mut missing: Vec<String> = Vec::new();
        for title in &titles {
            match self.documents.get_document(title).await {
                Some(doc) if !doc.is_empty() => documents.push(doc),
                _ => missing.push(title.clone()),
            }
        }
        if !missing.is_empty() {
            return self.fail_files_deleted(attempt_id, missing).await;
        }

        let unmaterialized: Vec<Document> = {
            let store = self.store.lock().await;
            documents
                .into_iter()
                .filter(|d| !store.is_document_materialized(d))
                .collect()
        };
        if unmaterialized.is_empty() {
            return Ok(());
        }

        if backend.requires_container() {
            let titles: Vec<String> = unmaterialized
                .iter()
                .map(|d| d.title().to_string())
                .collect();
            let assignments = match backend.resolve_containers(&titles).await {
                Ok(assignments) => assignments,
                Err(BridgeError::FilesDeleted { titles }) => {
                    return self.fail_files_deleted(attempt_id, titles).await;
                }
                Err(e) => return self.fail_transport(attempt_id, 0, e).await.map(|_| ()),
            };

            let mut store = self.store.lock().await;
            for assignment in assignments {
                let Some(document) = unmaterialized
                    .iter()
                    .find(|d| d.title() == assignment.title)
                else {
                    warn!(title = %assignment.title, "container assigned for unknown title");
                    continue;
                };
                store.record_container(assignment.upload_id);
                for file in document.files() {
                    store.enqueue(SyncRecord::with_container(
                        file,
                        session.backend,
                        assignment.upload_id,
                    ));
                }
                info!(
                    title = %document.title(),
                    upload_id = %assignment.upload_id,
                    files = document.files().len(),
                    "container resolved"
                );
            }
            store.save(&self.config.store_path).await?;
        } else {
            let mut store = self.store.lock().await;
            for document in &unmaterialized {
                for file in document.files() {
                    store.enqueue(SyncRecord::new(file, session.backend));
                }
                debug!(
                    title = %document.title(),
                    files = document.files().len(),
                    "document materialized"
                );
            }
            store.save(&self.config.store_path).await?;
        }

        Ok(())
    }

    // ------------------------------------------------------------------
    // Terminal outcomes
    // ------------------------------------------------------------------

    async fn fail_auth(
        &self,
        attempt_id: AttemptId,
        err: BridgeError,
    ) -> Result<AttemptSummary> {
        let message = err.to_string();
        warn!(%attempt_id, error = %message, "login failed, aborting attempt");

        self.session.invalidate().await;
        {
            let store = self.store.lock().await;
            store.save(&self.config.store_path).await?;
        }
        self.set_phase(AttemptPhase::Failed).await;

        self.notifier.show();
        self.notifier.update(NotificationKind::Error, None);
        self.scheduler
            .request_retry(self.config.retry_constraints.clone());

        self.emit(CoreEvent::Auth(AuthEvent::AuthError {
            message: message.clone(),
            retry_requested: true,
        }));
        self.emit(CoreEvent::Upload(UploadEvent::Failed {
            attempt_id: attempt_id.as_str(),
            message: message.clone(),
        }));

        Err(SyncError::Auth(message))
    }

    async fn fail_transport(
        &self,
        attempt_id: AttemptId,
        files_uploaded: u64,
        err: BridgeError,
    ) -> Result<AttemptSummary> {
        let message = err.to_string();
        warn!(%attempt_id, error = %message, "backend unreachable, aborting batch");

        // The session may be stale; force a fresh login on the retry.
        self.session.invalidate().await;
        {
            let mut store = self.store.lock().await;
            store.reset_in_flight();
            store.save(&self.config.store_path).await?;
        }
        self.set_phase(AttemptPhase::Failed).await;

        self.notifier.show();
        self.notifier.update(NotificationKind::Error, None);
        self.scheduler
            .request_retry(self.config.retry_constraints.clone());

        self.emit(CoreEvent::Upload(UploadEvent::OfflineError {
            attempt_id: attempt_id.as_str(),
            message: message.clone(),
            files_uploaded,
        }));

        Err(SyncError::Transport(message))
    }

    async fn fail_files_deleted(
        &self,
        attempt_id: AttemptId,
        titles: Vec<String>,
    ) -> Result<()> {
        warn!(%attempt_id, ?titles, "local files deleted, dropping titles");

        {
            let mut store = self.store.lock().await;
            for title in &titles {
                store.remove_pending_title(title);
            }
            store.save(&self.config.store_path).await?;
        }
        self.set_phase(AttemptPhase::Failed).await;

        self.notifier.show();
        self.notifier.update(NotificationKind::FilesDeleted, None);

        self.emit(CoreEvent::Upload(UploadEvent::FilesDeleted {
            attempt_id: attempt_id.as_str(),
            titles: titles.clone(),
        }));

        Err(SyncError::FilesDeleted { titles })
    }

    async fn stop_cancelled(&self, attempt_id: AttemptId) -> Result<AttemptSummary> {
        info!(%attempt_id, "attempt cancelled at loop boundary");
        {
            let mut store = self.store.lock().await;
            store.reset_in_flight();
            store.save(&self.config.store_path).await?;
        }
        self.set_phase(AttemptPhase::Idle).await;
        Err(SyncError::Cancelled)
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    async fn backend_for(&self, kind: BackendKind) -> Result<Arc<dyn UploadBackend>> {
        self.backends
            .read()
            .await
            .get(&kind)
            .cloned()
            .ok_or_else(|| SyncError::BackendNotRegistered(kind.display_name().to_string()))
    }

    async fn set_phase(&self, phase: AttemptPhase) {
        debug!(%phase, "attempt phase");
        *self.phase.lock().await = phase;
    }

    /// Events are best-effort: no subscriber is not an error.
    fn emit(&self, event: CoreEvent) {
        self.event_bus.emit(event).ok();
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::mock;
    use std::sync::atomic::AtomicUsize;

    mock! {
        pub Documents {}

        #[async_trait::async_trait]
        impl DocumentStore for Documents {
            async fn get_document(&self, title: &str) -> Option<Document>;
        }
    }

    struct StubSession;

    #[async_trait::async_trait]
    impl SessionService for StubSession {
        async fn login(&self) -> bridge_traits::error::Result<Session> {
            Ok(Session {
                user: "tester".to_string(),
                backend: BackendKind::Dropbox,
            })
        }

        async fn current_session(&self) -> Option<Session> {
            None
        }

        async fn invalidate(&self) {}
    }

    struct NullNotifier;

    impl NotificationSink for NullNotifier {
        fn show(&self) {}
        fn update(&self, _kind: NotificationKind, _progress_percent: Option<u8>) {}
    }

    struct CountingScheduler(AtomicUsize);

    impl SyncScheduler for CountingScheduler {
        fn request_retry(&self, _constraints: TaskConstraints) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn test_config() -> SyncConfig {
        SyncConfig::new(
            std::env::temp_dir()
                .join(format!("orchestrator_test_{}", Uuid::new_v4()))
                .join("sync_queue.json"),
        )
    }

    async fn test_orchestrator(documents: MockDocuments) -> UploadOrchestrator {
        UploadOrchestrator::new(
            test_config(),
            Arc::new(documents),
            Arc::new(StubSession),
            Arc::new(NullNotifier),
            Arc::new(CountingScheduler(AtomicUsize::new(0))),
            Arc::new(EventBus::new(16)),
        )
        .await
    }

    #[tokio::test]
    async fn test_initial_phase_is_idle() {
        let orchestrator = test_orchestrator(MockDocuments::new()).await;
        assert_eq!(orchestrator.phase().await, AttemptPhase::Idle);
    }

    #[tokio::test]
    async fn test_backend_for_unregistered_kind() {
        let orchestrator = test_orchestrator(MockDocuments::new()).await;
        assert!(matches!(
            orchestrator.backend_for(BackendKind::Dropbox).await,
            Err(SyncError::BackendNotRegistered(_))
        ));
    }

    #[tokio::test]
    async fn test_enqueue_document_persists_title() {
        let orchestrator = test_orchestrator(MockDocuments::new()).await;
        orchestrator.enqueue_document("field notes").await.unwrap();
        orchestrator.enqueue_document("field notes").await.unwrap();

        let snapshot = orchestrator.snapshot().await;
        assert_eq!(snapshot.pending_titles(), &["field notes"]);

        // A fresh load from the same path sees the title.
        let reloaded = SyncQueueStore::load(&orchestrator.config.store_path).await;
        assert_eq!(reloaded.pending_titles(), &["field notes"]);
    }

    #[tokio::test]
    async fn test_remove_document_ignores_unknown_title() {
        let mut documents = MockDocuments::new();
        documents
            .expect_get_document()
            .returning(|_| None);

        let orchestrator = test_orchestrator(documents).await;
        orchestrator.remove_document("ghost").await.unwrap();
    }

    #[test]
    fn test_attempt_id_unique() {
        assert_ne!(AttemptId::new(), AttemptId::new());
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(AttemptPhase::ResolvingContainers.to_string(), "resolving_containers");
    }
}
