//! # Sync Queue Store
//!
//! Durable, process-wide registry of upload work: the pending queue, the
//! completed-upload log, document titles awaiting enqueue, and the
//! two-phase container identifiers whose remote status is unconfirmed.
//!
//! ## Persistence
//!
//! The whole store serializes to a single JSON document, rewritten
//! wholesale on every save. Saving writes a temp file in the same directory
//! and renames it over the target, so a concurrent or subsequent load never
//! observes a half-written document. A missing or corrupt file loads as an
//! empty store; losing the queue degrades to re-uploading, never to a
//! crash.
//!
//! ## Invariants
//!
//! - `pending` holds at most one record per file path.
//! - No path appears in both `pending` and `completed`.
//! - `pending` order is insertion order, which is upload order.

use crate::record::{SyncRecord, UploadState};
use crate::{Result, SyncError};
use bridge_traits::{Document, UploadId};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File name of the persisted queue document inside the data directory.
pub const SYNC_STORE_FILE_NAME: &str = "sync_queue.json";

/// Durable upload queue state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncQueueStore {
    /// Records awaiting upload, in upload order.
    #[serde(default)]
    pending: Vec<SyncRecord>,

    /// Append-only log of uploaded records.
    #[serde(default)]
    completed: Vec<SyncRecord>,

    /// Document titles queued for enqueue; files are materialized lazily
    /// at attempt start.
    #[serde(default)]
    pending_titles: Vec<String>,

    /// Two-phase containers with files still to transfer.
    #[serde(default)]
    unfinished_upload_ids: Vec<UploadId>,

    /// Two-phase containers whose server-side processing is unconfirmed.
    #[serde(default)]
    unprocessed_upload_ids: Vec<UploadId>,
}

impl SyncQueueStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Load the store from `path`.
    ///
    /// A missing file yields a fresh store; a corrupt one is logged and
    /// replaced by a fresh store. This never fails the caller.
    pub async fn load(path: &Path) -> Self {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no persisted sync queue, starting empty");
                return Self::new();
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read sync queue, starting empty");
                return Self::new();
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(store) => store,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "corrupt sync queue document, starting empty");
                Self::new()
            }
        }
    }

    /// Persist the store to `path`, atomically enough that a load never
    /// sees partial state: write to a sibling temp file, then rename.
    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| SyncError::Persistence(e.to_string()))?;
        }

        let json = serde_json::to_vec_pretty(self)
            .map_err(|e| SyncError::Persistence(e.to_string()))?;

        let tmp = temp_path(path);
        tokio::fs::write(&tmp, &json)
            .await
            .map_err(|e| SyncError::Persistence(e.to_string()))?;
        tokio::fs::rename(&tmp, path)
            .await
            .map_err(|e| SyncError::Persistence(e.to_string()))?;

        debug!(
            path = %path.display(),
            pending = self.pending.len(),
            completed = self.completed.len(),
            "sync queue persisted"
        );
        Ok(())
    }

    // ------------------------------------------------------------------
    // Titles
    // ------------------------------------------------------------------

    /// Union `titles` into the pending-title set, preserving existing
    /// order. Idempotent.
    pub fn enqueue_titles<I, S>(&mut self, titles: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for title in titles {
            let title = title.into();
            if !self.pending_titles.contains(&title) {
                self.pending_titles.push(title);
            }
        }
    }

    pub fn pending_titles(&self) -> &[String] {
        &self.pending_titles
    }

    pub fn clear_pending_titles(&mut self) {
        self.pending_titles.clear();
    }

    /// Drop a single title, e.g. after its local files were deleted.
    pub fn remove_pending_title(&mut self, title: &str) {
        self.pending_titles.retain(|t| t != title);
    }

    // ------------------------------------------------------------------
    // Records
    // ------------------------------------------------------------------

    /// Append a record unless its path is already tracked in `pending` or
    /// `completed`. Returns whether the record was added.
    pub fn enqueue(&mut self, record: SyncRecord) -> bool {
        if self.contains_path(&record.file_path) {
            debug!(path = %record.file_path.display(), "record already tracked, not enqueued");
            return false;
        }
        self.pending.push(record);
        true
    }

    /// First pending record still in `NotUploaded`, FIFO. This is the sole
    /// scheduling policy.
    pub fn next_pending(&self) -> Option<SyncRecord> {
        self.pending
            .iter()
            .find(|r| r.state == UploadState::NotUploaded)
            .cloned()
    }

    /// Number of records an attempt starting now would upload.
    pub fn not_uploaded_count(&self) -> usize {
        self.pending
            .iter()
            .filter(|r| r.state == UploadState::NotUploaded)
            .count()
    }

    pub fn pending(&self) -> &[SyncRecord] {
        &self.pending
    }

    pub fn completed(&self) -> &[SyncRecord] {
        &self.completed
    }

    /// Advance the state of the pending record at `path`.
    pub fn set_state(&mut self, path: &Path, state: UploadState) -> Result<()> {
        let record = self
            .pending
            .iter_mut()
            .find(|r| r.matches_path(path))
            .ok_or_else(|| SyncError::RecordNotFound(path.display().to_string()))?;
        record.transition(state)
    }

    /// Move the pending record at `path` into the completed log with
    /// `state = Uploaded`.
    pub fn mark_uploaded(&mut self, path: &Path) -> Result<()> {
        let idx = self
            .pending
            .iter()
            .position(|r| r.matches_path(path))
            .ok_or_else(|| SyncError::RecordNotFound(path.display().to_string()))?;

        let mut record = self.pending.remove(idx);
        record.transition(UploadState::Uploaded)?;
        self.completed.push(record);
        Ok(())
    }

    /// Reset every in-flight record back to `NotUploaded`.
    ///
    /// Run at attempt start and on batch abort: a record persisted in
    /// `AwaitingUpload` marks a transfer whose outcome is unknown, and the
    /// only safe reading is "retry it".
    pub fn reset_in_flight(&mut self) {
        for record in &mut self.pending {
            if record.state == UploadState::AwaitingUpload {
                record.state = UploadState::NotUploaded;
            }
        }
    }

    /// Drop all pending records. The completed log is untouched.
    pub fn clear_pending(&mut self) {
        self.pending.clear();
    }

    // ------------------------------------------------------------------
    // Document-level queries
    // ------------------------------------------------------------------

    /// True when the document is queued for upload: its title awaits
    /// enqueue, or every one of its files is already tracked. A document
    /// with no files is never considered queued.
    pub fn is_document_queued(&self, document: &Document) -> bool {
        if document.is_empty() {
            return false;
        }

        if self.pending_titles.iter().any(|t| t == document.title()) {
            return true;
        }

        self.is_document_materialized(document)
    }

    /// True when every file of the document already has a record in
    /// `pending ∪ completed`. Materialized titles are skipped during
    /// container resolution so a retry never creates a duplicate remote
    /// container.
    pub fn is_document_materialized(&self, document: &Document) -> bool {
        !document.is_empty()
            && document.files().iter().all(|f| self.contains_path(f))
    }

    /// True when every file of the document is in the completed log.
    pub fn is_document_fully_uploaded(&self, document: &Document) -> bool {
        if document.is_empty() {
            return false;
        }
        document.files().iter().all(|f| self.is_file_uploaded(f))
    }

    /// Forget a locally deleted document's uploads.
    ///
    /// Only the completed log is purged. Still-pending files of the
    /// document are left queued on purpose: the next attempt trips over
    /// the missing artifacts and reports the dedicated files-deleted
    /// outcome, which is how deletion during an interrupted sync surfaces
    /// to the user at all.
    pub fn remove_document(&mut self, document: &Document) {
        for file in document.files() {
            self.completed.retain(|r| !r.matches_path(file));
        }
    }

    /// True when `path` is in the completed log.
    pub fn is_file_uploaded(&self, path: &Path) -> bool {
        self.completed.iter().any(|r| r.matches_path(path))
    }

    /// True when every given file is in the completed log; false for an
    /// empty slice.
    pub fn are_files_uploaded(&self, files: &[PathBuf]) -> bool {
        !files.is_empty() && files.iter().all(|f| self.is_file_uploaded(f))
    }

    fn contains_path(&self, path: &Path) -> bool {
        self.pending.iter().any(|r| r.matches_path(path))
            || self.completed.iter().any(|r| r.matches_path(path))
    }

    // ------------------------------------------------------------------
    // Two-phase container bookkeeping
    // ------------------------------------------------------------------

    /// Register a freshly resolved container in both id sets.
    pub fn record_container(&mut self, upload_id: UploadId) {
        if !self.unfinished_upload_ids.contains(&upload_id) {
            self.unfinished_upload_ids.push(upload_id);
        }
        if !self.unprocessed_upload_ids.contains(&upload_id) {
            self.unprocessed_upload_ids.push(upload_id);
        }
    }

    pub fn unfinished_upload_ids(&self) -> &[UploadId] {
        &self.unfinished_upload_ids
    }

    pub fn unprocessed_upload_ids(&self) -> &[UploadId] {
        &self.unprocessed_upload_ids
    }

    pub fn remove_unfinished(&mut self, upload_id: UploadId) {
        self.unfinished_upload_ids.retain(|id| *id != upload_id);
    }

    pub fn remove_unprocessed(&mut self, upload_id: UploadId) {
        self.unprocessed_upload_ids.retain(|id| *id != upload_id);
    }

    /// True when no pending record references the container anymore.
    pub fn container_drained(&self, upload_id: UploadId) -> bool {
        !self
            .pending
            .iter()
            .any(|r| r.upload_id == Some(upload_id))
    }

    /// Fold a container whose remote side finished in a prior attempt:
    /// every pending record bound to it moves to the completed log without
    /// a transfer, and the container leaves both id sets.
    pub fn fold_container_completed(&mut self, upload_id: UploadId) {
        let mut remaining = Vec::with_capacity(self.pending.len());
        for mut record in self.pending.drain(..) {
            if record.upload_id == Some(upload_id) {
                record.state = UploadState::Uploaded;
                self.completed.push(record);
            } else {
                remaining.push(record);
            }
        }
        self.pending = remaining;
        self.remove_unfinished(upload_id);
        self.remove_unprocessed(upload_id);
    }

    /// Fold the single pending record at `path` that the remote container
    /// already holds. Same effect as [`mark_uploaded`](Self::mark_uploaded)
    /// but named for the resume path.
    pub fn fold_file_completed(&mut self, path: &Path) -> Result<()> {
        self.mark_uploaded(path)
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "sync_queue.json".into());
    name.push(".tmp");
    path.with_file_name(name)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::BackendKind;

    fn record(path: &str) -> SyncRecord {
        SyncRecord::new(path, BackendKind::Dropbox)
    }

    fn container_record(path: &str, id: i64) -> SyncRecord {
        SyncRecord::with_container(path, BackendKind::Transkribus, UploadId::new(id))
    }

    fn unique_store_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("sync_store_test_{}", uuid::Uuid::new_v4()))
            .join(SYNC_STORE_FILE_NAME)
    }

    #[test]
    fn test_enqueue_rejects_duplicate_paths() {
        let mut store = SyncQueueStore::new();
        assert!(store.enqueue(record("/d/a.jpg")));
        assert!(!store.enqueue(record("/d/a.jpg")));
        assert_eq!(store.pending().len(), 1);
    }

    #[test]
    fn test_enqueue_rejects_already_completed_path() {
        let mut store = SyncQueueStore::new();
        store.enqueue(record("/d/a.jpg"));
        store.mark_uploaded(Path::new("/d/a.jpg")).unwrap();
        assert!(!store.enqueue(record("/d/a.jpg")));
        assert!(store.pending().is_empty());
    }

    #[test]
    fn test_next_pending_is_fifo() {
        let mut store = SyncQueueStore::new();
        store.enqueue(record("/d/a.jpg"));
        store.enqueue(record("/d/b.jpg"));
        store.enqueue(record("/d/c.jpg"));

        assert_eq!(
            store.next_pending().unwrap().file_path,
            PathBuf::from("/d/a.jpg")
        );

        store.mark_uploaded(Path::new("/d/a.jpg")).unwrap();
        assert_eq!(
            store.next_pending().unwrap().file_path,
            PathBuf::from("/d/b.jpg")
        );
    }

    #[test]
    fn test_next_pending_skips_awaiting() {
        let mut store = SyncQueueStore::new();
        store.enqueue(record("/d/a.jpg"));
        store.enqueue(record("/d/b.jpg"));
        store
            .set_state(Path::new("/d/a.jpg"), UploadState::AwaitingUpload)
            .unwrap();

        assert_eq!(
            store.next_pending().unwrap().file_path,
            PathBuf::from("/d/b.jpg")
        );
        assert_eq!(store.not_uploaded_count(), 1);
    }

    #[test]
    fn test_mark_uploaded_moves_to_completed() {
        let mut store = SyncQueueStore::new();
        store.enqueue(record("/d/a.jpg"));
        store
            .set_state(Path::new("/d/a.jpg"), UploadState::AwaitingUpload)
            .unwrap();
        store.mark_uploaded(Path::new("/d/a.jpg")).unwrap();

        assert!(store.pending().is_empty());
        assert_eq!(store.completed().len(), 1);
        assert_eq!(store.completed()[0].state, UploadState::Uploaded);
        assert!(store.is_file_uploaded(Path::new("/d/a.jpg")));
    }

    #[test]
    fn test_mark_uploaded_unknown_path_errors() {
        let mut store = SyncQueueStore::new();
        assert!(matches!(
            store.mark_uploaded(Path::new("/d/ghost.jpg")),
            Err(SyncError::RecordNotFound(_))
        ));
    }

    #[test]
    fn test_reset_in_flight() {
        let mut store = SyncQueueStore::new();
        store.enqueue(record("/d/a.jpg"));
        store
            .set_state(Path::new("/d/a.jpg"), UploadState::AwaitingUpload)
            .unwrap();

        store.reset_in_flight();
        assert_eq!(store.pending()[0].state, UploadState::NotUploaded);
    }

    #[test]
    fn test_enqueue_titles_is_idempotent_union() {
        let mut store = SyncQueueStore::new();
        store.enqueue_titles(["alpha", "beta"]);
        store.enqueue_titles(["beta", "gamma"]);
        assert_eq!(store.pending_titles(), &["alpha", "beta", "gamma"]);
    }

    #[test]
    fn test_is_document_queued() {
        let mut store = SyncQueueStore::new();
        let doc = Document::new("alpha", vec!["/d/a.jpg".into(), "/d/b.jpg".into()]);
        let empty = Document::new("hollow", Vec::new());

        assert!(!store.is_document_queued(&doc));
        assert!(!store.is_document_queued(&empty));

        store.enqueue_titles(["alpha"]);
        assert!(store.is_document_queued(&doc));

        let mut store = SyncQueueStore::new();
        store.enqueue(record("/d/a.jpg"));
        assert!(!store.is_document_queued(&doc));
        store.enqueue(record("/d/b.jpg"));
        assert!(store.is_document_queued(&doc));

        // One file completed, one pending still counts as queued.
        store.mark_uploaded(Path::new("/d/a.jpg")).unwrap();
        assert!(store.is_document_queued(&doc));
    }

    #[test]
    fn test_is_document_fully_uploaded() {
        let mut store = SyncQueueStore::new();
        let doc = Document::new("alpha", vec!["/d/a.jpg".into(), "/d/b.jpg".into()]);

        store.enqueue(record("/d/a.jpg"));
        store.enqueue(record("/d/b.jpg"));
        assert!(!store.is_document_fully_uploaded(&doc));

        store.mark_uploaded(Path::new("/d/a.jpg")).unwrap();
        assert!(!store.is_document_fully_uploaded(&doc));

        store.mark_uploaded(Path::new("/d/b.jpg")).unwrap();
        assert!(store.is_document_fully_uploaded(&doc));
        assert!(store.are_files_uploaded(doc.files()));
        assert!(!store.are_files_uploaded(&[]));

        assert!(!store.is_document_fully_uploaded(&Document::new("hollow", Vec::new())));
    }

    #[test]
    fn test_remove_document_purges_completed_only() {
        let mut store = SyncQueueStore::new();
        let doc = Document::new("alpha", vec!["/d/a.jpg".into(), "/d/b.jpg".into()]);

        store.enqueue(record("/d/a.jpg"));
        store.enqueue(record("/d/b.jpg"));
        store.mark_uploaded(Path::new("/d/a.jpg")).unwrap();

        store.remove_document(&doc);

        // Completed entry gone, pending entry deliberately left in place.
        assert!(store.completed().is_empty());
        assert_eq!(store.pending().len(), 1);
        assert_eq!(store.pending()[0].file_path, PathBuf::from("/d/b.jpg"));
    }

    #[test]
    fn test_container_bookkeeping() {
        let mut store = SyncQueueStore::new();
        let id = UploadId::new(7);

        store.record_container(id);
        store.record_container(id);
        assert_eq!(store.unfinished_upload_ids(), &[id]);
        assert_eq!(store.unprocessed_upload_ids(), &[id]);

        store.enqueue(container_record("/d/a.jpg", 7));
        assert!(!store.container_drained(id));

        store.mark_uploaded(Path::new("/d/a.jpg")).unwrap();
        assert!(store.container_drained(id));
    }

    #[test]
    fn test_fold_container_completed() {
        let mut store = SyncQueueStore::new();
        store.record_container(UploadId::new(7));
        store.enqueue(container_record("/d/a.jpg", 7));
        store.enqueue(container_record("/d/b.jpg", 7));
        store.enqueue(container_record("/d/other.jpg", 8));

        store.fold_container_completed(UploadId::new(7));

        assert_eq!(store.pending().len(), 1);
        assert_eq!(store.completed().len(), 2);
        assert!(store
            .completed()
            .iter()
            .all(|r| r.state == UploadState::Uploaded));
        assert!(store.unfinished_upload_ids().is_empty());
        assert!(store.unprocessed_upload_ids().is_empty());
    }

    #[tokio::test]
    async fn test_save_load_round_trip() {
        let path = unique_store_path();

        let mut store = SyncQueueStore::new();
        store.enqueue(record("/d/a.jpg"));
        store.enqueue(container_record("/d/b.jpg", 7));
        store.enqueue_titles(["alpha"]);
        store.record_container(UploadId::new(7));
        store.mark_uploaded(Path::new("/d/a.jpg")).unwrap();

        store.save(&path).await.unwrap();
        let loaded = SyncQueueStore::load(&path).await;

        assert_eq!(loaded, store);

        tokio::fs::remove_dir_all(path.parent().unwrap()).await.ok();
    }

    #[tokio::test]
    async fn test_load_missing_file_yields_empty() {
        let store = SyncQueueStore::load(Path::new("/nonexistent/dir/queue.json")).await;
        assert_eq!(store, SyncQueueStore::new());
    }

    #[tokio::test]
    async fn test_load_corrupt_file_yields_empty() {
        let path = unique_store_path();
        tokio::fs::create_dir_all(path.parent().unwrap())
            .await
            .unwrap();
        tokio::fs::write(&path, b"{ this is not json").await.unwrap();

        let store = SyncQueueStore::load(&path).await;
        assert_eq!(store, SyncQueueStore::new());

        tokio::fs::remove_dir_all(path.parent().unwrap()).await.ok();
    }

    #[tokio::test]
    async fn test_persisted_layout() {
        let path = unique_store_path();

        let mut store = SyncQueueStore::new();
        store.enqueue(container_record("/d/b.jpg", 7));
        store.enqueue_titles(["alpha"]);
        store.record_container(UploadId::new(7));
        store.save(&path).await.unwrap();

        let raw = tokio::fs::read(&path).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&raw).unwrap();

        assert!(json["pending"].is_array());
        assert!(json["completed"].is_array());
        assert_eq!(json["pending_titles"][0], "alpha");
        assert_eq!(json["unfinished_upload_ids"][0], 7);
        assert_eq!(json["unprocessed_upload_ids"][0], 7);

        tokio::fs::remove_dir_all(path.parent().unwrap()).await.ok();
    }
}
