//! Upload client

use crate::record::{DeviceInfo, UploadRecord};
use crate::UploadError;
use capture_workflow::CaptureWorkflow;
use chrono::Utc;
use notifications::Notifier;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use storage::DocumentStore;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

pub const UPLOAD_SUCCESS_MESSAGE: &str = "Upload successful";
pub const UPLOAD_FAILURE_MESSAGE: &str = "Upload failed";

/// Result of a stored upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadReceipt {
    /// Id assigned by the store
    pub id: String,
    pub session_id: String,
}

/// Clears the uploading flag however the upload ends
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Submits capture sessions to the document store
pub struct UploadClient {
    store: Arc<dyn DocumentStore>,
    notifier: Arc<Notifier>,
    collection: String,
    uploading: AtomicBool,
}

impl UploadClient {
    /// Create an upload client writing to `collection`
    pub fn new(
        store: Arc<dyn DocumentStore>,
        notifier: Arc<Notifier>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            store,
            notifier,
            collection: collection.into(),
            uploading: AtomicBool::new(false),
        }
    }

    /// Whether an upload is in flight (the upload control is disabled)
    pub fn is_uploading(&self) -> bool {
        self.uploading.load(Ordering::Acquire)
    }

    /// Upload the session held by `workflow`.
    ///
    /// Does nothing unless both views are captured and no other upload is in
    /// flight. The workflow lock is only held to read the images and to reset
    /// the session, never across the store call.
    pub async fn submit(
        &self,
        workflow: &Mutex<CaptureWorkflow>,
        device_info: DeviceInfo,
    ) -> Result<UploadReceipt, UploadError> {
        let Some(_guard) = InFlightGuard::acquire(&self.uploading) else {
            debug!("Upload ignored: already in flight");
            metrics::counter!("uploads_total", "outcome" => "in_flight").increment(1);
            return Err(UploadError::InFlight);
        };

        let Some([view1, view2]) = workflow.lock().await.upload_images() else {
            debug!("Upload ignored: session incomplete");
            metrics::counter!("uploads_total", "outcome" => "incomplete").increment(1);
            return Err(UploadError::Incomplete);
        };

        let record = UploadRecord::new(Some(&view1), Some(&view2), device_info, Utc::now());
        let session_id = record.session_id.clone();

        match self.store_record(&record).await {
            Ok(id) => {
                workflow.lock().await.reset();
                info!("Uploaded session {} as {}", session_id, id);
                metrics::counter!("uploads_total", "outcome" => "success").increment(1);
                self.notifier.success(UPLOAD_SUCCESS_MESSAGE);
                Ok(UploadReceipt { id, session_id })
            }
            Err(e) => {
                error!("Upload of session {} failed: {}", session_id, e);
                metrics::counter!("uploads_total", "outcome" => "failure").increment(1);
                self.notifier.error(UPLOAD_FAILURE_MESSAGE);
                Err(e)
            }
        }
    }

    async fn store_record(&self, record: &UploadRecord) -> Result<String, UploadError> {
        let value = serde_json::to_value(record)?;
        Ok(self.store.create_record(&self.collection, value).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use capture_workflow::{TapAction, ViewState};
    use image_encoder::EncodedImage;
    use storage::{Document, MemoryStore, StoreError, DEFAULT_COLLECTION};
    use tokio::sync::Semaphore;

    fn image(tag: &str) -> EncodedImage {
        EncodedImage::from_data_uri(format!("data:image/jpeg;base64,{tag}"), 2, 2)
    }

    fn capture(workflow: &mut CaptureWorkflow, index: usize, tag: &str) {
        workflow.tap(index).unwrap();
        let action = workflow.tap(index).unwrap();
        assert_eq!(action, TapAction::Capture(index));
        workflow.complete_capture(index, image(tag)).unwrap();
    }

    fn full_session() -> Mutex<CaptureWorkflow> {
        let mut workflow = CaptureWorkflow::default();
        capture(&mut workflow, 0, "A");
        capture(&mut workflow, 1, "B");
        Mutex::new(workflow)
    }

    fn client(store: Arc<dyn DocumentStore>) -> (UploadClient, Arc<Notifier>) {
        let notifier = Arc::new(Notifier::default());
        let client = UploadClient::new(store, Arc::clone(&notifier), DEFAULT_COLLECTION);
        (client, notifier)
    }

    #[tokio::test]
    async fn test_incomplete_session_is_no_op() {
        let store = Arc::new(MemoryStore::new());
        let (client, notifier) = client(store.clone());

        let mut workflow = CaptureWorkflow::default();
        capture(&mut workflow, 0, "A");
        let workflow = Mutex::new(workflow);

        let err = client.submit(&workflow, DeviceInfo::unknown()).await.unwrap_err();
        assert!(matches!(err, UploadError::Incomplete));
        assert!(err.is_no_op());
        assert_eq!(store.create_calls(), 0);
        assert!(notifier.current().is_none());

        let workflow = workflow.lock().await;
        assert_eq!(workflow.image(0), Some(&image("A")));
        assert_eq!(workflow.state(0), Some(ViewState::Captured));
        assert!(!client.is_uploading());
    }

    #[tokio::test]
    async fn test_success_resets_session() {
        let store = Arc::new(MemoryStore::new());
        let (client, notifier) = client(store.clone());
        let workflow = full_session();

        let device = DeviceInfo::new("TestAgent/1.0", "Linux", "en-GB");
        let receipt = client.submit(&workflow, device.clone()).await.unwrap();
        assert!(receipt.session_id.starts_with("session_"));

        let shown = notifier.current().unwrap();
        assert_eq!(shown.message, "Upload successful");

        let workflow = workflow.lock().await;
        assert!(workflow.image(0).is_none() && workflow.image(1).is_none());
        assert_eq!(workflow.state(0), Some(ViewState::Unclicked));
        assert_eq!(workflow.state(1), Some(ViewState::Unclicked));
        assert_eq!(workflow.active_view(), 0);

        let docs = store.list_records(DEFAULT_COLLECTION).await.unwrap();
        assert_eq!(docs.len(), 1);
        let stored: UploadRecord = serde_json::from_value(docs[0].data.clone()).unwrap();
        assert_eq!(stored.session_id, receipt.session_id);
        assert_eq!(stored.view1.as_deref(), Some("data:image/jpeg;base64,A"));
        assert_eq!(stored.view2.as_deref(), Some("data:image/jpeg;base64,B"));
        assert_eq!(stored.image_count, 2);
        assert_eq!(stored.device_info, device);
    }

    #[tokio::test]
    async fn test_failure_keeps_session() {
        let store = Arc::new(MemoryStore::new());
        store.set_available(false);
        let (client, notifier) = client(store.clone());
        let workflow = full_session();

        let err = client.submit(&workflow, DeviceInfo::unknown()).await.unwrap_err();
        assert!(matches!(err, UploadError::Store(StoreError::Unavailable(_))));
        assert_eq!(notifier.current().unwrap().message, "Upload failed");
        assert!(!client.is_uploading());

        {
            let workflow = workflow.lock().await;
            assert_eq!(workflow.image(0), Some(&image("A")));
            assert_eq!(workflow.image(1), Some(&image("B")));
            assert!(workflow.is_upload_ready());
        }

        // Retry once the store is back
        store.set_available(true);
        client.submit(&workflow, DeviceInfo::unknown()).await.unwrap();
        assert_eq!(store.count(DEFAULT_COLLECTION), 1);
    }

    /// Store whose writes wait until the test lets them through
    struct GatedStore {
        inner: MemoryStore,
        gate: Semaphore,
    }

    #[async_trait]
    impl DocumentStore for GatedStore {
        async fn create_record(
            &self,
            collection: &str,
            record: serde_json::Value,
        ) -> Result<String, StoreError> {
            let _permit = self.gate.acquire().await.map_err(|e| StoreError::Unavailable(e.to_string()))?;
            self.inner.create_record(collection, record).await
        }

        async fn list_records(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
            self.inner.list_records(collection).await
        }
    }

    #[tokio::test]
    async fn test_single_flight() {
        let store = Arc::new(GatedStore {
            inner: MemoryStore::new(),
            gate: Semaphore::new(0),
        });
        let (client, _notifier) = client(store.clone());
        let client = Arc::new(client);
        let workflow = Arc::new(full_session());

        let first = {
            let client = Arc::clone(&client);
            let workflow = Arc::clone(&workflow);
            tokio::spawn(async move { client.submit(&workflow, DeviceInfo::unknown()).await })
        };

        while !client.is_uploading() {
            tokio::task::yield_now().await;
        }

        let second = client.submit(&workflow, DeviceInfo::unknown()).await;
        assert!(matches!(second, Err(UploadError::InFlight)));

        store.gate.add_permits(1);
        first.await.unwrap().unwrap();

        assert_eq!(store.inner.create_calls(), 1);
        assert!(!client.is_uploading());
    }
}
