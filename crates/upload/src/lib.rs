//! Upload Client
//!
//! Packages both captured views into one record and writes it to the
//! document store:
//! - At most one upload in flight
//! - Session reset and success notice on success
//! - Session left untouched and failure notice on error

mod client;
mod record;

pub use client::{UploadClient, UploadReceipt, UPLOAD_FAILURE_MESSAGE, UPLOAD_SUCCESS_MESSAGE};
pub use record::{DeviceInfo, UploadRecord};

use storage::StoreError;
use thiserror::Error;

/// Upload error types
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Both views must be captured before uploading")]
    Incomplete,

    #[error("An upload is already in progress")]
    InFlight,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store rejected upload: {0}")]
    Store(#[from] StoreError),
}

impl UploadError {
    /// Whether the attempt was dropped without contacting the store
    pub fn is_no_op(&self) -> bool {
        matches!(self, UploadError::Incomplete | UploadError::InFlight)
    }
}
