//! Stored record format

use chrono::{DateTime, Utc};
use image_encoder::EncodedImage;
use serde::{Deserialize, Serialize};

/// Coarse description of the uploading device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    pub user_agent: String,
    pub platform: String,
    pub language: String,
}

impl DeviceInfo {
    pub fn new(
        user_agent: impl Into<String>,
        platform: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            user_agent: user_agent.into(),
            platform: platform.into(),
            language: language.into(),
        }
    }

    /// Placeholder when the client sent no descriptors
    pub fn unknown() -> Self {
        Self::new("unknown", "unknown", "unknown")
    }
}

impl Default for DeviceInfo {
    fn default() -> Self {
        Self::unknown()
    }
}

/// One uploaded capture session, as written to the store.
///
/// `session_id` is derived from the submission time in milliseconds. Two
/// uploads in the same millisecond get the same id; nothing guards against it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRecord {
    pub session_id: String,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    pub created_at: DateTime<Utc>,
    pub view1: Option<String>,
    pub view2: Option<String>,
    pub image_count: u8,
    pub device_info: DeviceInfo,
}

impl UploadRecord {
    /// Build the record for the given views, submitted at `now`
    pub fn new(
        view1: Option<&EncodedImage>,
        view2: Option<&EncodedImage>,
        device_info: DeviceInfo,
        now: DateTime<Utc>,
    ) -> Self {
        let timestamp = now.timestamp_millis();
        let image_count = [view1, view2].iter().filter(|v| v.is_some()).count() as u8;

        Self {
            session_id: format!("session_{timestamp}"),
            timestamp,
            created_at: now,
            view1: view1.map(|i| i.data_uri.clone()),
            view2: view2.map(|i| i.data_uri.clone()),
            image_count,
            device_info,
        }
    }
}
