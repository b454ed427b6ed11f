//! Gallery Reader
//!
//! Lists every uploaded session with its two views. No paging, no filtering;
//! records come back in store order.

mod reader;

pub use reader::{GalleryEntry, GalleryReader, GalleryState};

use serde::{Deserialize, Serialize};

pub const LOADING_MESSAGE: &str = "Loading images...";
pub const EMPTY_MESSAGE: &str = "No uploads found.";
pub const FAILED_MESSAGE: &str = "Could not load uploads.";

/// What the page shows when the fetch fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GalleryErrorPolicy {
    /// Log the error and show an empty gallery
    #[default]
    Silent,
    /// Show an error message on the page
    Surface,
}

/// Gallery configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GalleryConfig {
    pub error_policy: GalleryErrorPolicy,
}
