//! Common types and data structures

use std::collections::HashMap;
use std::path::PathBuf;

/// Download status for individual item downloads
#[derive(Clone, Debug, PartialEq)]
pub enum DownloadStatus {
    Downloading(u64, u64), // (downloaded_bytes, total_bytes)
    Complete(PathBuf),
    Cancelled,
    Failed(String),
}

impl DownloadStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, DownloadStatus::Downloading(..))
    }
}

/// Per-item download tracking shared with the runtime
#[derive(Default)]
pub struct DownloadState {
    pub downloads: HashMap<u32, DownloadStatus>, // item id -> status
}

impl DownloadState {
    pub fn is_downloading(&self, id: u32) -> bool {
        self.downloads.get(&id).is_some_and(DownloadStatus::is_active)
    }

    pub fn active_count(&self) -> usize {
        self.downloads.values().filter(|s| s.is_active()).count()
    }
}
