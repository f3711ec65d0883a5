use crate::source::SourceError;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("Album {0} is already downloading, please try again later")]
    InProgress(String),

    #[error("Download failed: {0}")]
    Source(#[from] SourceError),
}

/// Album ids with a download currently in flight.
#[derive(Clone, Debug, Default)]
pub struct DownloadRegistry {
    inner: Arc<Mutex<HashSet<String>>>,
}

impl DownloadRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        // A poisoned set is still a valid set of ids.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn acquire(&self, album_id: &str) -> Result<DownloadGuard, DownloadError> {
        if !self.lock().insert(album_id.to_string()) {
            return Err(DownloadError::InProgress(album_id.to_string()));
        }
        Ok(DownloadGuard {
            registry: self.clone(),
            album_id: album_id.to_string(),
        })
    }

    pub fn contains(&self, album_id: &str) -> bool {
        self.lock().contains(album_id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[derive(Debug)]
pub struct DownloadGuard {
    registry: DownloadRegistry,
    album_id: String,
}

impl DownloadGuard {
    pub fn album_id(&self) -> &str {
        &self.album_id
    }
}

impl Drop for DownloadGuard {
    fn drop(&mut self) {
        self.registry.lock().remove(&self.album_id);
    }
}
