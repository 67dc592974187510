use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use spider_core::DiscoveryRecord;

/// Append-only log of discovered URIs, shared between the controller and readers.
///
/// Insertion order is preserved and duplicates are kept: a URI fetched twice shows twice.
#[derive(Debug, Clone, Default)]
pub struct ResultsLog {
    records: Arc<Mutex<Vec<DiscoveryRecord>>>,
}

impl ResultsLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(
        &self,
        uri: impl Into<String>,
        method: impl Into<String>,
        status_tag: Option<String>,
        is_error: bool,
    ) {
        self.push(DiscoveryRecord::new(uri, method, status_tag, is_error));
    }

    pub fn push(&self, record: DiscoveryRecord) {
        self.lock().push(record);
    }

    /// Removes every record. Stop the scan first; clearing during a run races the crawler.
    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn snapshot(&self) -> Vec<DiscoveryRecord> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<DiscoveryRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
