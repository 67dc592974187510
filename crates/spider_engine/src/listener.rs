/// The owner of a scan: receives progress and the single end-of-scan notification.
pub trait ScanListener: Send + Sync {
    fn on_progress(&self, site: &str, done: u32, total: u32);

    fn on_scan_finished(&self, site: &str);

    fn on_found_count(&self, _site: &str, _count: usize) {}
}

/// Listener for callers that only poll the controller.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullListener;

impl ScanListener for NullListener {
    fn on_progress(&self, _site: &str, _done: u32, _total: u32) {}

    fn on_scan_finished(&self, _site: &str) {}
}
