use std::sync::atomic::{AtomicU32, Ordering};

use spider_engine::ScanListener;
use spider_logging::{spider_debug, spider_info};

/// Logs scan progress, at most once per ten percent.
#[derive(Debug, Default)]
pub struct ProgressReporter {
    last_decile: AtomicU32,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScanListener for ProgressReporter {
    fn on_progress(&self, site: &str, done: u32, total: u32) {
        let percent = if total == 0 { 100 } else { done.saturating_mul(100) / total };
        let decile = percent / 10;
        if self.last_decile.swap(decile, Ordering::Relaxed) != decile {
            spider_info!("{}: {}% ({}/{} pages)", site, percent, done, total);
        }
    }

    fn on_scan_finished(&self, site: &str) {
        spider_info!("{}: spider finished", site);
    }

    fn on_found_count(&self, site: &str, count: usize) {
        spider_debug!("{}: {} URIs found", site, count);
    }
}
