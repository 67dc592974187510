use crate::view_model::ScanView;
use crate::{NodeRef, ScanContext, ScanTarget};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanState {
    #[default]
    Idle,
    Running,
    Paused,
    Stopped,
    Completed,
}

impl ScanState {
    /// Running or paused: the crawler is alive.
    pub fn is_active(self) -> bool {
        matches!(self, ScanState::Running | ScanState::Paused)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ScanState::Stopped | ScanState::Completed)
    }
}

/// How a scan picks its seeds and what it hands to the crawler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanOptions {
    /// Seed from every node in scope (or in `context`) instead of a start node.
    pub scan_entire_scope: bool,
    /// In single-node mode, also seed from all descendants.
    pub recurse_children: bool,
    pub context: Option<ScanContext>,
    /// Regular expressions for URIs the crawler must not fetch.
    pub exclude: Vec<String>,
}

impl ScanOptions {
    pub fn target(&self, start_node: Option<NodeRef>) -> ScanTarget {
        if self.scan_entire_scope {
            ScanTarget::ScopeWide {
                context: self.context.clone(),
            }
        } else {
            ScanTarget::SingleNode {
                start: start_node,
                recurse: self.recurse_children,
            }
        }
    }
}

/// Lifecycle and counters of one crawl run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRun {
    site: String,
    state: ScanState,
    percent: u8,
    crawled: u32,
    remaining: u32,
    found: usize,
    completion: Option<bool>,
}

impl Default for ScanRun {
    fn default() -> Self {
        Self::new(String::new())
    }
}

impl ScanRun {
    pub fn new(site: impl Into<String>) -> Self {
        Self {
            site: site.into(),
            state: ScanState::Idle,
            percent: 0,
            crawled: 0,
            // Until the crawler reports, assume there is at least the start page left.
            remaining: 1,
            found: 0,
            completion: None,
        }
    }

    pub fn site(&self) -> &str {
        &self.site
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    pub fn crawled(&self) -> u32 {
        self.crawled
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn maximum(&self) -> u32 {
        self.crawled.saturating_add(self.remaining)
    }

    pub fn percent(&self) -> u8 {
        self.percent
    }

    pub fn found(&self) -> usize {
        self.found
    }

    /// The crawler's own verdict, once it has completed.
    pub fn completion(&self) -> Option<bool> {
        self.completion
    }

    pub fn view(&self) -> ScanView {
        ScanView {
            site: self.site.clone(),
            state: self.state,
            percent: self.percent,
            crawled: self.crawled,
            remaining: self.remaining,
            maximum: self.maximum(),
            found: self.found,
            completion: self.completion,
        }
    }

    pub(crate) fn set_state(&mut self, state: ScanState) {
        self.state = state;
    }

    pub(crate) fn apply_progress(&mut self, percent: u8, crawled: u32, remaining: u32) {
        self.percent = percent.min(100);
        self.crawled = crawled;
        self.remaining = remaining;
    }

    pub(crate) fn bump_found(&mut self) -> usize {
        self.found += 1;
        self.found
    }

    pub(crate) fn complete(&mut self, successful: bool) {
        self.state = ScanState::Completed;
        self.completion = Some(successful);
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::new(std::mem::take(&mut self.site));
    }
}
