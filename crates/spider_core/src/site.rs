//! Contracts for the site tree the spider reads seeds from and writes fetched pages into.
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::HttpMessage;

/// A node in the site tree. Implementations are read-only from the spider's point of view.
pub trait SiteNode: fmt::Debug + Send + Sync {
    /// Human readable identity, used in log lines.
    fn name(&self) -> String;

    fn is_root(&self) -> bool;

    fn children(&self) -> Vec<NodeRef>;

    /// The request/response pair recorded for this node, if any.
    fn resolve_message(&self) -> Result<Option<HttpMessage>, SiteTreeError>;
}

pub type NodeRef = Arc<dyn SiteNode>;

/// Provenance marker attached to history entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HistoryType {
    /// Seen through regular browsing or an explicit fetch.
    Proxied,
    /// Fetched by the spider during a crawl.
    Spider,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HistoryHandle(pub u64);

/// A named subset of the site, matched by URI prefix.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScanContext {
    pub name: String,
    pub include_prefixes: Vec<String>,
}

impl ScanContext {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            include_prefixes: Vec::new(),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.include_prefixes.push(prefix.into());
        self
    }

    pub fn contains(&self, uri: &str) -> bool {
        self.include_prefixes
            .iter()
            .any(|prefix| uri.starts_with(prefix.as_str()))
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SiteTreeError {
    #[error("history record unavailable: {0}")]
    Unavailable(String),
    #[error("unknown history handle {0:?}")]
    UnknownHandle(HistoryHandle),
    #[error("cannot place {uri} in the site tree: {reason}")]
    Rejected { uri: String, reason: String },
}

/// The site tree collaborator consumed by seed selection and the scan controller.
pub trait SiteTree: Send + Sync {
    /// Every node the active session considers in scope.
    fn nodes_in_scope(&self) -> Vec<NodeRef>;

    fn nodes_in_context(&self, context: &ScanContext) -> Vec<NodeRef>;

    /// Finds the node representing `site`, e.g. `http://example.com`.
    fn resolve_start_node(&self, site: &str) -> Option<NodeRef>;

    /// Stores `message` as a history entry of the given provenance.
    fn persist(
        &self,
        kind: HistoryType,
        message: &HttpMessage,
    ) -> Result<HistoryHandle, SiteTreeError>;

    /// Links a persisted history entry into the tree, creating nodes along its path.
    fn add_path(&self, handle: HistoryHandle, message: &HttpMessage)
        -> Result<NodeRef, SiteTreeError>;
}
