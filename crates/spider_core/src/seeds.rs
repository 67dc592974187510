//! Seed selection: which recorded pages the crawler starts from.
use std::collections::HashSet;
use std::sync::Arc;

use thiserror::Error;

use crate::{HttpMessage, NodeRef, ScanContext, SiteTree, SiteTreeError};

#[derive(Debug, Clone)]
pub enum ScanTarget {
    /// Every node in scope, or in the given context.
    ScopeWide { context: Option<ScanContext> },
    /// A single start node, optionally with all its descendants.
    SingleNode {
        start: Option<NodeRef>,
        recurse: bool,
    },
}

#[derive(Debug, Clone)]
pub struct SeedRecord {
    pub node: NodeRef,
    pub message: HttpMessage,
}

/// A node whose message could not be resolved. It is skipped, never fatal.
#[derive(Debug, Clone)]
pub struct SkippedSeed {
    pub node: String,
    pub error: SiteTreeError,
}

#[derive(Debug, Clone, Default)]
pub struct SeedSelection {
    pub seeds: Vec<SeedRecord>,
    pub skipped: Vec<SkippedSeed>,
}

impl SeedSelection {
    pub fn messages(&self) -> impl Iterator<Item = &HttpMessage> {
        self.seeds.iter().map(|seed| &seed.message)
    }
}

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum SeedError {
    #[error("no start node set for a single-node scan")]
    MissingStartNode,
}

/// Computes the seed set for `target`.
///
/// Root nodes and image responses never seed. In recursive single-node mode every
/// descendant is visited depth-first, whether or not its parent qualified.
pub fn select_seeds(target: &ScanTarget, tree: &dyn SiteTree) -> Result<SeedSelection, SeedError> {
    let mut selector = Selector::default();
    match target {
        ScanTarget::ScopeWide { context } => {
            let nodes = match context {
                Some(context) => tree.nodes_in_context(context),
                None => tree.nodes_in_scope(),
            };
            for node in &nodes {
                if selector.first_visit(node) {
                    selector.consider(node);
                }
            }
        }
        ScanTarget::SingleNode { start, recurse } => {
            let start = start.as_ref().ok_or(SeedError::MissingStartNode)?;
            selector.walk(start, *recurse);
        }
    }
    Ok(selector.selection)
}

#[derive(Default)]
struct Selector {
    visited: HashSet<usize>,
    selection: SeedSelection,
}

impl Selector {
    fn walk(&mut self, node: &NodeRef, recurse: bool) {
        if !self.first_visit(node) {
            return;
        }
        self.consider(node);
        if recurse {
            for child in node.children() {
                self.walk(&child, recurse);
            }
        }
    }

    fn first_visit(&mut self, node: &NodeRef) -> bool {
        self.visited.insert(Arc::as_ptr(node) as *const () as usize)
    }

    fn consider(&mut self, node: &NodeRef) {
        match qualifying_message(node) {
            Ok(Some(message)) => self.selection.seeds.push(SeedRecord {
                node: Arc::clone(node),
                message,
            }),
            Ok(None) => {}
            Err(error) => self.selection.skipped.push(SkippedSeed {
                node: node.name(),
                error,
            }),
        }
    }
}

fn qualifying_message(node: &NodeRef) -> Result<Option<HttpMessage>, SiteTreeError> {
    if node.is_root() {
        return Ok(None);
    }
    Ok(node
        .resolve_message()?
        .filter(|message| !message.response.is_image()))
}
