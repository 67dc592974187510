//! In-memory site tree: root → site (origin) → path segments.
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use spider_core::{
    HistoryHandle, HistoryType, HttpMessage, NodeRef, ScanContext, SiteNode, SiteTree,
    SiteTreeError,
};
use url::Url;

#[derive(Debug)]
pub struct MemoryNode {
    segment: String,
    name: String,
    root: bool,
    history: RwLock<Option<(HistoryHandle, HttpMessage)>>,
    children: RwLock<Vec<Arc<MemoryNode>>>,
}

impl MemoryNode {
    fn new(segment: impl Into<String>, name: impl Into<String>, root: bool) -> Self {
        Self {
            segment: segment.into(),
            name: name.into(),
            root,
            history: RwLock::new(None),
            children: RwLock::new(Vec::new()),
        }
    }

    pub fn history_handle(&self) -> Option<HistoryHandle> {
        self.history
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|(handle, _)| *handle)
    }

    fn child_or_insert(self: &Arc<Self>, segment: &str, name: String) -> Arc<MemoryNode> {
        let mut children = self.children.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = children.iter().find(|child| child.segment == segment) {
            return Arc::clone(existing);
        }
        let child = Arc::new(MemoryNode::new(segment, name, false));
        children.push(Arc::clone(&child));
        child
    }

    fn find_child(&self, segment: &str) -> Option<Arc<MemoryNode>> {
        self.children
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|child| child.segment == segment)
            .cloned()
    }

    fn record(&self, handle: HistoryHandle, message: HttpMessage) {
        *self.history.write().unwrap_or_else(PoisonError::into_inner) = Some((handle, message));
    }

    fn collect_descendants(self: &Arc<Self>, out: &mut Vec<Arc<MemoryNode>>) {
        let children = self
            .children
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for child in children {
            out.push(Arc::clone(&child));
            child.collect_descendants(out);
        }
    }
}

impl SiteNode for MemoryNode {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn is_root(&self) -> bool {
        self.root
    }

    fn children(&self) -> Vec<NodeRef> {
        self.children
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|child| Arc::clone(child) as NodeRef)
            .collect()
    }

    fn resolve_message(&self) -> Result<Option<HttpMessage>, SiteTreeError> {
        Ok(self
            .history
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|(_, message)| message.clone()))
    }
}

type ScopePredicate = Box<dyn Fn(&str) -> bool + Send + Sync>;

pub struct MemorySiteTree {
    root: Arc<MemoryNode>,
    history: Mutex<HashMap<HistoryHandle, HistoryType>>,
    next_handle: AtomicU64,
    in_scope: ScopePredicate,
}

impl fmt::Debug for MemorySiteTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemorySiteTree")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl MemorySiteTree {
    /// `in_scope` decides scope membership from a node's URI (no query string).
    pub fn new(in_scope: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        Self {
            root: Arc::new(MemoryNode::new("", "Sites", true)),
            history: Mutex::new(HashMap::new()),
            next_handle: AtomicU64::new(1),
            in_scope: Box::new(in_scope),
        }
    }

    /// Scope covers every URI starting with one of `prefixes`.
    pub fn scoped_to(prefixes: Vec<String>) -> Self {
        Self::new(move |uri| prefixes.iter().any(|prefix| uri.starts_with(prefix.as_str())))
    }

    pub fn root(&self) -> NodeRef {
        Arc::clone(&self.root) as NodeRef
    }

    /// Persists `message` and links it into the tree in one step.
    pub fn record(&self, kind: HistoryType, message: &HttpMessage) -> Result<NodeRef, SiteTreeError> {
        let handle = self.persist(kind, message)?;
        self.add_path(handle, message)
    }

    /// Looks up the node for a URI, ignoring its query string.
    pub fn find(&self, uri: &str) -> Option<NodeRef> {
        let parsed = Url::parse(uri).ok()?;
        let mut node = self.root.find_child(&origin_of(&parsed))?;
        for segment in path_segments(&parsed) {
            node = node.find_child(segment)?;
        }
        Some(node as NodeRef)
    }

    pub fn history_count(&self, kind: HistoryType) -> usize {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|stored| **stored == kind)
            .count()
    }

    fn all_nodes(&self) -> Vec<Arc<MemoryNode>> {
        let mut nodes = Vec::new();
        self.root.collect_descendants(&mut nodes);
        nodes
    }
}

impl SiteTree for MemorySiteTree {
    fn nodes_in_scope(&self) -> Vec<NodeRef> {
        self.all_nodes()
            .into_iter()
            .filter(|node| (self.in_scope)(&node.name))
            .map(|node| node as NodeRef)
            .collect()
    }

    fn nodes_in_context(&self, context: &ScanContext) -> Vec<NodeRef> {
        self.all_nodes()
            .into_iter()
            .filter(|node| context.contains(&node.name))
            .map(|node| node as NodeRef)
            .collect()
    }

    fn resolve_start_node(&self, site: &str) -> Option<NodeRef> {
        let key = Url::parse(site)
            .map(|url| origin_of(&url))
            .unwrap_or_else(|_| site.trim_end_matches('/').to_string());
        self.root
            .find_child(&key)
            .map(|node| node as NodeRef)
    }

    fn persist(
        &self,
        kind: HistoryType,
        _message: &HttpMessage,
    ) -> Result<HistoryHandle, SiteTreeError> {
        let handle = HistoryHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(handle, kind);
        Ok(handle)
    }

    fn add_path(
        &self,
        handle: HistoryHandle,
        message: &HttpMessage,
    ) -> Result<NodeRef, SiteTreeError> {
        let known = self
            .history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&handle);
        if !known {
            return Err(SiteTreeError::UnknownHandle(handle));
        }

        let uri = message.uri();
        if !matches!(uri.scheme(), "http" | "https") {
            return Err(SiteTreeError::Rejected {
                uri: uri.to_string(),
                reason: format!("unsupported scheme {}", uri.scheme()),
            });
        }

        let origin = origin_of(uri);
        let mut node = self.root.child_or_insert(&origin, origin.clone());
        for segment in path_segments(uri) {
            let name = format!("{}/{}", node.name, segment);
            node = node.child_or_insert(segment, name);
        }
        node.record(handle, message.clone());
        Ok(node as NodeRef)
    }
}

fn origin_of(url: &Url) -> String {
    url.origin().ascii_serialization()
}

fn path_segments(url: &Url) -> impl Iterator<Item = &str> {
    url.path_segments()
        .into_iter()
        .flatten()
        .filter(|segment| !segment.is_empty())
}
