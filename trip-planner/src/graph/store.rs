//! Current-version holder for the graph.
//!
//! Publishing replaces the shared pointer; it never touches a snapshot that
//! readers may hold. Each request calls `pin()` once and works against the
//! returned `Arc` for its whole lifetime, so a concurrent publish cannot
//! change the graph under it.

use std::sync::{Arc, RwLock};

use tracing::info;

use super::snapshot::GraphSnapshot;

/// Thread-safe holder of the current graph version.
#[derive(Debug, Default)]
pub struct GraphStore {
    current: RwLock<Option<Arc<GraphSnapshot>>>,
}

impl GraphStore {
    /// Create a store with no published version.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with `snapshot` already published.
    pub fn with_snapshot(snapshot: GraphSnapshot) -> Self {
        Self {
            current: RwLock::new(Some(Arc::new(snapshot))),
        }
    }

    /// Publish a new version, returning the one it replaced.
    pub fn publish(&self, snapshot: GraphSnapshot) -> Option<Arc<GraphSnapshot>> {
        let next = Arc::new(snapshot);
        info!(
            version = next.version(),
            nodes = next.node_count(),
            edges = next.edge_count(),
            "Publishing graph version"
        );

        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        guard.replace(next)
    }

    /// Withdraw the current version, if any.
    pub fn unpublish(&self) -> Option<Arc<GraphSnapshot>> {
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        guard.take()
    }

    /// Capture the current version for the duration of one request.
    pub fn pin(&self) -> Option<Arc<GraphSnapshot>> {
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        guard.clone()
    }

    /// Version string of the current snapshot.
    pub fn current_version(&self) -> Option<String> {
        self.pin().map(|s| s.version().to_string())
    }

    /// Whether any version is published.
    pub fn is_available(&self) -> bool {
        self.pin().is_some()
    }
}
