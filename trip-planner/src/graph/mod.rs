//! Versioned multimodal transport graph.
//!
//! A graph version is an immutable `GraphSnapshot` with precomputed
//! adjacency. `GraphStore` holds the current version behind a swappable
//! pointer, and `SnapshotFileStore` persists versions to disk.

mod error;
mod persist;
mod snapshot;
mod store;

pub use error::GraphError;
pub use persist::SnapshotFileStore;
pub use snapshot::{
    EdgeIndex, EdgeRef, GraphBuilder, GraphEdge, GraphMetadata, GraphNode, GraphSnapshot,
    Neighbor, NodeIndex, SnapshotData,
};
pub use store::GraphStore;

#[cfg(test)]
pub(crate) use snapshot::fixtures;
