//! Streaming serializer/deserializer for context snapshots: a
//! content-addressed Merkle tree plus a block metadata chain, framed as a
//! single self-describing byte stream.
//!
//! [`exporter::export`] writes a snapshot; [`importer::import`] rebuilds one
//! into a fresh store. Both are generic over [`context_store::ContextStore`]
//! and touch no concrete storage backend directly.

mod codec;
mod error;
mod exporter;
mod importer;

pub use codec::Command;
pub use error::{SnapshotError, SnapshotResult};
pub use exporter::{export, PredecessorIterator};
pub use importer::{import, ImportResult, ImportValidator, PrunedBlockSink};
