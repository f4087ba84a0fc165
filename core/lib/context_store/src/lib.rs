//! Abstract Merkle-tree context store contract.
//!
//! This crate defines the adapter boundary that `context_snapshot` is
//! written against. It owns no storage engine of its own; concrete node
//! binaries (and, for tests, `context_snapshot_harness`) supply an
//! implementation of [`ContextStore`].

mod hash;
mod store;
mod wire;

pub use hash::{BlockHash, Hash, HistoryMode, SnapshotMetadata, CURRENT_VERSION};
pub use store::{ChildKind, ContextStore, WireValue};
pub use wire::{WireDecode, WireDecodeError, WireEncode};
