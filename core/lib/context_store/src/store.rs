use async_trait::async_trait;
use std::error::Error as StdError;

use crate::hash::{BlockHash, Hash};
use crate::wire::{WireDecode, WireEncode};

/// Whether a child entry in a tree listing is itself a subtree or a leaf.
/// The adapter tags each entry; the engine only needs to know which branch
/// to recurse into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildKind {
    Contents,
    Node,
}

/// Bound satisfied by every adapter-owned type that rides inside the wire
/// protocol: it must be cheap to clone (the exporter and importer both hold
/// values across suspension points) and self-delimiting on the wire.
pub trait WireValue: WireEncode + WireDecode + Clone + Send + Sync + 'static {}
impl<T: WireEncode + WireDecode + Clone + Send + Sync + 'static> WireValue for T {}

/// Abstract Merkle-tree context store and block metadata chain.
///
/// This is the sole external contract the snapshot engine depends on: the
/// exporter and importer in `context_snapshot` are written purely in terms
/// of this trait and never touch a concrete storage backend. An
/// implementation backs it with whatever on-disk store the embedding node
/// uses; `context_snapshot_harness` backs it with a `HashMap` for tests.
#[async_trait]
pub trait ContextStore: Send + Sync {
    type Tree: Clone + Send + Sync;
    type Context: Send + Sync;
    type Index: Send + Sync;

    /// Scoped write batch. Implementations release whatever resources the
    /// batch holds (locks, open write-transaction handles) in their `Drop`
    /// impl, so the batch is released on every exit path — success, error,
    /// or the enclosing future being dropped mid-await — without the
    /// engine needing to call an explicit `close`.
    type BatchGuard: Send;

    type BlockHeader: WireValue;
    type CommitHash: WireValue;
    type CommitInfo: WireValue;
    type BlockData: WireValue;
    type ProtocolData: WireValue;
    type PrunedBlock: WireValue;

    type Error: StdError + Send + Sync + 'static;

    /// Fetches the context attached to a block header, if any.
    async fn get_context(
        &self,
        index: &Self::Index,
        header: &Self::BlockHeader,
    ) -> Result<Option<Self::Context>, Self::Error>;

    /// Root tree of a context.
    fn context_tree(&self, ctx: &Self::Context) -> Self::Tree;

    /// Commit info attached to a context.
    fn context_info(&self, ctx: &Self::Context) -> Self::CommitInfo;

    /// Parent commit hashes of a context.
    fn context_parents(&self, ctx: &Self::Context) -> Vec<Self::CommitHash>;

    /// Looks up a direct child of `tree` by its path step.
    fn sub_tree(&self, tree: &Self::Tree, step: &str) -> Option<Self::Tree>;

    /// Lists the direct children of an interior tree, kind-tagged. Order is
    /// unspecified; the exporter sorts before emitting.
    fn tree_list(&self, tree: &Self::Tree) -> Vec<(String, ChildKind)>;

    /// Content hash of a tree, used for the stream's deduplication set.
    fn tree_hash(&self, tree: &Self::Tree) -> Hash;

    /// Payload of a leaf tree, or `None` if `tree` is interior.
    fn tree_content(&self, tree: &Self::Tree) -> Option<Vec<u8>>;

    /// Builds a fresh, empty context rooted at nothing, for restore.
    fn make_context(&self, index: &Self::Index) -> Self::Context;

    /// Opens a scoped write batch against `index`.
    async fn open_batch(&self, index: &Self::Index) -> Result<Self::BatchGuard, Self::Error>;

    /// Installs a leaf with the given payload, returning its tree handle.
    fn add_string(&self, batch: &mut Self::BatchGuard, data: Vec<u8>) -> Self::Tree;

    /// Installs an interior node from child `(step, hash)` pairs. Returns
    /// `None` if any hash has not yet been installed in this batch.
    fn add_dir(
        &self,
        batch: &mut Self::BatchGuard,
        children: &[(String, Hash)],
    ) -> Option<Self::Tree>;

    /// Replaces the root tree of a context, returning the updated context.
    fn update_context(&self, ctx: Self::Context, tree: Self::Tree) -> Self::Context;

    /// Commits a context and links it to a block header. Returns `None` on
    /// mismatch (e.g. the header already carries a different context).
    fn set_context(
        &self,
        batch: &mut Self::BatchGuard,
        info: Self::CommitInfo,
        parents: Vec<Self::CommitHash>,
        ctx: Self::Context,
        header: &Self::BlockHeader,
    ) -> Option<Self::BlockHeader>;

    /// Derives the block hash of a header.
    fn block_hash(&self, header: &Self::BlockHeader) -> BlockHash;

    /// Derives the block header embedded in a pruned block.
    fn pruned_block_header(&self, pruned: &Self::PrunedBlock) -> Self::BlockHeader;

    /// Derives the block header embedded in block data.
    fn block_data_header(&self, data: &Self::BlockData) -> Self::BlockHeader;
}
