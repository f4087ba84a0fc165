//! Rebuilds a context and its block history from a descriptor in two
//! passes: first the tree and its root commit, then the pruned-block
//! history and protocol activations.

use std::collections::VecDeque;

use async_trait::async_trait;
use context_store::{BlockHash, ContextStore, CURRENT_VERSION, HistoryMode};
use tokio::io::AsyncRead;

use crate::codec::{Command, FrameReader};
use crate::error::SnapshotError;

/// Persists a chunk of up to 5,000 reconstructed pruned blocks, in the
/// order they were encountered in the stream (reverse chronological).
#[async_trait]
pub trait PrunedBlockSink<S: ContextStore> {
    async fn store_chunk(
        &mut self,
        chunk: Vec<(BlockHash, S::PrunedBlock)>,
    ) -> Result<(), S::Error>;
}

/// Policy check invoked for every reconstructed pruned block before it is
/// queued for persistence. `pred_header` is the immediate successor's
/// header (`None` for the first pruned block encountered).
#[async_trait]
pub trait ImportValidator<S: ContextStore> {
    async fn validate(
        &mut self,
        pred_header: Option<S::BlockHeader>,
        hash: BlockHash,
        pruned: &S::PrunedBlock,
    ) -> Result<(), S::Error>;
}

/// Every 5,000 `Proot` records the accumulated chunk is flushed; a
/// partial chunk is also flushed at every `Loot` boundary and at `End`.
const CHUNK_SIZE: usize = 5000;

/// Everything rebuilt by a successful [`import`].
pub struct ImportResult<S: ContextStore> {
    pub block_header: S::BlockHeader,
    pub block_data: S::BlockData,
    pub history_mode: HistoryMode,
    /// Header of the oldest pruned block reached, if history was present.
    pub oldest_header: Option<S::BlockHeader>,
    /// Reconstructed predecessor chain, oldest to newest.
    pub block_hashes: Vec<BlockHash>,
    /// Protocol activation payloads, newest to oldest (stream order).
    pub protocol_datas: Vec<S::ProtocolData>,
}

pub async fn import<S, R, V, K>(
    store: &S,
    index: &S::Index,
    descriptor: R,
    mut validator: V,
    mut sink: K,
) -> Result<ImportResult<S>, SnapshotError<S::Error>>
where
    S: ContextStore,
    R: AsyncRead + Unpin,
    V: ImportValidator<S>,
    K: PrunedBlockSink<S>,
{
    let mut reader = FrameReader::new(descriptor);
    let meta = reader.read_metadata().await?;
    if !meta.is_current_version() {
        return Err(SnapshotError::InvalidSnapshotVersion {
            got: meta.version,
            expected: CURRENT_VERSION.to_string(),
        });
    }
    tracing::info!(version = %meta.version, mode = ?meta.mode, "accepted snapshot metadata");

    let mut batch = store
        .open_batch(index)
        .await
        .map_err(SnapshotError::Adapter)?;
    let mut ctxt = store.make_context(index);

    let (block_header, block_data) = loop {
        match reader.read_command::<S>().await? {
            Command::Blob(data) => {
                let tree = store.add_string(&mut batch, data);
                ctxt = store.update_context(ctxt, tree);
            }
            Command::Node(children) => {
                let tree = store
                    .add_dir(&mut batch, &children)
                    .ok_or(SnapshotError::RestoreContextFailure)?;
                ctxt = store.update_context(ctxt, tree);
            }
            Command::Root {
                header,
                info,
                parents,
                block_data,
            } => {
                let stored_header = store
                    .set_context(&mut batch, info, parents, ctxt, &header)
                    .ok_or_else(|| {
                        SnapshotError::InconsistentSnapshotData(
                            "set_context rejected the reconstructed root commit".to_string(),
                        )
                    })?;
                break (stored_header, block_data);
            }
            _ => {
                return Err(SnapshotError::InconsistentSnapshotData(
                    "expected Blob, Node, or Root while rebuilding the tree".to_string(),
                ))
            }
        }
    };

    let mut pred_header: Option<S::BlockHeader> = None;
    let mut rev_block_hashes: VecDeque<BlockHash> = VecDeque::new();
    let mut rev_protocol_datas: VecDeque<S::ProtocolData> = VecDeque::new();
    let mut todo_chunk: Vec<(BlockHash, S::PrunedBlock)> = Vec::new();
    let mut proot_count: usize = 0;

    let (oldest_header, protocol_datas) = loop {
        match reader.read_command::<S>().await? {
            Command::Proot(pruned) => {
                let pruned_header = store.pruned_block_header(&pruned);
                let hash = store.block_hash(&pruned_header);
                validator
                    .validate(pred_header.clone(), hash.clone(), &pruned)
                    .await
                    .map_err(SnapshotError::Adapter)?;
                todo_chunk.push((hash.clone(), pruned));
                rev_block_hashes.push_front(hash);
                pred_header = Some(pruned_header);
                proot_count += 1;

                if proot_count % CHUNK_SIZE == 0 {
                    let chunk = std::mem::take(&mut todo_chunk);
                    tracing::debug!(chunk_len = chunk.len(), total = proot_count, "flushing pruned block chunk");
                    sink.store_chunk(chunk).await.map_err(SnapshotError::Adapter)?;
                }
            }
            Command::Loot(pd) => {
                if !todo_chunk.is_empty() {
                    let chunk = std::mem::take(&mut todo_chunk);
                    tracing::debug!(
                        chunk_len = chunk.len(),
                        "flushing pruned block chunk at protocol activation boundary"
                    );
                    sink.store_chunk(chunk).await.map_err(SnapshotError::Adapter)?;
                }
                rev_protocol_datas.push_front(pd);
            }
            Command::End => {
                if !todo_chunk.is_empty() {
                    sink.store_chunk(todo_chunk).await.map_err(SnapshotError::Adapter)?;
                }
                // Built by repeated prepend during the backward walk: already
                // oldest-to-newest, unlike `protocol_datas` below.
                let mut protocol_datas: Vec<_> = rev_protocol_datas.into_iter().collect();
                protocol_datas.reverse();
                break (pred_header, protocol_datas);
            }
            _ => {
                return Err(SnapshotError::InconsistentSnapshotData(
                    "expected Proot, Loot, or End while rebuilding history".to_string(),
                ))
            }
        }
    };

    let block_hashes: Vec<BlockHash> = rev_block_hashes.into_iter().collect();
    tracing::info!(
        block_hashes = block_hashes.len(),
        protocol_activations = protocol_datas.len(),
        "import complete"
    );

    Ok(ImportResult {
        block_header,
        block_data,
        history_mode: meta.mode,
        oldest_header,
        block_hashes,
        protocol_datas,
    })
}
