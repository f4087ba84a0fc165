//! Streams a context and its block history out to a descriptor.

use std::collections::HashSet;

use context_store::{ChildKind, ContextStore, Hash, HistoryMode, SnapshotMetadata};
use tokio::io::AsyncWrite;

use crate::codec::{Command, FrameWriter};
use crate::error::SnapshotError;

/// Given a block header, returns the predecessor's pruned form (`None` at
/// the tail of history) and any protocol activation that occurred at that
/// step. Supplied by the caller; the engine never walks block storage
/// itself.
pub trait PredecessorIterator<S: ContextStore> {
    fn step(
        &mut self,
        header: &S::BlockHeader,
    ) -> (Option<S::PrunedBlock>, Option<S::ProtocolData>);
}

/// One frame of the exporter's explicit traversal stack: a tree whose
/// children are being visited in sorted order, together with the
/// `(step, hash)` pairs collected so far for its own eventual `Node`
/// command.
struct Frame<S: ContextStore> {
    tree: S::Tree,
    children: Vec<(String, ChildKind)>,
    next: usize,
    collected: Vec<(String, Hash)>,
}

fn sorted_children<S: ContextStore>(store: &S, tree: &S::Tree) -> Vec<(String, ChildKind)> {
    let mut children = store.tree_list(tree);
    children.sort_by(|a, b| a.0.cmp(&b.0));
    children
}

/// Depth-first post-order traversal of `root`, deduplicating by content
/// hash. Emits a `Blob` the first time a leaf's hash is seen, a `Node` the
/// first time an interior node's hash is seen (after its children), and
/// nothing for hashes already visited — though the `(step, hash)` pair
/// still contributes to the parent's `Node` record either way.
///
/// Implemented with an explicit stack rather than recursion so pathologically
/// deep trees cannot overflow the native call stack.
async fn export_tree<S, W>(
    store: &S,
    writer: &mut FrameWriter<W>,
    visited: &mut HashSet<Hash>,
    root: S::Tree,
) -> Result<(), SnapshotError<S::Error>>
where
    S: ContextStore,
    W: AsyncWrite + Unpin,
{
    let mut stack = vec![Frame::<S> {
        children: sorted_children(store, &root),
        tree: root,
        next: 0,
        collected: Vec::new(),
    }];

    while let Some(frame) = stack.last_mut() {
        if frame.next >= frame.children.len() {
            let Frame { collected, .. } = stack.pop().expect("checked Some above");
            writer.write_command::<S>(&Command::Node(collected)).await?;
            continue;
        }

        let (name, kind) = frame.children[frame.next].clone();
        frame.next += 1;
        let child = store
            .sub_tree(&frame.tree, &name)
            .expect("child was just listed by tree_list");
        let hash = store.tree_hash(&child);

        if visited.contains(&hash) {
            frame.collected.push((name, hash));
            continue;
        }
        visited.insert(hash.clone());

        match kind {
            ChildKind::Contents => {
                let content = store
                    .tree_content(&child)
                    .expect("tree_list tagged this child as Contents");
                writer
                    .write_command::<S>(&Command::Blob(content))
                    .await?;
                frame.collected.push((name, hash));
            }
            ChildKind::Node => {
                frame.collected.push((name, hash));
                stack.push(Frame::<S> {
                    children: sorted_children(store, &child),
                    tree: child,
                    next: 0,
                    collected: Vec::new(),
                });
            }
        }
    }

    Ok(())
}

/// Exports the context rooted at `header` to `writer`, followed by the
/// block history obtained by repeatedly invoking `predecessors`.
///
/// Returns the total number of bytes written.
pub async fn export<S, W, P>(
    store: &S,
    index: &S::Index,
    header: S::BlockHeader,
    block_data: S::BlockData,
    mode: HistoryMode,
    mut predecessors: P,
    descriptor: W,
) -> Result<u64, SnapshotError<S::Error>>
where
    S: ContextStore,
    W: AsyncWrite + Unpin,
    P: PredecessorIterator<S>,
{
    let mut writer = FrameWriter::new(descriptor);
    writer
        .write_metadata(&SnapshotMetadata::current(mode))
        .await?;

    let ctx = store
        .get_context(index, &header)
        .await
        .map_err(SnapshotError::Adapter)?
        .ok_or_else(|| {
            SnapshotError::ContextNotFound(store.block_hash(&header).as_bytes().to_vec())
        })?;

    tracing::info!(block = %store.block_hash(&header), "exporting context");

    let root_tree = store.context_tree(&ctx);
    let mut visited = HashSet::new();
    export_tree(store, &mut writer, &mut visited, root_tree).await?;

    writer
        .write_command::<S>(&Command::Root {
            header: header.clone(),
            info: store.context_info(&ctx),
            parents: store.context_parents(&ctx),
            block_data: block_data.clone(),
        })
        .await?;

    tracing::debug!(nodes_and_blobs = visited.len(), "wrote tree and root command");

    // History phase: walk predecessors backwards from the block_data header,
    // accumulating protocol activations in encounter order (newest to oldest)
    // to be emitted only after the walk terminates.
    let mut protocol_datas = Vec::new();
    let mut cursor = store.block_data_header(&block_data);
    loop {
        let (pred, pdata) = predecessors.step(&cursor);
        if let Some(pdata) = pdata {
            protocol_datas.push(pdata);
        }
        let Some(pruned) = pred else {
            break;
        };
        writer
            .write_command::<S>(&Command::Proot(pruned.clone()))
            .await?;
        cursor = store.pruned_block_header(&pruned);
    }
    let history_len = protocol_datas.len();
    for pdata in protocol_datas {
        writer.write_command::<S>(&Command::Loot(pdata)).await?;
    }
    tracing::debug!(protocol_activations = history_len, "wrote history section");

    writer.write_command::<S>(&Command::End).await?;
    writer.flush().await?;

    let total = writer.bytes_written();
    tracing::info!(bytes = total, "export complete");
    Ok(total)
}
