use std::sync::Arc;

use context_store::Hash;
use sha2::{Digest, Sha256};

#[derive(Debug, Clone)]
pub struct MemTree(pub(crate) Arc<Node>);

#[derive(Debug)]
pub(crate) enum Node {
    Leaf { content: Vec<u8>, hash: Hash },
    Interior { children: Vec<(String, MemTree)>, hash: Hash },
}

fn hash_leaf(content: &[u8]) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(b"blob");
    hasher.update(content);
    Hash::new(hasher.finalize().to_vec())
}

fn hash_interior<'a>(children: impl Iterator<Item = (&'a str, &'a Hash)>) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(b"node");
    for (name, hash) in children {
        hasher.update((name.len() as u32).to_be_bytes());
        hasher.update(name.as_bytes());
        hasher.update(hash.as_bytes());
    }
    Hash::new(hasher.finalize().to_vec())
}

impl MemTree {
    pub fn empty() -> Self {
        let hash = hash_interior(std::iter::empty());
        Self(Arc::new(Node::Interior {
            children: Vec::new(),
            hash,
        }))
    }

    pub fn leaf(content: Vec<u8>) -> Self {
        let hash = hash_leaf(&content);
        Self(Arc::new(Node::Leaf { content, hash }))
    }

    /// Builds an interior node from children in the given order. Returns
    /// `None` if `lookup` cannot resolve one of the referenced hashes —
    /// mirrors `add_dir`'s "hash not yet known to the batch" failure mode.
    pub fn interior(
        children: &[(String, Hash)],
        mut lookup: impl FnMut(&Hash) -> Option<MemTree>,
    ) -> Option<Self> {
        let mut resolved = Vec::with_capacity(children.len());
        for (name, hash) in children {
            let child = lookup(hash)?;
            resolved.push((name.clone(), child));
        }
        let hash = hash_interior(resolved.iter().map(|(name, tree)| (name.as_str(), tree.hash())));
        Some(Self(Arc::new(Node::Interior {
            children: resolved,
            hash,
        })))
    }

    pub fn hash(&self) -> &Hash {
        match &*self.0 {
            Node::Leaf { hash, .. } => hash,
            Node::Interior { hash, .. } => hash,
        }
    }

    pub fn content(&self) -> Option<&[u8]> {
        match &*self.0 {
            Node::Leaf { content, .. } => Some(content),
            Node::Interior { .. } => None,
        }
    }

    pub fn child(&self, step: &str) -> Option<MemTree> {
        match &*self.0 {
            Node::Leaf { .. } => None,
            Node::Interior { children, .. } => children
                .iter()
                .find(|(name, _)| name == step)
                .map(|(_, tree)| tree.clone()),
        }
    }

    pub fn list(&self) -> Vec<(String, bool)> {
        match &*self.0 {
            Node::Leaf { .. } => Vec::new(),
            Node::Interior { children, .. } => children
                .iter()
                .map(|(name, tree)| (name.clone(), matches!(&*tree.0, Node::Leaf { .. })))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn leaf_hash_is_content_dependent() {
        let mut rng = rand::thread_rng();
        let content: Vec<u8> = (0..32).map(|_| rng.gen()).collect();
        let mut flipped = content.clone();
        flipped[0] ^= 0xff;

        let a = MemTree::leaf(content);
        let b = MemTree::leaf(flipped);
        assert_ne!(a.hash(), b.hash());
    }
}
