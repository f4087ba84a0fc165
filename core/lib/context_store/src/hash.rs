use std::fmt;

use crate::wire::{WireDecode, WireDecodeError, WireEncode};

/// Opaque content hash, identifying a tree node or a blob.
///
/// The engine never interprets the bytes beyond equality and hashing; the
/// concrete digest algorithm and width are entirely the adapter's business.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Hash(Vec<u8>);

impl Hash {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", hex::encode(&self.0))
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0))
    }
}

impl From<Vec<u8>> for Hash {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl WireEncode for Hash {
    fn encode_to(&self, out: &mut Vec<u8>) {
        self.0.encode_to(out);
    }
}

impl WireDecode for Hash {
    fn decode_from(input: &[u8]) -> Result<(Self, &[u8]), WireDecodeError> {
        let (bytes, rest) = Vec::<u8>::decode_from(input)?;
        Ok((Self(bytes), rest))
    }
}

/// Opaque block identifier, distinct from [`Hash`] only at the type level:
/// a block hash is never a Merkle node, and the two must never be compared.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct BlockHash(Vec<u8>);

impl BlockHash {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockHash({})", hex::encode(&self.0))
    }
}

impl fmt::Display for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0))
    }
}

/// Which slice of history a snapshot carries. Opaque to the engine beyond
/// round-tripping through the wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryMode {
    Full,
    Rolling,
    Archive,
}

impl HistoryMode {
    fn tag(self) -> u8 {
        match self {
            HistoryMode::Full => 0,
            HistoryMode::Rolling => 1,
            HistoryMode::Archive => 2,
        }
    }

    fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(HistoryMode::Full),
            1 => Some(HistoryMode::Rolling),
            2 => Some(HistoryMode::Archive),
            _ => None,
        }
    }
}

/// Version literal this crate produces and accepts. Any other value fails
/// import with `Invalid_snapshot_version`.
pub const CURRENT_VERSION: &str = "tezos-snapshot-1.0.0";

/// The first frame of every snapshot stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotMetadata {
    pub version: String,
    pub mode: HistoryMode,
}

impl SnapshotMetadata {
    pub fn current(mode: HistoryMode) -> Self {
        Self {
            version: CURRENT_VERSION.to_string(),
            mode,
        }
    }

    pub fn is_current_version(&self) -> bool {
        self.version == CURRENT_VERSION
    }

    pub fn encode(&self, out: &mut Vec<u8>) {
        let version_bytes = self.version.as_bytes();
        out.extend_from_slice(&(version_bytes.len() as u32).to_be_bytes());
        out.extend_from_slice(version_bytes);
        out.push(self.mode.tag());
    }

    pub fn decode(input: &[u8]) -> Option<(Self, &[u8])> {
        if input.len() < 4 {
            return None;
        }
        let len = u32::from_be_bytes(input[0..4].try_into().ok()?) as usize;
        let rest = &input[4..];
        if rest.len() < len + 1 {
            return None;
        }
        let version = String::from_utf8(rest[..len].to_vec()).ok()?;
        let mode = HistoryMode::from_tag(rest[len])?;
        Some((Self { version, mode }, &rest[len + 1..]))
    }
}
