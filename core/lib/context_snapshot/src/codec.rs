//! The framed wire format: a length-prefixed stream of tagged commands.
//!
//! The outer `u64_be length` prefix is owned entirely by this module and is
//! independent of whatever codec the adapter uses for its own types — the
//! inner payload is just bytes to the framing layer.

use bytes::{Buf, BytesMut};
use context_store::{ContextStore, Hash, SnapshotMetadata, WireDecode, WireEncode};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

const ROOT_TAG: u8 = b'r';
const NODE_TAG: u8 = b'd';
const BLOB_TAG: u8 = b'b';
const PROOT_TAG: u8 = b'p';
const LOOT_TAG: u8 = b'l';
const END_TAG: u8 = b'e';

/// Reader refills in chunks of at least this many bytes.
const REFILL_CHUNK: usize = 1 << 20;

/// Writer flushes once the pending buffer exceeds this many bytes.
const FLUSH_HIGH_WATER_MARK: usize = 1 << 20;

/// Errors local to the framing layer, before they are classified into the
/// engine's public [`crate::error::SnapshotError`] taxonomy.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("write error: {0}")]
    Write(std::io::Error),
    #[error("read error: {0}")]
    Read(std::io::Error),
    #[error("malformed frame: {0}")]
    Malformed(String),
}

pub enum Command<S: ContextStore> {
    Root {
        header: S::BlockHeader,
        info: S::CommitInfo,
        parents: Vec<S::CommitHash>,
        block_data: S::BlockData,
    },
    Node(Vec<(String, Hash)>),
    Blob(Vec<u8>),
    Proot(S::PrunedBlock),
    Loot(S::ProtocolData),
    End,
}

impl<S: ContextStore> Command<S> {
    fn encode(&self) -> (u8, Vec<u8>) {
        let mut payload = Vec::new();
        let tag = match self {
            Command::Root {
                header,
                info,
                parents,
                block_data,
            } => {
                header.encode_to(&mut payload);
                info.encode_to(&mut payload);
                parents.encode_to(&mut payload);
                block_data.encode_to(&mut payload);
                ROOT_TAG
            }
            Command::Node(children) => {
                payload.extend_from_slice(&(children.len() as u64).to_be_bytes());
                for (step, hash) in children {
                    step.encode_to(&mut payload);
                    hash.encode_to(&mut payload);
                }
                NODE_TAG
            }
            Command::Blob(data) => {
                data.encode_to(&mut payload);
                BLOB_TAG
            }
            Command::Proot(pruned) => {
                pruned.encode_to(&mut payload);
                PROOT_TAG
            }
            Command::Loot(pdata) => {
                pdata.encode_to(&mut payload);
                LOOT_TAG
            }
            Command::End => END_TAG,
        };
        (tag, payload)
    }

    fn decode(tag: u8, payload: &[u8]) -> Result<Self, FrameError> {
        let bad = |e: context_store::WireDecodeError| FrameError::Malformed(e.to_string());
        match tag {
            ROOT_TAG => {
                let (header, rest) = S::BlockHeader::decode_from(payload).map_err(bad)?;
                let (info, rest) = S::CommitInfo::decode_from(rest).map_err(bad)?;
                let (parents, rest) = Vec::<S::CommitHash>::decode_from(rest).map_err(bad)?;
                let (block_data, _rest) = S::BlockData::decode_from(rest).map_err(bad)?;
                Ok(Command::Root {
                    header,
                    info,
                    parents,
                    block_data,
                })
            }
            NODE_TAG => {
                if payload.len() < 8 {
                    return Err(FrameError::Malformed("truncated node child count".into()));
                }
                let count = u64::from_be_bytes(payload[0..8].try_into().unwrap()) as usize;
                let mut rest = &payload[8..];
                let mut children = Vec::with_capacity(count.min(1 << 16));
                for _ in 0..count {
                    let (step, tail) = String::decode_from(rest).map_err(bad)?;
                    let (hash, tail) = Hash::decode_from(tail).map_err(bad)?;
                    children.push((step, hash));
                    rest = tail;
                }
                Ok(Command::Node(children))
            }
            BLOB_TAG => {
                let (data, _rest) = Vec::<u8>::decode_from(payload).map_err(bad)?;
                Ok(Command::Blob(data))
            }
            PROOT_TAG => {
                let (pruned, _rest) = S::PrunedBlock::decode_from(payload).map_err(bad)?;
                Ok(Command::Proot(pruned))
            }
            LOOT_TAG => {
                let (pdata, _rest) = S::ProtocolData::decode_from(payload).map_err(bad)?;
                Ok(Command::Loot(pdata))
            }
            END_TAG => Ok(Command::End),
            other => Err(FrameError::Malformed(format!(
                "unknown command tag 0x{other:02x}"
            ))),
        }
    }
}

/// Buffered, flush-on-high-water-mark writer over an `AsyncWrite`.
pub struct FrameWriter<W> {
    inner: W,
    pending: Vec<u8>,
    bytes_written: u64,
}

impl<W: AsyncWrite + Unpin> FrameWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            pending: Vec::new(),
            bytes_written: 0,
        }
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written + self.pending.len() as u64
    }

    fn push_frame(&mut self, payload: &[u8]) {
        self.pending
            .extend_from_slice(&(payload.len() as u64).to_be_bytes());
        self.pending.extend_from_slice(payload);
    }

    pub async fn write_metadata(&mut self, meta: &SnapshotMetadata) -> Result<(), FrameError> {
        let mut payload = Vec::new();
        meta.encode(&mut payload);
        self.push_frame(&payload);
        self.maybe_flush().await
    }

    pub async fn write_command<S: ContextStore>(
        &mut self,
        command: &Command<S>,
    ) -> Result<(), FrameError> {
        let (tag, mut payload) = command.encode();
        let mut framed = Vec::with_capacity(payload.len() + 1);
        framed.push(tag);
        framed.append(&mut payload);
        self.push_frame(&framed);
        self.maybe_flush().await
    }

    async fn maybe_flush(&mut self) -> Result<(), FrameError> {
        if self.pending.len() >= FLUSH_HIGH_WATER_MARK {
            self.flush().await
        } else {
            Ok(())
        }
    }

    pub async fn flush(&mut self) -> Result<(), FrameError> {
        if self.pending.is_empty() {
            return Ok(());
        }
        self.inner
            .write_all(&self.pending)
            .await
            .map_err(FrameError::Write)?;
        self.bytes_written += self.pending.len() as u64;
        self.pending.clear();
        Ok(())
    }
}

/// Refillable reader over an `AsyncRead`, handing out exact-length frame
/// payloads.
pub struct FrameReader<R> {
    inner: R,
    buf: BytesMut,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(REFILL_CHUNK),
        }
    }

    async fn fill(&mut self, at_least: usize) -> Result<(), FrameError> {
        while self.buf.len() < at_least {
            let want = at_least.saturating_sub(self.buf.len()).max(REFILL_CHUNK);
            self.buf.reserve(want);
            let n = self
                .inner
                .read_buf(&mut self.buf)
                .await
                .map_err(FrameError::Read)?;
            if n == 0 {
                return Err(FrameError::Malformed("short read".to_string()));
            }
        }
        Ok(())
    }

    async fn read_exact_frame(&mut self) -> Result<Vec<u8>, FrameError> {
        self.fill(8).await?;
        let len = u64::from_be_bytes(self.buf[0..8].try_into().unwrap()) as usize;
        self.buf.advance(8);
        self.fill(len).await?;
        let payload = self.buf[..len].to_vec();
        self.buf.advance(len);
        Ok(payload)
    }

    pub async fn read_metadata(&mut self) -> Result<SnapshotMetadata, FrameError> {
        let payload = self.read_exact_frame().await?;
        let (meta, rest) = SnapshotMetadata::decode(&payload)
            .ok_or_else(|| FrameError::Malformed("malformed metadata frame".to_string()))?;
        if !rest.is_empty() {
            return Err(FrameError::Malformed(
                "trailing bytes after metadata frame".to_string(),
            ));
        }
        Ok(meta)
    }

    pub async fn read_command<S: ContextStore>(&mut self) -> Result<Command<S>, FrameError> {
        let payload = self.read_exact_frame().await?;
        let (&tag, rest) = payload
            .split_first()
            .ok_or_else(|| FrameError::Malformed("empty command frame".to_string()))?;
        Command::decode(tag, rest)
    }
}
