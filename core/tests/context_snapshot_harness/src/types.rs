use context_store::{WireDecode, WireDecodeError, WireEncode};

/// Minimal block header: a level, the predecessor's block hash bytes, and
/// an opaque payload. Good enough to exercise linkage without pulling in a
/// real chain implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemBlockHeader {
    pub level: u32,
    pub predecessor_hash: Vec<u8>,
    pub payload: Vec<u8>,
}

impl WireEncode for MemBlockHeader {
    fn encode_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.level.to_be_bytes());
        self.predecessor_hash.encode_to(out);
        self.payload.encode_to(out);
    }
}

impl WireDecode for MemBlockHeader {
    fn decode_from(input: &[u8]) -> Result<(Self, &[u8]), WireDecodeError> {
        if input.len() < 4 {
            return Err(WireDecodeError::UnexpectedEof {
                what: "block header level",
            });
        }
        let level = u32::from_be_bytes(input[0..4].try_into().unwrap());
        let rest = &input[4..];
        let (predecessor_hash, rest) = Vec::<u8>::decode_from(rest)?;
        let (payload, rest) = Vec::<u8>::decode_from(rest)?;
        Ok((
            Self {
                level,
                predecessor_hash,
                payload,
            },
            rest,
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemCommitInfo {
    pub author: String,
    pub message: String,
    pub timestamp: u64,
}

impl WireEncode for MemCommitInfo {
    fn encode_to(&self, out: &mut Vec<u8>) {
        self.author.encode_to(out);
        self.message.encode_to(out);
        out.extend_from_slice(&self.timestamp.to_be_bytes());
    }
}

impl WireDecode for MemCommitInfo {
    fn decode_from(input: &[u8]) -> Result<(Self, &[u8]), WireDecodeError> {
        let (author, rest) = String::decode_from(input)?;
        let (message, rest) = String::decode_from(rest)?;
        if rest.len() < 8 {
            return Err(WireDecodeError::UnexpectedEof {
                what: "commit info timestamp",
            });
        }
        let timestamp = u64::from_be_bytes(rest[0..8].try_into().unwrap());
        Ok((
            Self {
                author,
                message,
                timestamp,
            },
            &rest[8..],
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemBlockData {
    pub header: MemBlockHeader,
    pub operations: Vec<u8>,
}

impl WireEncode for MemBlockData {
    fn encode_to(&self, out: &mut Vec<u8>) {
        self.header.encode_to(out);
        self.operations.encode_to(out);
    }
}

impl WireDecode for MemBlockData {
    fn decode_from(input: &[u8]) -> Result<(Self, &[u8]), WireDecodeError> {
        let (header, rest) = MemBlockHeader::decode_from(input)?;
        let (operations, rest) = Vec::<u8>::decode_from(rest)?;
        Ok((Self { header, operations }, rest))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemPrunedBlock {
    pub header: MemBlockHeader,
    pub proof: Vec<u8>,
}

impl WireEncode for MemPrunedBlock {
    fn encode_to(&self, out: &mut Vec<u8>) {
        self.header.encode_to(out);
        self.proof.encode_to(out);
    }
}

impl WireDecode for MemPrunedBlock {
    fn decode_from(input: &[u8]) -> Result<(Self, &[u8]), WireDecodeError> {
        let (header, rest) = MemBlockHeader::decode_from(input)?;
        let (proof, rest) = Vec::<u8>::decode_from(rest)?;
        Ok((Self { header, proof }, rest))
    }
}
