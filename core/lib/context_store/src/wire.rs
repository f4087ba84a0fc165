use thiserror::Error;

/// Adapter-owned binary codecs must be self-delimiting: the framing layer
/// never needs to know their internal structure, only how many bytes they
/// consumed.
#[derive(Debug, Error)]
pub enum WireDecodeError {
    #[error("unexpected end of input while decoding {what}")]
    UnexpectedEof { what: &'static str },
    #[error("malformed {what}: {reason}")]
    Malformed { what: &'static str, reason: String },
}

/// Serialize a value into a byte buffer.
pub trait WireEncode {
    fn encode_to(&self, out: &mut Vec<u8>);

    fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.encode_to(&mut out);
        out
    }
}

/// Deserialize a value from the front of a byte slice, returning the value
/// and the unconsumed remainder.
pub trait WireDecode: Sized {
    fn decode_from(input: &[u8]) -> Result<(Self, &[u8]), WireDecodeError>;
}

impl WireEncode for Vec<u8> {
    fn encode_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&(self.len() as u64).to_be_bytes());
        out.extend_from_slice(self);
    }
}

impl WireDecode for Vec<u8> {
    fn decode_from(input: &[u8]) -> Result<(Self, &[u8]), WireDecodeError> {
        if input.len() < 8 {
            return Err(WireDecodeError::UnexpectedEof { what: "bytes length" });
        }
        let len = u64::from_be_bytes(input[0..8].try_into().unwrap()) as usize;
        let rest = &input[8..];
        if rest.len() < len {
            return Err(WireDecodeError::UnexpectedEof { what: "bytes payload" });
        }
        Ok((rest[..len].to_vec(), &rest[len..]))
    }
}

impl WireEncode for String {
    fn encode_to(&self, out: &mut Vec<u8>) {
        self.as_bytes().to_vec().encode_to(out);
    }
}

impl WireDecode for String {
    fn decode_from(input: &[u8]) -> Result<(Self, &[u8]), WireDecodeError> {
        let (bytes, rest) = Vec::<u8>::decode_from(input)?;
        let s = String::from_utf8(bytes).map_err(|e| WireDecodeError::Malformed {
            what: "utf8 string",
            reason: e.to_string(),
        })?;
        Ok((s, rest))
    }
}

impl<T: WireEncode> WireEncode for Vec<T> {
    fn encode_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&(self.len() as u64).to_be_bytes());
        for item in self {
            item.encode_to(out);
        }
    }
}

impl<T: WireDecode> WireDecode for Vec<T> {
    fn decode_from(input: &[u8]) -> Result<(Self, &[u8]), WireDecodeError> {
        if input.len() < 8 {
            return Err(WireDecodeError::UnexpectedEof { what: "list length" });
        }
        let count = u64::from_be_bytes(input[0..8].try_into().unwrap()) as usize;
        let mut rest = &input[8..];
        let mut items = Vec::with_capacity(count.min(1 << 16));
        for _ in 0..count {
            let (item, tail) = T::decode_from(rest)?;
            items.push(item);
            rest = tail;
        }
        Ok((items, rest))
    }
}
