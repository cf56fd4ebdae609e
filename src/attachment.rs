//! References to externally stored supporting material
use super::context::Principal;
use super::error::LedgerError;
use std::fmt;
use std::str::FromStr;

/// A sha256 content digest. The content itself never enters the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; 32]);

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    #[n(0)]
    pub hash: ContentHash,
    #[n(1)]
    pub description: String,
    #[n(2)]
    pub author: Principal,
    #[n(3)]
    pub timestamp: u64, // logical clock
}

impl ContentHash {
    pub fn from_bytes(digest: [u8; 32]) -> Self {
        Self(digest)
    }

    /// Digest content the caller holds locally.
    pub fn digest(content: &[u8]) -> Result<Self, LedgerError> {
        let hex_digest = sha256::digest(content);
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(&hex_digest, &mut bytes)
            .map_err(|e| LedgerError::Codec(format!("sha256 hex digest: {e}")))?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl FromStr for ContentHash {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes)
            .map_err(|e| LedgerError::InvalidParameter(format!("content hash {s:?}: {e}")))?;
        Ok(Self(bytes))
    }
}

impl<C> minicbor::Encode<C> for ContentHash {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        e.bytes(&self.0)?.ok()
    }
}

impl<'b, C> minicbor::Decode<'b, C> for ContentHash {
    fn decode(d: &mut minicbor::Decoder<'b>, _: &mut C) -> Result<Self, minicbor::decode::Error> {
        let digest: [u8; 32] = d
            .bytes()?
            .try_into()
            .map_err(|_| minicbor::decode::Error::message("content hash is not 32 bytes"))?;

        Ok(ContentHash(digest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_matches_known_vector() {
        let hash = ContentHash::digest(b"abc").unwrap();
        assert_eq!(
            hash.to_string(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn parses_hex_and_rejects_wrong_length() {
        let hash = ContentHash::digest(b"evidence").unwrap();
        assert_eq!(hash.to_string().parse::<ContentHash>().unwrap(), hash);
        assert!("abcd".parse::<ContentHash>().is_err());
    }

    #[test]
    fn content_hash_encoding() {
        let original = ContentHash::digest(b"photo.jpg").unwrap();

        let encoding = minicbor::to_vec(original).unwrap();
        let decode: ContentHash = minicbor::decode(&encoding).unwrap();

        assert_eq!(original, decode);
    }
}
